use anyhow::{Context, Result, anyhow};
use std::path::Path;
use tracing::{debug, info};

use crate::core::config::ClientConfig;
use crate::core::quotation::Quotation;

/// Text written to the output file for `quotation`.
pub fn render(quotation: &Quotation) -> String {
    format!("Dólar hoje: USD {:.2}", quotation.value)
}

/// Asks the quotation server for the current rate.
pub async fn fetch_quotation(quote_url: &str) -> Result<Quotation> {
    debug!("Requesting quotation from {}", quote_url);

    let client = reqwest::Client::builder()
        .user_agent("quoting/0.1")
        .build()?;
    let response = client
        .get(quote_url)
        .send()
        .await
        .map_err(|e| anyhow!("Request error: {} URL: {}", e, quote_url))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(anyhow!("HTTP error: {} from {}: {}", status, quote_url, body));
    }

    let text = response.text().await?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse quotation from {quote_url}"))
}

/// Fetches the current quotation and writes it to the configured file.
pub async fn fetch_and_persist(config: &ClientConfig) -> Result<Quotation> {
    let quotation = fetch_quotation(&config.quote_url).await?;

    let path = Path::new(&config.output_path);
    std::fs::write(path, render(&quotation))
        .with_context(|| format!("Failed to write quotation to {}", path.display()))?;

    info!(value = quotation.value, path = %path.display(), "Current quotation persisted");
    Ok(quotation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(response: ResponseTemplate) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/quote"))
            .respond_with(response)
            .mount(&mock_server)
            .await;

        mock_server
    }

    #[test]
    fn test_render_rounds_to_cents() {
        let quotation = Quotation::new(5.3149, 1_700_000_000);
        assert_eq!(render(&quotation), "Dólar hoje: USD 5.31");
    }

    #[tokio::test]
    async fn test_fetch_and_persist_writes_file() {
        let body = r#"{"id":"b5b1","value":5.31,"timestamp":1700000000}"#;
        let server = create_mock_server(ResponseTemplate::new(200).set_body_string(body)).await;
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("current-quotation.txt");

        let config = ClientConfig {
            quote_url: format!("{}/quote", server.uri()),
            output_path: output.to_str().unwrap().to_string(),
        };
        let quotation = fetch_and_persist(&config).await.unwrap();

        assert_eq!(quotation.id, "b5b1");
        assert_eq!(quotation.timestamp, 1_700_000_000);
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "Dólar hoje: USD 5.31"
        );
    }

    #[tokio::test]
    async fn test_server_error_is_not_persisted() {
        let body = r#"{"kind":"UpstreamUnavailable","message":"Quote provider unavailable"}"#;
        let server = create_mock_server(ResponseTemplate::new(500).set_body_string(body)).await;
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("current-quotation.txt");

        let config = ClientConfig {
            quote_url: format!("{}/quote", server.uri()),
            output_path: output.to_str().unwrap().to_string(),
        };
        let err = fetch_and_persist(&config).await.unwrap_err();

        assert!(err.to_string().contains("HTTP error: 500"));
        assert!(err.to_string().contains("UpstreamUnavailable"));
        assert!(!output.exists());
    }
}
