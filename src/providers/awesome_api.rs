use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::deadline::with_deadline;
use crate::core::error::QuoteError;
use crate::core::quotation::{QuoteProvider, Quotation};

// AwesomeApiProvider implementation for QuoteProvider
pub struct AwesomeApiProvider {
    url: String,
    budget: Duration,
    client: reqwest::Client,
}

impl AwesomeApiProvider {
    pub fn new(url: &str, budget: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("quoting/0.1")
            .build()?;
        Ok(AwesomeApiProvider {
            url: url.to_string(),
            budget,
            client,
        })
    }

    async fn request(&self) -> Result<String, QuoteError> {
        debug!("Requesting quotation from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| QuoteError::UpstreamUnavailable(format!("Request error: {e}")))?;

        if !response.status().is_success() {
            return Err(QuoteError::UpstreamUnavailable(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| QuoteError::UpstreamUnavailable(format!("Failed to read body: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    #[serde(rename = "USDBRL")]
    usd_brl: RawQuote,
}

// The provider sends both numbers as strings.
#[derive(Debug, Deserialize)]
struct RawQuote {
    ask: String,
    timestamp: String,
}

fn parse_quotation(body: &str) -> Result<Quotation, QuoteError> {
    let envelope: QuoteEnvelope = serde_json::from_str(body)
        .map_err(|e| QuoteError::MalformedResponse(format!("Failed to parse JSON response: {e}")))?;
    let raw = envelope.usd_brl;

    let value: f64 = raw
        .ask
        .trim()
        .parse()
        .map_err(|_| QuoteError::MalformedResponse(format!("ask is not a number: {:?}", raw.ask)))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(QuoteError::MalformedResponse(format!(
            "ask is not a positive rate: {value}"
        )));
    }

    let timestamp: i64 = raw.timestamp.trim().parse().map_err(|_| {
        QuoteError::MalformedResponse(format!(
            "timestamp is not an integer: {:?}",
            raw.timestamp
        ))
    })?;

    Ok(Quotation::new(value, timestamp))
}

#[async_trait]
impl QuoteProvider for AwesomeApiProvider {
    #[instrument(name = "AwesomeApiFetch", skip(self), fields(url = %self.url))]
    async fn fetch_quotation(&self) -> Result<Quotation, QuoteError> {
        let body = with_deadline("provider.fetch", self.budget, self.request()).await?;
        let quotation = parse_quotation(&body)?;
        debug!(
            value = quotation.value,
            timestamp = quotation.timestamp,
            "Parsed provider quotation"
        );
        Ok(quotation)
    }
}
