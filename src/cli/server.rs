use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::api::{AppState, app_router};
use crate::core::config::AppConfig;
use crate::providers::{AwesomeApiProvider, CachingQuoteProvider};
use crate::store;

/// Wires the store and the provider into the shared request state.
pub async fn build_state(config: &AppConfig) -> Result<Arc<AppState>> {
    let store = store::open(config).await?;
    let provider = AwesomeApiProvider::new(&config.quoting_api_url, config.timeouts.fetch())?;

    Ok(Arc::new(AppState {
        quotes: CachingQuoteProvider::new(Arc::new(provider), store),
    }))
}

pub async fn serve(config: &AppConfig) -> Result<()> {
    let state = build_state(config).await?;
    let router = app_router(state);

    let listener = bind_listener(&config.server.listen_addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

/// Binds `addr` and logs the address actually bound, which differs for port 0.
pub async fn bind_listener(addr: &str) -> Result<TcpListener> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    let local_addr = listener
        .local_addr()
        .with_context(|| format!("Failed to read local address for {addr}"))?;
    info!("Listening on {local_addr}");
    Ok(listener)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_listener_resolves_ephemeral_port() {
        let listener = bind_listener("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_bind_listener_reports_bad_address() {
        let err = bind_listener("not-an-address").await.unwrap_err();
        assert!(err.to_string().contains("not-an-address"));
    }
}
