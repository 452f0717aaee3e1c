//! Typed failures of the quotation pipeline

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("{operation} exceeded its {}ms deadline", .budget.as_millis())]
    Timeout {
        operation: &'static str,
        budget: Duration,
    },
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
    #[error("Quote provider unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("Quotation store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Failed to persist quotation: {0}")]
    PersistFailed(#[source] Box<QuoteError>),
}

impl QuoteError {
    /// Stable name of the failure, reported to HTTP callers.
    pub fn kind(&self) -> &'static str {
        match self {
            QuoteError::Timeout { .. } => "Timeout",
            QuoteError::MalformedResponse(_) => "MalformedResponse",
            QuoteError::UpstreamUnavailable(_) => "UpstreamUnavailable",
            QuoteError::StoreUnavailable(_) => "StoreUnavailable",
            QuoteError::PersistFailed(_) => "PersistFailed",
        }
    }

    pub fn persist_failed(cause: QuoteError) -> Self {
        QuoteError::PersistFailed(Box::new(cause))
    }
}

impl From<sqlx::Error> for QuoteError {
    fn from(err: sqlx::Error) -> Self {
        QuoteError::StoreUnavailable(err.to_string())
    }
}
