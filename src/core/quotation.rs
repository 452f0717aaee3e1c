//! Quotation record and the provider abstraction

use crate::core::error::QuoteError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A USD to BRL rate observed at `timestamp` (epoch seconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quotation {
    pub id: String,
    pub value: f64,
    pub timestamp: i64,
}

impl Quotation {
    /// Creates a record with a fresh identifier.
    pub fn new(value: f64, timestamp: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            value,
            timestamp,
        }
    }
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quotation(&self) -> Result<Quotation, QuoteError>;
}
