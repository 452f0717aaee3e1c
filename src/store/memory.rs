use crate::core::error::QuoteError;
use crate::core::quotation::Quotation;
use crate::core::store::{QuotationStore, start_of_local_day};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory quotation store, lost when the process exits
#[derive(Clone, Default)]
pub struct MemoryQuotationStore {
    inner: Arc<Mutex<Vec<Quotation>>>,
}

impl MemoryQuotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored quotations.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

#[async_trait]
impl QuotationStore for MemoryQuotationStore {
    async fn find_today(&self, now: DateTime<Local>) -> Result<Option<Quotation>, QuoteError> {
        let start = start_of_local_day(&now);
        let end = now.timestamp();
        let rows = self.inner.lock().await;
        Ok(rows
            .iter()
            .filter(|q| q.timestamp >= start && q.timestamp <= end)
            .max_by_key(|q| q.timestamp)
            .cloned())
    }

    async fn find_by_timestamp(&self, timestamp: i64) -> Result<Option<Quotation>, QuoteError> {
        let rows = self.inner.lock().await;
        Ok(rows.iter().find(|q| q.timestamp == timestamp).cloned())
    }

    async fn insert(&self, quotation: &Quotation) -> Result<Quotation, QuoteError> {
        let mut rows = self.inner.lock().await;
        if let Some(existing) = rows.iter().find(|q| q.timestamp == quotation.timestamp) {
            debug!(
                timestamp = quotation.timestamp,
                "Timestamp already stored, keeping the existing row"
            );
            return Ok(existing.clone());
        }
        rows.push(quotation.clone());
        debug!(id = %quotation.id, timestamp = quotation.timestamp, "Inserted quotation");
        Ok(quotation.clone())
    }
}
