use crate::core::error::QuoteError;
use crate::core::quotation::{QuoteProvider, Quotation};
use crate::core::store::QuotationStore;
use chrono::{DateTime, Local};
use std::sync::Arc;
use tracing::debug;

/// Read-through daily cache in front of a [`QuoteProvider`].
///
/// A quotation stored during the current local day is served as is. On a
/// miss the inner provider is asked once and the result is written back,
/// unless another request already stored a row with the same timestamp, in
/// which case that row wins.
#[derive(Clone)]
pub struct CachingQuoteProvider {
    inner: Arc<dyn QuoteProvider>,
    store: Arc<dyn QuotationStore>,
}

impl CachingQuoteProvider {
    pub fn new(inner: Arc<dyn QuoteProvider>, store: Arc<dyn QuotationStore>) -> Self {
        Self { inner, store }
    }

    /// Resolves the quotation for the local day containing `now`.
    pub async fn quotation_at(&self, now: DateTime<Local>) -> Result<Quotation, QuoteError> {
        // A failing store fails the request rather than falling through to
        // the provider on every call.
        if let Some(cached) = self.store.find_today(now).await? {
            debug!(id = %cached.id, timestamp = cached.timestamp, "Cache hit for quotation");
            return Ok(cached);
        }
        debug!("Cache miss for quotation");

        let fetched = self.inner.fetch_quotation().await?;

        let existing = self
            .store
            .find_by_timestamp(fetched.timestamp)
            .await
            .map_err(QuoteError::persist_failed)?;
        if let Some(existing) = existing {
            debug!(
                id = %existing.id,
                timestamp = existing.timestamp,
                "Quotation already stored by another request"
            );
            return Ok(existing);
        }

        self.store
            .insert(&fetched)
            .await
            .map_err(QuoteError::persist_failed)
    }
}
