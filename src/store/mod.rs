pub mod memory;
pub mod sqlite;

use crate::core::config::AppConfig;
use crate::core::store::QuotationStore;
use anyhow::Result;
use memory::MemoryQuotationStore;
use sqlite::SqliteQuotationStore;
use std::sync::Arc;
use tracing::info;

/// Database name selecting the process-local store.
pub const IN_MEMORY: &str = ":memory:";

/// Builds the store named by `config.database`.
pub async fn open(config: &AppConfig) -> Result<Arc<dyn QuotationStore>> {
    if config.database == IN_MEMORY {
        info!("Using in-memory quotation store");
        return Ok(Arc::new(MemoryQuotationStore::new()));
    }

    let store = SqliteQuotationStore::open(
        &config.database,
        config.store.pool_size,
        config.timeouts.store(),
    )
    .await?;
    Ok(Arc::new(store))
}
