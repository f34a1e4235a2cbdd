//! Shared store: the transport under the queue, status and session layers.

pub mod memory;
pub mod redis;
pub mod traits;

use std::sync::Arc;

pub use memory::MemoryStore;
pub use redis::RedisStore;
pub use traits::Store;

use crate::config::{BotConfig, StoreBackend};
use crate::error::StoreError;

/// Open the store selected by `config`.
pub async fn connect(config: &BotConfig) -> Result<Arc<dyn Store>, StoreError> {
    let store: Arc<dyn Store> = match config.store {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Redis => Arc::new(RedisStore::connect(&config.redis_url).await?),
    };
    store.ping().await?;
    tracing::info!(backend = store.backend_name(), "Store ready");
    Ok(store)
}
