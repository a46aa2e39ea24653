//! Startup wiring shared by the server binary and the CLI.

use crate::clock::{Clock, SystemClock};
use crate::config::{AppConfig, StoreBackend};
use crate::models;
use crate::services::{ServiceContext, Services};
use crate::store::{MemoryStore, PgStore, Store};
use crate::HisResult;
use std::sync::Arc;

/// Connect the configured backend and make sure every collection and unique index exists.
///
/// # Errors
///
/// Returns `HisError::Store` if the database cannot be reached or a migration fails.
pub async fn open_store(config: &AppConfig) -> HisResult<Arc<dyn Store>> {
    let store: Arc<dyn Store> = match config.store_backend() {
        StoreBackend::Postgres(url) => {
            let store = PgStore::connect(&url).await?;
            tracing::info!("connected to Postgres");
            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store");
            Arc::new(MemoryStore::new())
        }
    };
    migrate(store.as_ref()).await?;
    Ok(store)
}

/// Create missing collections and unique indexes. Safe to run repeatedly.
///
/// # Errors
///
/// Returns `HisError::Store` when the backend rejects the schema change.
pub async fn migrate(store: &dyn Store) -> HisResult<()> {
    let specs = models::collections();
    store.migrate(&specs).await?;
    tracing::debug!(collections = specs.len(), "migrations applied");
    Ok(())
}

/// Service context over `store` with the wall clock.
pub fn context(store: Arc<dyn Store>, config: Arc<AppConfig>) -> ServiceContext {
    ServiceContext::new(store, Arc::new(SystemClock) as Arc<dyn Clock>, config)
}

/// All services over `store` with the wall clock.
pub fn services(store: Arc<dyn Store>, config: Arc<AppConfig>) -> Services {
    Services::new(context(store, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_store_falls_back_to_memory() {
        let config = AppConfig::from_lookup(|_| None).expect("default config should resolve");
        let store = open_store(&config).await.expect("open should succeed");
        store.ping().await.expect("ping should succeed");
        migrate(store.as_ref()).await.expect("second migrate should succeed");
    }
}
