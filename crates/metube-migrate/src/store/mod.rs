//! Document stores the migrated collections are loaded into.

pub mod common;
pub mod data_api;
pub mod json_dir;
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::StoreConfig;
use crate::error::Result;

pub use data_api::DataApiStore;
pub use json_dir::JsonDirStore;
pub use memory::{MemoryStore, StoreCall};

/// Write capability the load stage needs from a document store.
///
/// Implement this trait to load into a new kind of store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store type name, for logs.
    fn store_type(&self) -> &'static str;

    /// Removes every document of `collection`.
    async fn clear(&self, collection: &str) -> Result<()>;

    /// Appends `documents` to `collection`, returning how many were written.
    async fn insert_many(&self, collection: &str, documents: Vec<Value>) -> Result<u64>;
}

/// Creates a store from configuration.
///
/// # Errors
///
/// Returns an error if the connection string cannot be resolved.
pub fn create_store(config: &StoreConfig) -> Result<Box<dyn DocumentStore>> {
    match config {
        StoreConfig::DataApi(cfg) => Ok(Box::new(DataApiStore::new(cfg.resolve()?))),
        StoreConfig::JsonDir(cfg) => Ok(Box::new(JsonDirStore::new(cfg.path.clone()))),
        StoreConfig::Memory => Ok(Box::new(MemoryStore::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JsonDirConfig;

    #[test]
    fn test_create_store_types() {
        let store = create_store(&StoreConfig::Memory).unwrap();
        assert_eq!(store.store_type(), "memory");

        let store = create_store(&StoreConfig::JsonDir(JsonDirConfig {
            path: "./out".into(),
        }))
        .unwrap();
        assert_eq!(store.store_type(), "json_dir");
    }
}
