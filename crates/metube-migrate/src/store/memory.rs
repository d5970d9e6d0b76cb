//! In-process store recording every call.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::DocumentStore;
use crate::error::Result;

/// A call received by a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// `clear(collection)`
    Clear(String),
    /// `insert_many(collection, n documents)`
    InsertMany(String, usize),
}

#[derive(Debug, Default)]
struct Inner {
    collections: HashMap<String, Vec<Value>>,
    calls: Vec<StoreCall>,
}

/// Store keeping collections in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Documents currently in `collection`.
    #[must_use]
    pub fn documents(&self, collection: &str) -> Vec<Value> {
        self.lock()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn store_type(&self) -> &'static str {
        "memory"
    }

    async fn clear(&self, collection: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Clear(collection.to_string()));
        inner.collections.remove(collection);
        Ok(())
    }

    async fn insert_many(&self, collection: &str, documents: Vec<Value>) -> Result<u64> {
        let mut inner = self.lock();
        let count = documents.len();
        inner
            .calls
            .push(StoreCall::InsertMany(collection.to_string(), count));
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .extend(documents);
        Ok(count as u64)
    }
}
