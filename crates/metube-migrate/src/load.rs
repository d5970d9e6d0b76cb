//! Full-replace load of the output collections.
//!
//! Collections are cleared and filled one at a time with no transaction
//! spanning them. A failure midway leaves the store mixed; re-running the
//! load restores it.

use std::path::PathBuf;
use tracing::info;

use crate::error::Result;
use crate::snapshot::Snapshot;
use crate::store::DocumentStore;

/// Load stage options.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Log intended effects without touching the store.
    pub dry_run: bool,
    /// Insert without clearing first.
    pub no_clean: bool,
    /// Write the snapshot here before touching the store.
    pub dump: Option<PathBuf>,
}

/// Load stage counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Collections cleared.
    pub cleared: u64,
    /// Documents inserted.
    pub inserted: u64,
}

/// Sequences dumping, clearing and inserting.
pub struct LoadCoordinator<'a> {
    store: &'a dyn DocumentStore,
    options: LoadOptions,
}

impl<'a> LoadCoordinator<'a> {
    /// Creates a coordinator writing to `store`.
    pub fn new(store: &'a dyn DocumentStore, options: LoadOptions) -> Self {
        Self { store, options }
    }

    /// Loads `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns the first dump or store error. Earlier collections stay written.
    pub async fn load(&self, snapshot: &Snapshot) -> Result<LoadStats> {
        if let Some(path) = &self.options.dump {
            snapshot.to_file(path)?;
            info!("Dumped {} documents to {}", snapshot.len(), path.display());
        }

        let mut stats = LoadStats::default();
        for (collection, documents) in snapshot.collections()? {
            if self.options.dry_run {
                info!(
                    "Dry run: would {}insert {} documents into {}",
                    if self.options.no_clean { "" } else { "clear and " },
                    documents.len(),
                    collection
                );
                continue;
            }

            if !self.options.no_clean {
                self.store.clear(collection).await?;
                stats.cleared += 1;
            }
            if documents.is_empty() {
                info!("{}: nothing to insert", collection);
                continue;
            }
            let inserted = self.store.insert_many(collection, documents).await?;
            info!(
                "{}: inserted {} documents into {}",
                self.store.store_type(),
                inserted,
                collection
            );
            stats.inserted += inserted;
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::{Game, GameUser};
    use crate::store::{MemoryStore, StoreCall};
    use tempfile::TempDir;

    fn snapshot() -> Snapshot {
        Snapshot {
            games: vec![Game {
                id: "g".to_string(),
                name: "No game".to_string(),
            }],
            game_users: vec![GameUser {
                user: "topongo".to_string(),
                game: "g".to_string(),
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_full_replace_order() {
        let store = MemoryStore::new();
        let stats = LoadCoordinator::new(&store, LoadOptions::default())
            .load(&snapshot())
            .await
            .unwrap();

        assert_eq!(stats, LoadStats { cleared: 4, inserted: 2 });
        assert_eq!(
            store.calls(),
            vec![
                StoreCall::Clear("games".to_string()),
                StoreCall::InsertMany("games".to_string(), 1),
                StoreCall::Clear("game_users".to_string()),
                StoreCall::InsertMany("game_users".to_string(), 1),
                StoreCall::Clear("video_files".to_string()),
                StoreCall::Clear("videos".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_dry_run_never_calls_store() {
        let dir = TempDir::new().unwrap();
        let dump = dir.path().join("dump.json");
        let store = MemoryStore::new();
        let options = LoadOptions {
            dry_run: true,
            dump: Some(dump.clone()),
            ..Default::default()
        };

        let stats = LoadCoordinator::new(&store, options)
            .load(&snapshot())
            .await
            .unwrap();

        assert_eq!(stats, LoadStats::default());
        assert!(store.calls().is_empty());
        assert_eq!(Snapshot::from_file(&dump).unwrap(), snapshot());
    }

    #[tokio::test]
    async fn test_no_clean_only_inserts() {
        let store = MemoryStore::new();
        let options = LoadOptions {
            no_clean: true,
            ..Default::default()
        };

        LoadCoordinator::new(&store, options)
            .load(&snapshot())
            .await
            .unwrap();

        assert!(store
            .calls()
            .iter()
            .all(|c| matches!(c, StoreCall::InsertMany(..))));
    }
}
