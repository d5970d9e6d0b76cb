//! Store writing each collection to `<dir>/<collection>.json`.

use async_trait::async_trait;
use serde_json::Value;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;

use super::DocumentStore;
use crate::error::{Error, Result};

/// JSON file per collection, for offline inspection or `mongoimport`.
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}.json"))
    }

    fn read(&self, collection: &str) -> Result<Vec<Value>> {
        let path = self.path(collection);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&path)?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            Error::Store(format!("Collection file '{}' is corrupt: {}", path.display(), e))
        })
    }

    fn write(&self, collection: &str, documents: &[Value]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(collection), serde_json::to_vec_pretty(documents)?)?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonDirStore {
    fn store_type(&self) -> &'static str {
        "json_dir"
    }

    async fn clear(&self, collection: &str) -> Result<()> {
        self.write(collection, &[])
    }

    async fn insert_many(&self, collection: &str, documents: Vec<Value>) -> Result<u64> {
        let count = documents.len() as u64;
        let mut existing = self.read(collection)?;
        existing.extend(documents);
        self.write(collection, &existing)?;
        Ok(count)
    }
}
