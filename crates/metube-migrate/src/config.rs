//! Configuration types for metube-migrate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::identity::StaticIdentityTable;
use crate::materialize::FileStrategy;
use crate::store::common::validate_url;

/// Main migration configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Legacy export and media.
    pub source: SourceConfig,
    /// New storage layout.
    pub destination: DestinationConfig,
    /// Document store to load into.
    pub store: StoreConfig,
    /// Legacy user id to username. Empty means the built-in table.
    #[serde(default)]
    pub users: BTreeMap<i64, String>,
    /// Run options.
    #[serde(default)]
    pub options: MigrationOptions,
}

/// Legacy side of the migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// JSON export of the legacy database.
    pub export: PathBuf,
    /// Base directory media paths in the export are relative to.
    pub media_root: PathBuf,
}

/// Storage layout the backend serves media from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Root for media files; thumbnails go to `thumbs/` below it.
    pub root: PathBuf,
}

/// Target document store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StoreConfig {
    /// MongoDB Data API.
    #[serde(rename = "data_api")]
    DataApi(DataApiConfig),
    /// One JSON file per collection.
    #[serde(rename = "json_dir")]
    JsonDir(JsonDirConfig),
    /// In-memory, discarded at exit.
    #[serde(rename = "memory")]
    Memory,
}

/// MongoDB Data API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataApiConfig {
    /// Data API endpoint URL.
    pub url: Option<String>,
    /// Read the endpoint URL from a TOML file instead.
    pub url_from: Option<ConnectionKey>,
    /// Data API key.
    pub api_key: Option<String>,
    /// Database name.
    pub database: String,
    /// Data source (cluster) name.
    #[serde(default = "default_data_source")]
    pub data_source: String,
}

/// Dotted key inside a TOML file holding a connection string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionKey {
    /// TOML file, typically the backend's `Rocket.toml`.
    pub file: PathBuf,
    /// Dotted path to the value.
    #[serde(default = "default_connection_key")]
    pub key: String,
}

/// Fully resolved Data API connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataApiTarget {
    /// Endpoint URL.
    pub url: String,
    /// API key.
    pub api_key: String,
    /// Database name.
    pub database: String,
    /// Data source name.
    pub data_source: String,
}

/// JSON directory store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonDirConfig {
    /// Output directory.
    pub path: PathBuf,
}

/// Run options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationOptions {
    /// How media files reach the destination.
    #[serde(default)]
    pub file_strategy: FileStrategy,
    /// Skip the source existence check while building documents.
    #[serde(default)]
    pub skip_existing_check: bool,
    /// Compute and log everything, write nothing.
    #[serde(default)]
    pub dry_run: bool,
    /// Insert without clearing the collections first.
    #[serde(default)]
    pub no_clean: bool,
    /// Write the computed collections to this file before loading.
    pub dump: Option<PathBuf>,
    /// Skip the pipeline and load this snapshot.
    pub load_only: Option<PathBuf>,
    /// Do not ask for confirmation.
    #[serde(default)]
    pub assume_yes: bool,
    /// Extra type tags to discard silently.
    #[serde(default)]
    pub ignore_models: Vec<String>,
}

fn default_data_source() -> String {
    "mongodb-atlas".to_string()
}

fn default_connection_key() -> String {
    "default.databases.metube.url".to_string()
}

impl MigrationConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.options.load_only.is_none() {
            if self.source.export.as_os_str().is_empty() {
                return Err(Error::Config("source export path cannot be empty".to_string()));
            }
            if self.destination.root.as_os_str().is_empty() {
                return Err(Error::Config(
                    "destination root cannot be empty".to_string(),
                ));
            }
        }
        if let StoreConfig::DataApi(cfg) = &self.store {
            if cfg.database.is_empty() {
                return Err(Error::Config("database name cannot be empty".to_string()));
            }
            if cfg.url.is_none() && cfg.url_from.is_none() {
                return Err(Error::Config(
                    "data_api store needs either url or url_from".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Identity table for this run.
    #[must_use]
    pub fn identity_table(&self) -> StaticIdentityTable {
        if self.users.is_empty() {
            StaticIdentityTable::legacy_default()
        } else {
            StaticIdentityTable::new(self.users.iter().map(|(k, v)| (*k, v.clone())))
        }
    }
}

impl DataApiConfig {
    /// Resolves the endpoint URL and API key.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if either is missing.
    pub fn resolve(&self) -> Result<DataApiTarget> {
        let url = match (&self.url, &self.url_from) {
            (Some(url), _) => url.clone(),
            (None, Some(key)) => lookup_connection_string(&key.file, &key.key)?,
            (None, None) => {
                return Err(Error::Config(
                    "data_api store needs either url or url_from".to_string(),
                ))
            }
        };
        if url.starts_with("mongodb://") || url.starts_with("mongodb+srv://") {
            return Err(Error::Config(format!(
                "data_api store needs the Data API endpoint URL, got a {} connection string; \
                 set store.url or use --store-dir",
                url.split("://").next().unwrap_or_default()
            )));
        }
        validate_url(&url)?;

        let api_key = self
            .api_key
            .clone()
            .ok_or_else(|| Error::Config("data_api store needs an api_key".to_string()))?;

        Ok(DataApiTarget {
            url,
            api_key,
            database: self.database.clone(),
            data_source: self.data_source.clone(),
        })
    }
}

/// Reads the string at dotted `key` from the TOML file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be parsed or the key is missing or
/// not a string.
pub fn lookup_connection_string(path: &Path, key: &str) -> Result<String> {
    let content = std::fs::read_to_string(path)?;
    let root: toml::Value = toml::from_str(&content)?;

    let mut current = &root;
    for part in key.split('.') {
        current = current.get(part).ok_or_else(|| {
            Error::Config(format!("Key '{}' not found in {}", key, path.display()))
        })?;
    }
    current
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::Config(format!("Key '{}' in {} is not a string", key, path.display())))
}
