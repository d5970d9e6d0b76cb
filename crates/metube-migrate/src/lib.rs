// Migration tool - pedantic lints relaxed for CLI ergonomics
#![allow(clippy::pedantic)]

//! # MeTube Migration Tool
//!
//! `metube-migrate` moves a legacy video-sharing database export into the
//! MeTube document collections and media layout.
//!
//! ## Stages
//!
//! | Stage | Module | Notes |
//! |-------|--------|-------|
//! | Read | [`record`] | `{model, pk, fields}` JSON export |
//! | Classify | [`classify`] | Five buckets, ignore set, unknown tags reported |
//! | Games | [`games`] | Fresh ids, memberships, "No game" sentinel |
//! | Build | [`builder`] | `video_files` and `videos` documents |
//! | Associate | [`associate`] | Converted variants first, then uploads |
//! | Materialize | [`materialize`] | Link, copy or nothing |
//! | Load | [`load`] | Full replace, one collection at a time |
//!
//! ## Quick Start
//!
//! ```bash
//! metube-migrate --config migration.yaml --link-files
//!
//! # Dry run (preview only)
//! metube-migrate --config migration.yaml --dry-run
//! ```
//!
//! ## Configuration Example
//!
//! ```yaml
//! source:
//!   export: ./dump.json
//!   media_root: /srv/legacy/media
//!
//! destination:
//!   root: /srv/metube/media
//!
//! store:
//!   type: data_api
//!   url_from:
//!     file: ./Rocket.toml
//!   database: metube
//!
//! options:
//!   file_strategy: link
//! ```

#![warn(missing_docs)]

pub mod associate;
pub mod builder;
pub mod classify;
pub mod config;
pub mod documents;
pub mod error;
pub mod games;
pub mod identity;
pub mod load;
pub mod materialize;
pub mod pipeline;
pub mod prompt;
pub mod record;
pub mod retry;
pub mod snapshot;
pub mod store;

pub use config::{MigrationConfig, MigrationOptions, StoreConfig};
pub use error::{Error, Result, Severity};
pub use materialize::FileStrategy;
pub use pipeline::{MigrationStats, Pipeline};
pub use snapshot::Snapshot;
pub use store::{create_store, DocumentStore};
