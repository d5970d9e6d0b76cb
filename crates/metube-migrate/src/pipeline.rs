//! Migration pipeline orchestration.

use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

use crate::associate::{resolve_associations, AssociationStats};
use crate::builder::VideoBuilder;
use crate::classify::{Buckets, Classifier, ClassifyReport};
use crate::config::MigrationConfig;
use crate::error::Result;
use crate::games::GameTable;
use crate::identity::{IdGenerator, ObjectIdGenerator};
use crate::load::{LoadCoordinator, LoadOptions, LoadStats};
use crate::materialize::{self, FileOperation, MaterializeStats};
use crate::record::load_export;
use crate::snapshot::Snapshot;
use crate::store::DocumentStore;

/// Migration statistics.
#[derive(Debug, Default, Clone)]
pub struct MigrationStats {
    /// Records read from the export.
    pub records: u64,
    /// Records dropped by the ignore set.
    pub ignored: u64,
    /// Records with an unknown type tag.
    pub unknown: u64,
    /// Video record counters.
    pub videos: AssociationStats,
    /// File operations planned.
    pub planned_files: u64,
    /// File operations applied.
    pub files: MaterializeStats,
    /// Store counters.
    pub load: LoadStats,
    /// Duration in seconds.
    pub duration_secs: f64,
}

impl MigrationStats {
    /// Records dropped at any stage.
    #[must_use]
    pub fn skipped(&self) -> u64 {
        self.videos.converted_skipped + self.videos.uploads_skipped
    }
}

/// Computed result of the pure stages.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Documents to load.
    pub snapshot: Snapshot,
    /// Files to materialize.
    pub operations: Vec<FileOperation>,
    /// Counters collected so far.
    pub stats: MigrationStats,
}

/// Migration pipeline.
pub struct Pipeline {
    config: MigrationConfig,
    ids: Box<dyn IdGenerator>,
}

impl Pipeline {
    /// Create a new migration pipeline.
    #[must_use]
    pub fn new(config: MigrationConfig) -> Self {
        Self {
            config,
            ids: Box::new(ObjectIdGenerator),
        }
    }

    /// Replaces the id generator.
    #[must_use]
    pub fn with_ids(mut self, ids: Box<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Configuration this pipeline runs with.
    #[must_use]
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Reads and classifies the export.
    ///
    /// # Errors
    ///
    /// Returns an error if the export cannot be read.
    pub fn classify(&self) -> Result<(Buckets, ClassifyReport, u64)> {
        let records = load_export(&self.config.source.export)?;
        let total = records.len() as u64;
        info!(
            "Read {} records from {}",
            total,
            self.config.source.export.display()
        );

        let classifier = Classifier::new().with_ignored(self.config.options.ignore_models.iter());
        let (buckets, report) = classifier.classify(records);
        if report.unknown_total() > 0 {
            warn!(
                "{} records with unknown types were dropped",
                report.unknown_total()
            );
        }
        Ok((buckets, report, total))
    }

    /// Runs every stage that does not touch the filesystem or the store.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error.
    pub fn prepare(&self) -> Result<Plan> {
        let (buckets, report, records) = self.classify()?;
        let identities = self.config.identity_table();

        let games = GameTable::build(&buckets.games, &identities, self.ids.as_ref())?;
        info!(
            "Built {} games with {} memberships",
            games.games().len(),
            games.memberships().len()
        );

        let builder = VideoBuilder::new(
            &self.config.source.media_root,
            &games,
            &buckets.thumbnails,
            &identities,
            self.ids.as_ref(),
        )
        .check_existing(!self.config.options.skip_existing_check);
        let catalog = resolve_associations(&buckets, &builder)?;

        let operations = materialize::plan(
            &catalog.entries,
            &self.config.source.media_root,
            &self.config.destination.root,
        );

        let stats = MigrationStats {
            records,
            ignored: report.ignored,
            unknown: report.unknown_total(),
            videos: catalog.stats,
            planned_files: operations.len() as u64,
            ..Default::default()
        };

        let snapshot = Snapshot {
            games: games.games(),
            game_users: games.memberships().to_vec(),
            video_files: catalog.video_files,
            videos: catalog.videos.into_values().collect(),
        };

        Ok(Plan {
            snapshot,
            operations,
            stats,
        })
    }

    /// Run the migration pipeline against `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the migration fails. Files and collections
    /// written before the failure stay in place.
    pub async fn run(&self, store: &dyn DocumentStore) -> Result<MigrationStats> {
        let start = Instant::now();
        info!("Starting migration pipeline");

        let Plan {
            snapshot,
            operations,
            mut stats,
        } = self.prepare()?;

        if self.config.options.dry_run {
            info!(
                "Dry run mode - {} file operations not applied",
                operations.len()
            );
        } else {
            stats.files = materialize::execute(&operations, self.config.options.file_strategy)?;
        }

        stats.load = LoadCoordinator::new(store, self.load_options())
            .load(&snapshot)
            .await?;

        stats.duration_secs = start.elapsed().as_secs_f64();
        info!("Migration finished in {:.2}s", stats.duration_secs);
        Ok(stats)
    }

    /// Loads a previously dumped snapshot, skipping every other stage.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be read or loaded.
    pub async fn load_only(&self, path: &Path, store: &dyn DocumentStore) -> Result<LoadStats> {
        let snapshot = Snapshot::from_file(path)?;
        info!(
            "Loading {} documents from {}",
            snapshot.len(),
            path.display()
        );
        LoadCoordinator::new(store, self.load_options())
            .load(&snapshot)
            .await
    }

    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            dry_run: self.config.options.dry_run,
            no_clean: self.config.options.no_clean,
            dump: self.config.options.dump.clone(),
        }
    }
}
