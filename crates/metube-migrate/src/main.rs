//! MeTube Migration CLI
//!
//! Imports a legacy database export and its media into MeTube.

// CLI tool - relax pedantic lints for ergonomics
#![allow(clippy::pedantic)]

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use metube_migrate::config::{
    ConnectionKey, DataApiConfig, DestinationConfig, JsonDirConfig, SourceConfig,
};
use metube_migrate::{
    create_store, prompt, FileStrategy, MigrationConfig, MigrationOptions, Pipeline, StoreConfig,
};

#[derive(Parser)]
#[command(name = "metube-migrate")]
#[command(version)]
#[command(about = "Import a legacy video-sharing export into MeTube", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args, Clone, Default)]
struct RunArgs {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Folder that contains the videos to import
    #[arg(long = "from", value_name = "DIR")]
    from: Option<PathBuf>,

    /// Folder the backend serves videos from
    #[arg(long, value_name = "DIR")]
    target: Option<PathBuf>,

    /// JSON file dumped from the legacy database
    #[arg(long, value_name = "FILE")]
    data: Option<PathBuf>,

    /// Rocket.toml holding the database URL
    #[arg(long, value_name = "FILE")]
    rocket_config: Option<PathBuf>,

    /// Name of the database to import to
    #[arg(long)]
    db: Option<String>,

    /// Data API key
    #[arg(long, env = "METUBE_DATA_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Write collections as JSON files to this directory instead
    #[arg(long, value_name = "DIR")]
    store_dir: Option<PathBuf>,

    /// Skip confirmation
    #[arg(short = 'y', long = "yes")]
    yes: bool,

    /// Link files from --from to --target
    #[arg(long)]
    link_files: bool,

    /// Copy files from --from to --target
    #[arg(long)]
    copy_files: bool,

    /// Skip the existence check while building documents
    #[arg(long)]
    skip_existing_check: bool,

    /// Dry run mode (don't write files or documents)
    #[arg(long)]
    dry_run: bool,

    /// Insert without clearing collections first
    #[arg(long)]
    no_clean: bool,

    /// Load a previously dumped snapshot, skipping everything else
    #[arg(long, value_name = "FILE")]
    load_only: Option<PathBuf>,

    /// Write computed collections to this file before loading
    #[arg(long, value_name = "FILE")]
    dump: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the migration
    Run(RunArgs),

    /// Validate configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,
    },

    /// Print bucket counts of an export
    Classify {
        /// JSON file dumped from the legacy database
        #[arg(long, value_name = "FILE")]
        data: PathBuf,
    },

    /// Generate example configuration
    Init {
        /// Output file path
        #[arg(short, long, default_value = "migration.yaml")]
        output: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Some(Commands::Run(args)) => run_migration(args).await?,
        Some(Commands::Validate { config }) => validate_config(&config)?,
        Some(Commands::Classify { data }) => classify_export(data)?,
        Some(Commands::Init { output }) => generate_config(&output)?,
        None => run_migration(cli.run).await?,
    }

    Ok(())
}

async fn run_migration(args: RunArgs) -> anyhow::Result<()> {
    // Conflicting strategies must fail before anything is read or written.
    let strategy = FileStrategy::from_flags(args.link_files, args.copy_files)?;

    let config = build_config(&args, strategy)?;
    config.validate()?;

    if !config.options.assume_yes && !config.options.dry_run && !prompt::confirm_overwrite(&config)? {
        println!("Aborted, nothing was changed.");
        return Ok(());
    }

    let store = create_store(&config.store)?;
    info!("Using {} store", store.store_type());

    let load_only = config.options.load_only.clone();
    let dry_run = config.options.dry_run;
    let pipeline = Pipeline::new(config);

    if let Some(path) = load_only {
        let stats = pipeline.load_only(&path, store.as_ref()).await?;
        println!(
            "\n✅ Loaded {} documents into {} collections",
            stats.inserted, stats.cleared
        );
        return Ok(());
    }

    let stats = pipeline.run(store.as_ref()).await?;
    prompt::print_stats(&stats, dry_run);

    Ok(())
}

/// Starts from the config file, if any, then applies command-line overrides.
fn build_config(args: &RunArgs, strategy: FileStrategy) -> anyhow::Result<MigrationConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            MigrationConfig::from_file(path)
                .with_context(|| format!("reading {}", path.display()))?
        }
        None => MigrationConfig {
            source: SourceConfig {
                export: source_path(args, &args.data, "--data")?,
                media_root: source_path(args, &args.from, "--from")?,
            },
            destination: DestinationConfig {
                root: source_path(args, &args.target, "--target")?,
            },
            store: StoreConfig::Memory,
            users: Default::default(),
            options: MigrationOptions::default(),
        },
    };

    if let Some(data) = &args.data {
        config.source.export = data.clone();
    }
    if let Some(from) = &args.from {
        config.source.media_root = from.clone();
    }
    if let Some(target) = &args.target {
        config.destination.root = target.clone();
    }

    if let Some(dir) = &args.store_dir {
        config.store = StoreConfig::JsonDir(JsonDirConfig { path: dir.clone() });
    } else if args.rocket_config.is_some() || args.db.is_some() || args.config.is_none() {
        config.store = apply_store_flags(config.store, args)?;
    }

    if strategy != FileStrategy::None {
        config.options.file_strategy = strategy;
    }
    let options = &mut config.options;
    options.assume_yes |= args.yes;
    options.skip_existing_check |= args.skip_existing_check;
    options.dry_run |= args.dry_run;
    options.no_clean |= args.no_clean;
    if args.load_only.is_some() {
        options.load_only = args.load_only.clone();
    }
    if args.dump.is_some() {
        options.dump = args.dump.clone();
    }

    Ok(config)
}

fn apply_store_flags(store: StoreConfig, args: &RunArgs) -> anyhow::Result<StoreConfig> {
    let mut cfg = match store {
        StoreConfig::DataApi(cfg) => cfg,
        _ => DataApiConfig {
            url: None,
            url_from: None,
            api_key: None,
            database: String::new(),
            data_source: "mongodb-atlas".to_string(),
        },
    };

    if let Some(file) = &args.rocket_config {
        cfg.url = None;
        cfg.url_from = Some(ConnectionKey {
            file: file.clone(),
            key: "default.databases.metube.url".to_string(),
        });
    }
    if let Some(db) = &args.db {
        cfg.database = db.clone();
    }
    if args.api_key.is_some() {
        cfg.api_key = args.api_key.clone();
    }
    if cfg.url.is_none() && cfg.url_from.is_none() {
        anyhow::bail!("--rocket-config is required unless --store-dir or --config is given");
    }
    if cfg.database.is_empty() {
        anyhow::bail!("--db is required unless --store-dir or --config is given");
    }

    Ok(StoreConfig::DataApi(cfg))
}

/// Paths are only needed when the pipeline runs; `--load-only` skips it.
fn source_path(args: &RunArgs, value: &Option<PathBuf>, flag: &str) -> anyhow::Result<PathBuf> {
    match value {
        Some(path) => Ok(path.clone()),
        None if args.load_only.is_some() => Ok(PathBuf::new()),
        None => anyhow::bail!("{flag} is required when no --config is given"),
    }
}

fn validate_config(config_path: &Path) -> anyhow::Result<()> {
    info!("Validating configuration from {:?}", config_path);

    let config = MigrationConfig::from_file(config_path)?;
    config.validate()?;

    println!("✅ Configuration is valid!");
    println!("   Export:      {:?}", config.source.export);
    println!("   Media root:  {:?}", config.source.media_root);
    println!("   Destination: {:?}", config.destination.root);
    println!("   Strategy:    {:?}", config.options.file_strategy);
    println!("   Users:       {}", config.identity_table().len());

    Ok(())
}

fn classify_export(data: PathBuf) -> anyhow::Result<()> {
    let config = MigrationConfig {
        source: SourceConfig {
            export: data,
            media_root: PathBuf::new(),
        },
        destination: DestinationConfig {
            root: PathBuf::new(),
        },
        store: StoreConfig::Memory,
        users: Default::default(),
        options: MigrationOptions::default(),
    };

    let (buckets, report, total) = Pipeline::new(config).classify()?;
    println!("Read {total} records");
    prompt::print_classification(&buckets, &report);

    Ok(())
}

fn generate_config(output: &Path) -> anyhow::Result<()> {
    std::fs::write(output, CONFIG_TEMPLATE)?;
    println!("✅ Generated configuration: {:?}", output);
    println!(
        "   Edit the file and run: metube-migrate run --config {:?}",
        output
    );

    Ok(())
}

const CONFIG_TEMPLATE: &str = r#"# MeTube migration configuration
source:
  export: ./dump.json
  media_root: /srv/legacy/media

destination:
  root: /srv/metube/media

store:
  type: data_api
  url_from:
    file: ./Rocket.toml
    key: default.databases.metube.url
  # api_key: ...        # or set METUBE_DATA_API_KEY
  database: metube

# Legacy user id -> MeTube username. Leave empty for the built-in table.
users: {}

options:
  file_strategy: link   # link, copy or none
  skip_existing_check: false
  dry_run: false
  no_clean: false
"#;
