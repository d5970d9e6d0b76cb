//! Console confirmation and summaries.

use console::{style, Style};
use dialoguer::{theme::ColorfulTheme, Confirm};

use crate::classify::{Buckets, ClassifyReport};
use crate::config::{MigrationConfig, StoreConfig};
use crate::error::{Error, Result};
use crate::pipeline::MigrationStats;

/// Asks before the target collections are overwritten.
///
/// Returns `false` if the user declines.
///
/// # Errors
///
/// Returns an error if the terminal is not interactive.
pub fn confirm_overwrite(config: &MigrationConfig) -> Result<bool> {
    let yellow = Style::new().yellow().bold();

    println!();
    println!(
        "{} This will overwrite completely the current database ({}) and media in {}.",
        yellow.apply_to("WARNING!"),
        describe_store(&config.store),
        config.destination.root.display()
    );
    println!("   File strategy: {:?}", config.options.file_strategy);
    println!();

    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Are you sure you want to continue?")
        .default(false)
        .interact()
        .map_err(|e| Error::Config(format!("Confirmation cancelled: {e}")))
}

/// Prints the final counters.
pub fn print_stats(stats: &MigrationStats, dry_run: bool) {
    let green = Style::new().green().bold();
    let bold = Style::new().bold();

    println!();
    if dry_run {
        println!("{} Dry run complete (nothing written)", green.apply_to("✅"));
    } else {
        println!("{} Migration complete!", green.apply_to("✅"));
    }
    println!("┌─────────────────────────────────────────────");
    println!("│ {} {}", bold.apply_to("Records:      "), stats.records);
    println!("│ {} {}", bold.apply_to("Ignored:      "), stats.ignored);
    println!("│ {} {}", bold.apply_to("Unknown:      "), stats.unknown);
    println!(
        "│ {} {} uploads, {} converted ({} linked)",
        bold.apply_to("Videos built: "),
        stats.videos.uploads_built,
        stats.videos.converted_built,
        stats.videos.linked
    );
    println!("│ {} {}", bold.apply_to("Skipped:      "), stats.skipped());
    println!(
        "│ {} {} planned, {} linked, {} copied",
        bold.apply_to("Files:        "),
        stats.planned_files,
        stats.files.linked,
        stats.files.copied
    );
    println!("│ {} {}", bold.apply_to("Inserted:     "), stats.load.inserted);
    println!("│ {} {:.2}s", bold.apply_to("Duration:     "), stats.duration_secs);
    println!("└─────────────────────────────────────────────");
}

/// Prints bucket sizes and dropped tags.
pub fn print_classification(buckets: &Buckets, report: &ClassifyReport) {
    let bold = Style::new().bold();

    println!();
    println!("{}", bold.apply_to("Classified records"));
    println!("   users:            {}", buckets.users.len());
    println!("   uploaded videos:  {}", buckets.uploaded_videos.len());
    println!("   converted videos: {}", buckets.converted_videos.len());
    println!("   thumbnails:       {}", buckets.thumbnails.len());
    println!("   games:            {}", buckets.games.len());
    println!("   ignored:          {}", report.ignored);
    if !report.unknown.is_empty() {
        println!("{}", style("Unknown models").yellow());
        for (model, count) in &report.unknown {
            println!("   {model}: {count}");
        }
    }
}

fn describe_store(store: &StoreConfig) -> String {
    match store {
        StoreConfig::DataApi(cfg) => format!("data_api database '{}'", cfg.database),
        StoreConfig::JsonDir(cfg) => format!("json_dir {}", cfg.path.display()),
        StoreConfig::Memory => "memory".to_string(),
    }
}
