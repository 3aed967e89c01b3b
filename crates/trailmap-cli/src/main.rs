//! `trailmap` — location correction and feed export for the activity map.
//!
//! Reads `trailmap.toml` (or the path given with `--config`), opens the SQLite
//! activity store, and runs one batch pass.
//!
//! # Usage
//!
//! ```text
//! trailmap fix-locations --pass all --dry-run
//! trailmap fix-locations --export
//! trailmap export --output src/static/activities.json
//! trailmap stats
//! trailmap coverage
//! ```

mod artifact;
mod report;
mod settings;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use settings::Settings;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;
use trailmap_core::{
  feed::{self, FeedStats},
  location::CorrectionPass,
  pipeline,
  store::ActivityStore,
};
use trailmap_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "Normalize activity locations and regenerate the map feed")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "trailmap.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Rewrite stored locations into `City,Province,Country` form.
  FixLocations {
    #[arg(long, value_enum, default_value_t = Pass::All)]
    pass:    Pass,
    /// Report what would change without writing.
    #[arg(long)]
    dry_run: bool,
    /// Regenerate the feed afterwards if anything was written.
    #[arg(long)]
    export:  bool,
  },
  /// Regenerate the JSON feed from the store.
  Export {
    /// Feed path; defaults to `feed_path` from the config.
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
  /// City, province, and country distribution of an existing feed.
  Stats {
    #[arg(long)]
    feed: Option<PathBuf>,
  },
  /// Route coverage per stored location.
  Coverage,
}

#[derive(Clone, Copy, ValueEnum)]
enum Pass {
  Format,
  City,
  Province,
  All,
}

impl From<Pass> for CorrectionPass {
  fn from(p: Pass) -> Self {
    match p {
      Pass::Format => CorrectionPass::Format,
      Pass::City => CorrectionPass::CitySuffix,
      Pass::Province => CorrectionPass::ProvinceSuffix,
      Pass::All => CorrectionPass::All,
    }
  }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr; stdout carries the reports.
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  match cli.command {
    Command::FixLocations { pass, dry_run, export } => {
      let tables = settings.tables()?;
      let store = open_store(&settings.store_path).await?;

      let report = pipeline::correct_locations(&store, &tables, pass.into(), dry_run)
        .await
        .context("location correction failed")?;
      report::corrections(&report);
      report::histogram(
        &store
          .location_histogram()
          .await
          .context("reading location distribution")?,
      );

      if export && report.applied {
        run_export(&store, &settings.feed_path).await?;
      }
    }
    Command::Export { output } => {
      let store = open_store(&settings.store_path).await?;
      let path = output.unwrap_or(settings.feed_path);
      run_export(&store, &path).await?;
    }
    Command::Stats { feed } => {
      let path = feed.unwrap_or(settings.feed_path);
      let locations = artifact::read_feed_locations(&path)?;
      report::stats(&FeedStats::from_locations(
        locations.iter().map(Option::as_deref),
      ));
    }
    Command::Coverage => {
      let store = open_store(&settings.store_path).await?;
      let rows = store
        .route_coverage()
        .await
        .context("reading route coverage")?;
      report::coverage(&rows);
    }
  }

  Ok(())
}

async fn open_store(path: &Path) -> anyhow::Result<SqliteStore> {
  SqliteStore::open(path)
    .await
    .with_context(|| format!("failed to open store at {path:?}"))
}

/// Build the whole feed in memory, then swap it into place.
async fn run_export(store: &SqliteStore, path: &Path) -> anyhow::Result<()> {
  let records = pipeline::export(store).await.context("feed export failed")?;
  let bytes = feed::render_feed(&records).context("serialising feed")?;

  artifact::write_atomic(path, &bytes)
    .with_context(|| format!("writing feed to {}", path.display()))?;
  info!(path = %path.display(), bytes = bytes.len(), "feed written");

  report::export(&records, &feed::summarize(&records), &path.display().to_string());
  Ok(())
}
