//! Batch passes over an [`ActivityStore`]: location correction and feed
//! export.

use thiserror::Error;
use tracing::{debug, info};

use crate::{
  activity::LocationUpdate,
  feed::{self, ExportRecord, MIN_DISTANCE},
  location::{CorrectionPass, Normalizer},
  store::ActivityStore,
  suffix::LocationTables,
};

#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error(transparent)]
  Core(#[from] crate::Error),
}

impl PipelineError {
  fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

// ─── Correction pass ─────────────────────────────────────────────────────────

/// Outcome of a correction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrectionReport {
  /// Rows with a non-empty location that were inspected.
  pub scanned: usize,
  /// Rows whose corrected location differs from the stored one.
  pub changes: Vec<LocationUpdate>,
  /// Whether `changes` were written back.
  pub applied: bool,
}

impl CorrectionReport {
  pub fn unchanged(&self) -> usize { self.scanned - self.changes.len() }
}

/// Read every located activity, correct its location, and write the rows
/// that changed back in one batch.
///
/// With nothing to change, or with `dry_run`, the store is not written.
pub async fn correct_locations<S: ActivityStore>(
  store: &S,
  tables: &LocationTables,
  pass: CorrectionPass,
  dry_run: bool,
) -> Result<CorrectionReport, PipelineError> {
  let rows = store.locations().await.map_err(PipelineError::store)?;
  info!(rows = rows.len(), ?pass, "scanning stored locations");

  let normalizer = Normalizer::new(tables);
  let changes: Vec<LocationUpdate> = rows
    .iter()
    .filter_map(|row| {
      let new = normalizer.correct(&row.location, pass);
      (new != row.location).then(|| LocationUpdate {
        id:   row.id,
        name: row.name.clone(),
        old:  row.location.clone(),
        new,
      })
    })
    .collect();

  for change in &changes {
    debug!(id = %change.id, old = %change.old, new = %change.new, "location corrected");
  }

  let applied = !dry_run && !changes.is_empty();
  if applied {
    let written = store
      .update_locations(changes.clone())
      .await
      .map_err(PipelineError::store)?;
    info!(written, "location corrections committed");
  } else {
    info!(pending = changes.len(), dry_run, "no locations written");
  }

  Ok(CorrectionReport { scanned: rows.len(), changes, applied })
}

// ─── Export ──────────────────────────────────────────────────────────────────

/// Read feed candidates from the store and build the feed.
pub async fn export<S: ActivityStore>(store: &S) -> Result<Vec<ExportRecord>, PipelineError> {
  let activities = store
    .feed_activities(MIN_DISTANCE)
    .await
    .map_err(PipelineError::store)?;
  info!(candidates = activities.len(), "loaded feed candidates");

  let records = feed::build_feed(activities)?;
  info!(records = records.len(), "feed built");
  Ok(records)
}
