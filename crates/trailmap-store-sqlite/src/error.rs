//! Error type for `trailmap-store-sqlite`.

use thiserror::Error;
use trailmap_core::activity::ActivityId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// An update named an activity that is not in the table.
  #[error("activity not found: {0}")]
  ActivityNotFound(ActivityId),

  #[error("activity {0} already exists")]
  DuplicateActivity(ActivityId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
