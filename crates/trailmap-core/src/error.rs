//! Error types for `trailmap-core`.

use thiserror::Error;

use crate::{activity::ActivityId, suffix::AdminLevel};

#[derive(Debug, Error)]
pub enum Error {
  #[error("activity {id}: unparseable start_date_local {value:?}")]
  InvalidTimestamp { id: ActivityId, value: String },

  #[error("{level} suffix entry {short:?} -> {canonical:?}: {reason}")]
  InvalidSuffixEntry {
    level:     AdminLevel,
    short:     String,
    canonical: String,
    reason:    &'static str,
  },

  #[error("country {value:?}: {reason}")]
  InvalidCountry { value: String, reason: &'static str },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
