//! Activity records as stored by the ingestion side and read by the feed.
//!
//! Serialised field names follow the feed contract the map front end reads,
//! which is why several of them differ from the Rust field names.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Format of `start_date_local`; fixed-width, so string order is time order.
pub const LOCAL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Interval form legacy ingestion wrote durations in, as an offset from the
/// epoch: `1970-01-01 00:30:00.000000` is thirty minutes.
pub const LEGACY_INTERVAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Read a duration stored as text: either plain seconds or the legacy
/// epoch-offset interval. `None` when it is neither.
pub fn parse_duration_seconds(raw: &str) -> Option<f64> {
  let raw = raw.trim();
  if let Ok(seconds) = raw.parse::<f64>() {
    return seconds.is_finite().then_some(seconds);
  }
  let offset = NaiveDateTime::parse_from_str(raw, LEGACY_INTERVAL_FORMAT).ok()?;
  Some(offset.and_utc().timestamp_millis() as f64 / 1000.0)
}

/// Stable activity identifier. Never reused.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ActivityId(pub i64);

impl fmt::Display for ActivityId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// One activity row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
  #[serde(rename = "run_id")]
  pub id:                ActivityId,
  pub name:              String,
  pub distance:          Option<f64>,
  /// Seconds.
  pub moving_time:       Option<f64>,
  #[serde(rename = "type")]
  pub activity_type:     Option<String>,
  #[serde(rename = "subtype")]
  pub activity_subtype:  Option<String>,
  #[serde(rename = "start_date")]
  pub start_time_utc:    String,
  #[serde(rename = "start_date_local")]
  pub start_time_local:  String,
  #[serde(rename = "location_country")]
  pub location_raw:      Option<String>,
  #[serde(rename = "summary_polyline")]
  pub route_encoding:    Option<String>,
  pub average_heartrate: Option<f64>,
  pub average_speed:     Option<f64>,
  pub elevation_gain:    Option<f64>,
}

impl Activity {
  /// Parse `start_time_local` and return its calendar date.
  pub fn local_date(&self) -> Result<NaiveDate> {
    NaiveDateTime::parse_from_str(&self.start_time_local, LOCAL_TIME_FORMAT)
      .map(|dt| dt.date())
      .map_err(|_| Error::InvalidTimestamp {
        id:    self.id,
        value: self.start_time_local.clone(),
      })
  }
}

/// A location correction waiting to be written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationUpdate {
  pub id:   ActivityId,
  pub name: String,
  pub old:  String,
  pub new:  String,
}
