//! Mapping between `activities` rows and [`Activity`].

use rusqlite::types::ValueRef;
use tracing::debug;
use trailmap_core::activity::{Activity, ActivityId, parse_duration_seconds};

/// Column list shared by every full-row `SELECT`, in [`activity_from_row`]
/// order.
pub const ACTIVITY_COLUMNS: &str = "run_id, name, distance, moving_time, type, subtype,
   start_date, start_date_local, location_country, summary_polyline,
   average_heartrate, average_speed, elevation_gain";

pub fn activity_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Activity> {
  let id = ActivityId(row.get(0)?);
  Ok(Activity {
    id,
    name:              row.get::<_, Option<String>>(1)?.unwrap_or_default(),
    distance:          row.get(2)?,
    moving_time:       moving_time(id, row.get_ref(3)?),
    activity_type:     row.get(4)?,
    activity_subtype:  row.get(5)?,
    start_time_utc:    row.get(6)?,
    start_time_local:  row.get(7)?,
    location_raw:      row.get(8)?,
    route_encoding:    row.get(9)?,
    average_heartrate: row.get(10)?,
    average_speed:     row.get(11)?,
    elevation_gain:    row.get(12)?,
  })
}

/// Seconds, from a numeric column or the text interval older databases hold.
/// Anything else reads as absent rather than failing the row.
fn moving_time(id: ActivityId, value: ValueRef<'_>) -> Option<f64> {
  match value {
    ValueRef::Null => None,
    ValueRef::Integer(n) => Some(n as f64),
    ValueRef::Real(x) => Some(x),
    ValueRef::Text(bytes) => {
      let text = String::from_utf8_lossy(bytes);
      let seconds = parse_duration_seconds(&text);
      if seconds.is_none() {
        debug!(%id, value = %text, "unreadable moving_time, treating as absent");
      }
      seconds
    }
    ValueRef::Blob(_) => {
      debug!(%id, "blob moving_time, treating as absent");
      None
    }
  }
}

/// Counts come back from SQLite as signed integers.
pub fn count(n: i64) -> u64 { u64::try_from(n).unwrap_or(0) }
