//! [`SqliteStore`] — the SQLite implementation of [`ActivityStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use tracing::debug;

use trailmap_core::{
  activity::{Activity, ActivityId, LocationUpdate},
  store::{ActivityStore, LocatedActivity, LocationCount, RouteCoverage},
};

use crate::{
  Error, Result,
  row::{ACTIVITY_COLUMNS, activity_from_row, count},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An activity store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    debug!(path = %path.as_ref().display(), "opening activity store");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert one activity row. Rows are normally written by the ingestion
  /// side; this exists for seeding and tests.
  pub async fn insert_activity(&self, activity: Activity) -> Result<()> {
    let id = activity.id;

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let exists = conn
          .query_row(
            "SELECT 1 FROM activities WHERE run_id = ?1",
            rusqlite::params![activity.id.0],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if exists {
          return Ok(false);
        }

        conn.execute(
          "INSERT INTO activities (
             run_id, name, distance, moving_time, type, subtype,
             start_date, start_date_local, location_country, summary_polyline,
             average_heartrate, average_speed, elevation_gain
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
          rusqlite::params![
            activity.id.0,
            activity.name,
            activity.distance,
            activity.moving_time,
            activity.activity_type,
            activity.activity_subtype,
            activity.start_time_utc,
            activity.start_time_local,
            activity.location_raw,
            activity.route_encoding,
            activity.average_heartrate,
            activity.average_speed,
            activity.elevation_gain,
          ],
        )?;
        Ok(true)
      })
      .await?;

    if inserted { Ok(()) } else { Err(Error::DuplicateActivity(id)) }
  }

  /// Fetch one activity by id. Returns `None` if not found.
  pub async fn get_activity(&self, id: ActivityId) -> Result<Option<Activity>> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(
            conn
              .query_row(
                &format!("SELECT {ACTIVITY_COLUMNS} FROM activities WHERE run_id = ?1"),
                rusqlite::params![id.0],
                activity_from_row,
              )
              .optional()?,
          )
        })
        .await?,
    )
  }
}

// ─── ActivityStore impl ──────────────────────────────────────────────────────

impl ActivityStore for SqliteStore {
  type Error = Error;

  async fn locations(&self) -> Result<Vec<LocatedActivity>> {
    Ok(
      self
        .conn
        .call(|conn| {
          let mut stmt = conn.prepare(
            "SELECT run_id, name, location_country
             FROM activities
             WHERE location_country IS NOT NULL AND location_country != ''
             ORDER BY run_id",
          )?;
          let rows = stmt
            .query_map([], |row| {
              Ok(LocatedActivity {
                id:       ActivityId(row.get(0)?),
                name:     row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                location: row.get(2)?,
              })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?,
    )
  }

  async fn feed_activities(&self, min_distance: f64) -> Result<Vec<Activity>> {
    Ok(
      self
        .conn
        .call(move |conn| {
          let mut stmt = conn.prepare(&format!(
            "SELECT {ACTIVITY_COLUMNS}
             FROM activities
             WHERE distance > ?1
             ORDER BY start_date_local, run_id"
          ))?;
          let rows = stmt
            .query_map(rusqlite::params![min_distance], activity_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?,
    )
  }

  async fn update_locations(&self, updates: Vec<LocationUpdate>) -> Result<usize> {
    // Inner `Err` carries the first unknown id; the transaction is dropped
    // uncommitted in that case.
    let outcome: std::result::Result<usize, ActivityId> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "UPDATE activities SET location_country = ?1 WHERE run_id = ?2",
          )?;
          for update in &updates {
            if stmt.execute(rusqlite::params![update.new, update.id.0])? == 0 {
              return Ok(Err(update.id));
            }
          }
        }
        tx.commit()?;
        Ok(Ok(updates.len()))
      })
      .await?;

    outcome.map_err(Error::ActivityNotFound)
  }

  async fn location_histogram(&self) -> Result<Vec<LocationCount>> {
    Ok(
      self
        .conn
        .call(|conn| {
          let mut stmt = conn.prepare(
            "SELECT location_country, COUNT(*) AS n
             FROM activities
             WHERE location_country IS NOT NULL
             GROUP BY location_country
             ORDER BY n DESC, location_country",
          )?;
          let rows = stmt
            .query_map([], |row| {
              Ok(LocationCount {
                location: row.get(0)?,
                count:    count(row.get(1)?),
              })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?,
    )
  }

  async fn route_coverage(&self) -> Result<Vec<RouteCoverage>> {
    Ok(
      self
        .conn
        .call(|conn| {
          let mut stmt = conn.prepare(
            "SELECT
               location_country,
               COUNT(*) AS total,
               COUNT(CASE WHEN summary_polyline IS NOT NULL
                           AND summary_polyline != '' THEN 1 END) AS with_route,
               MIN(run_id) AS sample_id
             FROM activities
             WHERE location_country IS NOT NULL
             GROUP BY location_country
             ORDER BY total DESC, location_country",
          )?;
          let rows = stmt
            .query_map([], |row| {
              Ok(RouteCoverage {
                location:   row.get(0)?,
                total:      count(row.get(1)?),
                with_route: count(row.get(2)?),
                sample_id:  row.get::<_, Option<i64>>(3)?.map(ActivityId),
              })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?,
    )
  }
}
