//! SQL schema for the activity store.
//!
//! Executed once at connection startup. Column names match the feed contract
//! so the table can be inspected next to the exported JSON.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS activities (
    run_id            INTEGER PRIMARY KEY,
    name              TEXT DEFAULT '',
    distance          REAL,
    moving_time       REAL,            -- seconds; older rows hold interval text
    type              TEXT,
    subtype           TEXT,
    start_date        TEXT NOT NULL,   -- UTC, 'YYYY-MM-DD HH:MM:SS'
    start_date_local  TEXT NOT NULL,   -- local, same format; feed order key
    location_country  TEXT,            -- any legacy location shape, or NULL
    summary_polyline  TEXT,
    average_heartrate REAL,
    average_speed     REAL,
    elevation_gain    REAL
);

CREATE INDEX IF NOT EXISTS activities_local_idx    ON activities(start_date_local);
CREATE INDEX IF NOT EXISTS activities_location_idx ON activities(location_country);

PRAGMA user_version = 1;
";
