//! Integration tests for `SqliteStore` against an in-memory database.

use trailmap_core::{
  activity::{Activity, ActivityId, LocationUpdate},
  feed::{MIN_DISTANCE, render_feed},
  location::CorrectionPass,
  pipeline::{correct_locations, export},
  store::ActivityStore,
  suffix::LocationTables,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn run(id: i64, start_local: &str, distance: f64, location: Option<&str>) -> Activity {
  Activity {
    id:                ActivityId(id),
    name:              format!("晨跑 {id}"),
    distance:          Some(distance),
    moving_time:       Some(1500.0),
    activity_type:     Some("Run".into()),
    activity_subtype:  None,
    start_time_utc:    start_local.into(),
    start_time_local:  start_local.into(),
    location_raw:      location.map(str::to_owned),
    route_encoding:    Some("u{~vFvyys@fS]".into()),
    average_heartrate: None,
    average_speed:     Some(3.1),
    elevation_gain:    None,
  }
}

async fn seeded(rows: Vec<Activity>) -> SqliteStore {
  let s = store().await;
  for row in rows {
    s.insert_activity(row).await.unwrap();
  }
  s
}

// ─── Rows ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_roundtrip() {
  let s = store().await;
  let a = run(1, "2024-01-01 06:00:00", 5000.0, Some("杭州:浙江"));
  s.insert_activity(a.clone()).await.unwrap();

  let fetched = s.get_activity(ActivityId(1)).await.unwrap();
  assert_eq!(fetched, Some(a));
}

#[tokio::test]
async fn get_missing_returns_none() {
  let s = store().await;
  assert!(s.get_activity(ActivityId(99)).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_insert_is_rejected() {
  let s = store().await;
  s.insert_activity(run(1, "2024-01-01 06:00:00", 1.0, None))
    .await
    .unwrap();
  let err = s
    .insert_activity(run(1, "2024-01-02 06:00:00", 1.0, None))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::DuplicateActivity(ActivityId(1))));
}

// ─── Reads ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn locations_skip_null_and_empty() {
  let s = seeded(vec![
    run(1, "2024-01-01 06:00:00", 1.0, Some("榆林")),
    run(2, "2024-01-02 06:00:00", 1.0, None),
    run(3, "2024-01-03 06:00:00", 1.0, Some("")),
    run(4, "2024-01-04 06:00:00", 1.0, Some("天津市,天津市,中国")),
  ])
  .await;

  let rows = s.locations().await.unwrap();
  let ids: Vec<i64> = rows.iter().map(|r| r.id.0).collect();
  assert_eq!(ids, vec![1, 4]);
  assert_eq!(rows[0].location, "榆林");
  assert_eq!(rows[0].name, "晨跑 1");
}

#[tokio::test]
async fn feed_activities_filter_and_order() {
  let s = seeded(vec![
    run(5, "2024-01-03 06:00:00", 3.0, None),
    run(1, "2024-01-01 06:00:00", 0.05, None),
    run(2, "2024-01-01 07:00:00", 0.11, None),
    run(4, "2024-01-02 06:00:00", 2.0, None),
    run(3, "2024-01-02 06:00:00", 2.0, None),
  ])
  .await;

  let rows = s.feed_activities(MIN_DISTANCE).await.unwrap();
  let ids: Vec<i64> = rows.iter().map(|r| r.id.0).collect();
  assert_eq!(ids, vec![2, 3, 4, 5]);
}

#[tokio::test]
async fn histogram_counts_and_orders() {
  let s = seeded(vec![
    run(1, "2024-01-01 06:00:00", 1.0, Some("杭州市,浙江省,中国")),
    run(2, "2024-01-02 06:00:00", 1.0, Some("杭州市,浙江省,中国")),
    run(3, "2024-01-03 06:00:00", 1.0, Some("榆林市,陕西省,中国")),
    run(4, "2024-01-04 06:00:00", 1.0, None),
  ])
  .await;

  let hist = s.location_histogram().await.unwrap();
  assert_eq!(hist.len(), 2);
  assert_eq!(hist[0].location, "杭州市,浙江省,中国");
  assert_eq!(hist[0].count, 2);
  assert_eq!(hist[1].count, 1);
}

#[tokio::test]
async fn route_coverage_per_location() {
  let mut no_route = run(2, "2024-01-02 06:00:00", 1.0, Some("杭州市,浙江省,中国"));
  no_route.route_encoding = Some(String::new());
  let mut null_route = run(3, "2024-01-03 06:00:00", 1.0, Some("杭州市,浙江省,中国"));
  null_route.route_encoding = None;

  let s = seeded(vec![
    run(1, "2024-01-01 06:00:00", 1.0, Some("杭州市,浙江省,中国")),
    no_route,
    null_route,
    run(4, "2024-01-04 06:00:00", 1.0, Some("榆林市,陕西省,中国")),
  ])
  .await;

  let cov = s.route_coverage().await.unwrap();
  assert_eq!(cov.len(), 2);
  assert_eq!(cov[0].total, 3);
  assert_eq!(cov[0].with_route, 1);
  assert_eq!(cov[0].without_route(), 2);
  assert_eq!(cov[0].sample_id, Some(ActivityId(1)));
  assert!((cov[1].percent() - 100.0).abs() < f64::EPSILON);
}

// ─── Legacy rows ─────────────────────────────────────────────────────────────

/// Rows in the shape older ingestion wrote: interval text durations and
/// missing names.
async fn seeded_legacy() -> SqliteStore {
  let s = store().await;
  s.conn
    .call(|conn| {
      conn.execute_batch(
        "INSERT INTO activities (run_id, name, distance, moving_time, start_date, start_date_local, location_country)
         VALUES
           (1, '晨跑', 5.0, '1970-01-01 00:30:00.000000', '2024-01-01 06:00:00', '2024-01-01 06:00:00', '杭州'),
           (2, NULL,   5.0, 1500,                         '2024-01-02 06:00:00', '2024-01-02 06:00:00', '榆林'),
           (3, '夜跑', 5.0, 'about an hour',              '2024-01-03 06:00:00', '2024-01-03 06:00:00', NULL),
           (4, NULL,   5.0, NULL,                         '2024-01-04 06:00:00', '2024-01-04 06:00:00', NULL);",
      )?;
      Ok(())
    })
    .await
    .unwrap();
  s
}

#[tokio::test]
async fn legacy_rows_decode_for_the_feed() {
  let s = seeded_legacy().await;

  let rows = s.feed_activities(MIN_DISTANCE).await.unwrap();
  let got: Vec<(i64, &str, Option<f64>)> = rows
    .iter()
    .map(|a| (a.id.0, a.name.as_str(), a.moving_time))
    .collect();
  assert_eq!(
    got,
    vec![
      (1, "晨跑", Some(1800.0)),
      (2, "", Some(1500.0)),
      (3, "夜跑", None),
      (4, "", None),
    ]
  );

  let records = export(&s).await.unwrap();
  assert_eq!(records.len(), 4);
  assert_eq!(records[3].streak, 4);
}

#[tokio::test]
async fn legacy_rows_are_corrected() {
  let s = seeded_legacy().await;

  let rows = s.locations().await.unwrap();
  assert_eq!(rows.len(), 2);
  assert_eq!(rows[1].name, "");

  let report = correct_locations(&s, &LocationTables::legacy(), CorrectionPass::All, false)
    .await
    .unwrap();
  assert_eq!(report.changes.len(), 2);
  let a = s.get_activity(ActivityId(2)).await.unwrap().unwrap();
  assert_eq!(a.location_raw.as_deref(), Some("榆林市,中国"));
  assert_eq!(a.moving_time, Some(1500.0));
}

// ─── Writes ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_locations_writes_all() {
  let s = seeded(vec![
    run(1, "2024-01-01 06:00:00", 1.0, Some("榆林")),
    run(2, "2024-01-02 06:00:00", 1.0, Some("杭州")),
  ])
  .await;

  let n = s
    .update_locations(vec![
      LocationUpdate { id: ActivityId(1), name: String::new(), old: "榆林".into(), new: "榆林,中国".into() },
      LocationUpdate { id: ActivityId(2), name: String::new(), old: "杭州".into(), new: "杭州,中国".into() },
    ])
    .await
    .unwrap();

  assert_eq!(n, 2);
  let a = s.get_activity(ActivityId(2)).await.unwrap().unwrap();
  assert_eq!(a.location_raw.as_deref(), Some("杭州,中国"));
}

#[tokio::test]
async fn unknown_id_rolls_back_batch() {
  let s = seeded(vec![run(1, "2024-01-01 06:00:00", 1.0, Some("榆林"))]).await;

  let err = s
    .update_locations(vec![
      LocationUpdate { id: ActivityId(1), name: String::new(), old: "榆林".into(), new: "榆林,中国".into() },
      LocationUpdate { id: ActivityId(7), name: String::new(), old: "x".into(), new: "x,中国".into() },
    ])
    .await
    .unwrap_err();

  assert!(matches!(err, Error::ActivityNotFound(ActivityId(7))));
  let a = s.get_activity(ActivityId(1)).await.unwrap().unwrap();
  assert_eq!(a.location_raw.as_deref(), Some("榆林"));
}

// ─── Pipeline end to end ─────────────────────────────────────────────────────

#[tokio::test]
async fn correction_then_export() {
  let s = seeded(vec![
    run(1, "2024-01-01 06:00:00", 5.0, Some("{'city': '呼和浩特', 'province': '内蒙古自治区', 'latitude': 40.8}")),
    run(2, "2024-01-02 06:30:00", 5.0, Some("杭州:浙江")),
    run(3, "2024-01-02 18:00:00", 5.0, Some("西安,陕西,中国")),
    run(4, "2024-01-03 06:00:00", 0.05, Some("榆林")),
    run(5, "2024-01-09 06:00:00", 5.0, None),
  ])
  .await;
  let tables = LocationTables::legacy();

  let report = correct_locations(&s, &tables, CorrectionPass::All, false)
    .await
    .unwrap();
  assert_eq!(report.scanned, 4);
  assert_eq!(report.changes.len(), 4);

  let again = correct_locations(&s, &tables, CorrectionPass::All, false)
    .await
    .unwrap();
  assert!(again.changes.is_empty());

  let records = export(&s).await.unwrap();
  let got: Vec<(i64, u32, Option<&str>)> = records
    .iter()
    .map(|r| (r.activity.id.0, r.streak, r.activity.location_raw.as_deref()))
    .collect();
  assert_eq!(
    got,
    vec![
      (1, 1, Some("呼和浩特市,内蒙古自治区,中国")),
      (2, 2, Some("杭州市,浙江省,中国")),
      (3, 2, Some("西安,陕西省,中国")),
      (5, 1, None),
    ]
  );

  let first = render_feed(&records).unwrap();
  let second = render_feed(&export(&s).await.unwrap()).unwrap();
  assert_eq!(first, second);
}

#[tokio::test]
async fn export_aborts_on_malformed_local_time() {
  let s = seeded(vec![
    run(1, "2024-01-01 06:00:00", 5.0, None),
    run(2, "2024-01-02", 5.0, None),
  ])
  .await;
  assert!(export(&s).await.is_err());
}
