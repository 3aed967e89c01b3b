//! The derived activity feed the map front end loads.
//!
//! The feed is a single JSON array, regenerated in full on every run.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
  Result,
  activity::Activity,
  streak::{StreakCounter, StreakSummary},
};

/// Activities at or below this distance are left out of the feed.
pub const MIN_DISTANCE: f64 = 0.1;

/// An activity plus its running streak.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRecord {
  #[serde(flatten)]
  pub activity:   Activity,
  pub streak:     u32,
  #[serde(skip)]
  pub local_date: NaiveDate,
}

/// Select, order, and annotate activities for the feed.
///
/// Keeps activities with `distance > MIN_DISTANCE`, orders them by
/// `start_date_local` (ties by id) and attaches streaks. The first
/// unparseable `start_date_local` aborts the whole build.
pub fn build_feed(activities: Vec<Activity>) -> Result<Vec<ExportRecord>> {
  let mut selected: Vec<Activity> = activities
    .into_iter()
    .filter(|a| a.distance.is_some_and(|d| d > MIN_DISTANCE))
    .collect();

  selected.sort_by(|a, b| {
    a.start_time_local
      .cmp(&b.start_time_local)
      .then(a.id.cmp(&b.id))
  });

  let mut counter = StreakCounter::new();
  selected
    .into_iter()
    .map(|activity| -> Result<ExportRecord> {
      let local_date = activity.local_date()?;
      let streak = counter.push(local_date);
      Ok(ExportRecord { activity, streak, local_date })
    })
    .collect()
}

/// Serialise the feed as compact UTF-8 JSON. Non-ASCII text is written as-is.
pub fn render_feed(records: &[ExportRecord]) -> Result<Vec<u8>> {
  Ok(serde_json::to_vec(records)?)
}

/// Streak headline numbers for a built feed.
pub fn summarize(records: &[ExportRecord]) -> StreakSummary {
  StreakSummary::from_dates(records.iter().map(|r| r.local_date))
}

// ─── Location statistics ─────────────────────────────────────────────────────

/// City, province, and country distribution over canonical feed locations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedStats {
  pub activities: usize,
  pub countries:  BTreeSet<String>,
  pub provinces:  BTreeSet<String>,
  pub cities:     BTreeMap<String, usize>,
}

impl FeedStats {
  /// Tally locations. Only three-segment values contribute to the
  /// breakdown; every entry counts toward `activities`.
  pub fn from_locations<'a, I>(locations: I) -> Self
  where
    I: IntoIterator<Item = Option<&'a str>>,
  {
    let mut stats = Self::default();

    for location in locations {
      stats.activities += 1;
      let Some(location) = location else { continue };

      let parts: Vec<&str> = location.split(',').map(str::trim).collect();
      let [city, province, country, ..] = parts.as_slice() else {
        continue;
      };

      if !city.is_empty() {
        *stats.cities.entry((*city).to_owned()).or_default() += 1;
      }
      if !province.is_empty() {
        stats.provinces.insert((*province).to_owned());
      }
      if !country.is_empty() {
        stats.countries.insert((*country).to_owned());
      }
    }

    stats
  }

  /// Cities ordered by activity count, most first; ties by name.
  pub fn cities_by_count(&self) -> Vec<(&str, usize)> {
    let mut cities: Vec<_> = self.cities.iter().map(|(c, n)| (c.as_str(), *n)).collect();
    cities.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    cities
  }
}
