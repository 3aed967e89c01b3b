//! The `ActivityStore` trait and the row shapes it returns.
//!
//! Implemented by storage backends (e.g. `trailmap-store-sqlite`). The
//! pipeline depends on this abstraction only; connection lifecycle and schema
//! belong to the backend.

use std::future::Future;

use serde::Serialize;

use crate::activity::{Activity, ActivityId, LocationUpdate};

/// One row that carries a non-empty location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedActivity {
  pub id:       ActivityId,
  pub name:     String,
  pub location: String,
}

/// How many activities share one stored location string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationCount {
  pub location: String,
  pub count:    u64,
}

/// Route (polyline) availability for one stored location string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteCoverage {
  pub location:   String,
  pub total:      u64,
  pub with_route: u64,
  /// A sample activity at this location, for eyeballing.
  pub sample_id:  Option<ActivityId>,
}

impl RouteCoverage {
  pub fn without_route(&self) -> u64 { self.total - self.with_route }

  /// Share of activities with a route, in percent.
  pub fn percent(&self) -> f64 {
    if self.total == 0 {
      0.0
    } else {
      self.with_route as f64 / self.total as f64 * 100.0
    }
  }
}

/// Abstraction over an activity store backend.
///
/// Rows are created elsewhere. This side reads them and rewrites the location
/// column only; nothing is ever deleted.
pub trait ActivityStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every activity whose location is non-null and non-empty, by id.
  fn locations(
    &self,
  ) -> impl Future<Output = Result<Vec<LocatedActivity>, Self::Error>> + Send + '_;

  /// Activities with `distance > min_distance`, ascending by
  /// `start_date_local` then id.
  fn feed_activities(
    &self,
    min_distance: f64,
  ) -> impl Future<Output = Result<Vec<Activity>, Self::Error>> + Send + '_;

  /// Write new locations by id in a single transaction. Fails, and writes
  /// nothing, if any id is unknown. Returns the number of rows updated.
  fn update_locations(
    &self,
    updates: Vec<LocationUpdate>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Non-null locations with their activity counts, most frequent first.
  fn location_histogram(
    &self,
  ) -> impl Future<Output = Result<Vec<LocationCount>, Self::Error>> + Send + '_;

  /// Route coverage per non-null location, most frequent first.
  fn route_coverage(
    &self,
  ) -> impl Future<Output = Result<Vec<RouteCoverage>, Self::Error>> + Send + '_;
}
