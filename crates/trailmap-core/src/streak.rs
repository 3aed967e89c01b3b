//! Consecutive-day streaks over a date-sorted activity sequence.
//!
//! The counter is a left fold: callers must feed dates in ascending order.
//! Several activities on one day share that day's streak value.

use chrono::NaiveDate;
use serde::Serialize;

/// Running fold state.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreakCounter {
  last_date: Option<NaiveDate>,
  streak:    u32,
}

impl StreakCounter {
  pub fn new() -> Self { Self::default() }

  /// Advance the fold by one activity date and return its streak value.
  pub fn push(&mut self, date: NaiveDate) -> u32 {
    self.streak = match self.last_date {
      None => 1,
      Some(last) if date == last => self.streak,
      Some(last) if last.succ_opt() == Some(date) => self.streak + 1,
      Some(_) => 1,
    };
    self.last_date = Some(date);
    self.streak
  }
}

/// Streak value for every element of `dates`, in order.
pub fn streaks<I>(dates: I) -> Vec<u32>
where
  I: IntoIterator<Item = NaiveDate>,
{
  let mut counter = StreakCounter::new();
  dates.into_iter().map(|d| counter.push(d)).collect()
}

/// Headline numbers for a finished fold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreakSummary {
  /// Streak at the last activity.
  pub current:     u32,
  pub longest:     u32,
  /// Distinct days with at least one activity.
  pub active_days: u32,
}

impl StreakSummary {
  pub fn from_dates<I>(dates: I) -> Self
  where
    I: IntoIterator<Item = NaiveDate>,
  {
    let mut counter = StreakCounter::new();
    let mut summary = Self::default();
    let mut last = None;

    for date in dates {
      summary.current = counter.push(date);
      summary.longest = summary.longest.max(summary.current);
      if last != Some(date) {
        summary.active_days += 1;
        last = Some(date);
      }
    }
    summary
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(s: &str) -> NaiveDate { s.parse().unwrap() }

  #[test]
  fn same_day_repeats_and_gap_reset() {
    let dates = ["2024-01-01", "2024-01-01", "2024-01-02", "2024-01-05"].map(d);
    assert_eq!(streaks(dates), vec![1, 1, 2, 1]);
  }

  #[test]
  fn unbroken_run_counts_up() {
    let start = d("2023-12-29");
    let dates = (0..7).map(|i| start + chrono::Days::new(i));
    assert_eq!(streaks(dates), vec![1, 2, 3, 4, 5, 6, 7]);
  }

  #[test]
  fn gap_after_k_resets_to_one() {
    let dates = ["2024-02-27", "2024-02-28", "2024-02-29", "2024-03-02", "2024-03-03"].map(d);
    assert_eq!(streaks(dates), vec![1, 2, 3, 1, 2]);
  }

  #[test]
  fn same_day_entries_share_first_value() {
    let dates = ["2024-01-01", "2024-01-02", "2024-01-02", "2024-01-02", "2024-01-03"].map(d);
    assert_eq!(streaks(dates), vec![1, 2, 2, 2, 3]);
  }

  #[test]
  fn empty_sequence() {
    assert!(streaks(std::iter::empty()).is_empty());
    assert_eq!(StreakSummary::from_dates(std::iter::empty()), StreakSummary::default());
  }

  #[test]
  fn out_of_order_input_resets() {
    // Not meaningful, but must not panic or underflow.
    let dates = ["2024-01-05", "2024-01-04"].map(d);
    assert_eq!(streaks(dates), vec![1, 1]);
  }

  #[test]
  fn summary_tracks_longest_and_days() {
    let dates = [
      "2024-01-01", "2024-01-02", "2024-01-02", "2024-01-03", "2024-01-10", "2024-01-11",
    ]
    .map(d);
    assert_eq!(
      StreakSummary::from_dates(dates),
      StreakSummary { current: 2, longest: 3, active_days: 5 }
    );
  }
}
