//! Human-readable operator output on stdout.

use trailmap_core::{
  feed::{ExportRecord, FeedStats},
  pipeline::CorrectionReport,
  store::{LocationCount, RouteCoverage},
  streak::StreakSummary,
};

const RULE: &str = "================================================================================";
const THIN: &str = "--------------------------------------------------------------------------------";

pub fn corrections(report: &CorrectionReport) {
  println!("{RULE}");
  for change in &report.changes {
    println!("activity {} ({}):", change.id, change.name);
    println!("  old: {}", change.old);
    println!("  new: {}", change.new);
  }
  println!("{RULE}");
  if report.applied {
    println!("updated:   {}", report.changes.len());
  } else {
    println!("pending:   {} (not written)", report.changes.len());
  }
  println!("unchanged: {}", report.unchanged());
  println!("scanned:   {}", report.scanned);
}

pub fn histogram(rows: &[LocationCount]) {
  println!("\nlocation distribution:");
  println!("{THIN}");
  for row in rows {
    println!("{}: {}", row.location, row.count);
  }
}

pub fn export(records: &[ExportRecord], summary: &StreakSummary, path: &str) {
  println!("wrote {} activities to {path}", records.len());
  println!(
    "streak: current {} / longest {} / {} active days",
    summary.current, summary.longest, summary.active_days
  );

  println!("\nsample locations:");
  for (i, (r, loc)) in sample_locations(records).into_iter().enumerate() {
    println!("  {}. [{}] {}: {loc}", i + 1, r.activity.id, r.activity.name);
  }
}

/// Located entries among the first ten records.
fn sample_locations(records: &[ExportRecord]) -> Vec<(&ExportRecord, &str)> {
  records
    .iter()
    .take(10)
    .filter_map(|r| {
      let loc = r.activity.location_raw.as_deref().filter(|l| !l.is_empty())?;
      Some((r, loc))
    })
    .collect()
}

pub fn stats(stats: &FeedStats) {
  println!("{RULE}");
  println!("countries: {}", stats.countries.len());
  println!("  {}", join(&stats.countries));
  println!("provinces: {}", stats.provinces.len());
  println!("  {}", join(&stats.provinces));
  println!("cities: {}", stats.cities.len());
  for (city, n) in stats.cities_by_count() {
    println!("  {city}: {n}");
  }
  println!("activities: {}", stats.activities);
  println!("{RULE}");
}

pub fn coverage(rows: &[RouteCoverage]) {
  println!("{RULE}");
  println!(
    "{:<35} {:>8} {:>10} {:>10} {:>9} {:>8}",
    "location", "total", "route", "no route", "coverage", "sample"
  );
  println!("{THIN}");
  for row in rows {
    let sample = row.sample_id.map(|id| id.to_string()).unwrap_or_default();
    println!(
      "{:<35} {:>8} {:>10} {:>10} {:>8.1}% {:>8}",
      row.location,
      row.total,
      row.with_route,
      row.without_route(),
      row.percent(),
      sample
    );
  }
  println!("{RULE}");
}

fn join<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
  items.into_iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
