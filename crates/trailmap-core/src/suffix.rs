//! Suffix tables: short administrative names mapped to their suffixed form.
//!
//! The map front end finds cities and provinces by matching on their
//! administrative suffix, so a bare "杭州" is invisible to it while "杭州市"
//! is not. These tables hold the known exceptions in the legacy data. They
//! only ever add a suffix; names not in a table pass through untouched.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Suffixes the front end accepts at the city position.
pub const CITY_SUFFIXES: &[&str] = &["市", "自治州", "特别行政区", "盟", "地区"];

/// Suffixes the front end accepts at the province position. Municipalities
/// ("天津市") are both city and province.
pub const PROVINCE_SUFFIXES: &[&str] = &["省", "自治区", "市"];

/// Markers that make a bare single-token location read as a province.
pub const PROVINCE_MARKERS: &[&str] = &["省", "自治区"];

/// The one country the legacy data covers.
pub const COUNTRY: &str = "中国";

/// A trailing segment containing this character is taken to be a country.
pub const COUNTRY_MARKER: char = '国';

// ─── Administrative level ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminLevel {
  City,
  Province,
}

impl AdminLevel {
  pub fn suffixes(self) -> &'static [&'static str] {
    match self {
      AdminLevel::City => CITY_SUFFIXES,
      AdminLevel::Province => PROVINCE_SUFFIXES,
    }
  }

  pub fn has_suffix(self, name: &str) -> bool {
    self.suffixes().iter().any(|s| name.ends_with(s))
  }
}

impl fmt::Display for AdminLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      AdminLevel::City => f.write_str("city"),
      AdminLevel::Province => f.write_str("province"),
    }
  }
}

// ─── Table ───────────────────────────────────────────────────────────────────

/// Exact-match lookup from a short name to its canonical suffixed name.
///
/// Entries are kept in key order, which is also the order the province pass
/// tries them in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixTable {
  level:   AdminLevel,
  entries: BTreeMap<String, String>,
}

impl SuffixTable {
  /// An empty table: every name passes through.
  pub fn empty(level: AdminLevel) -> Self {
    Self { level, entries: BTreeMap::new() }
  }

  /// Build a table, rejecting entries that would break idempotence.
  ///
  /// Every canonical value must carry one of the level's suffixes, neither
  /// side may contain a segment separator, and no canonical value may itself
  /// be a key that maps somewhere else.
  pub fn new<I, K, V>(level: AdminLevel, pairs: I) -> Result<Self>
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    let entries: BTreeMap<String, String> = pairs
      .into_iter()
      .map(|(k, v)| (k.into().trim().to_owned(), v.into().trim().to_owned()))
      .collect();

    for (short, canonical) in &entries {
      let reject = |reason| Error::InvalidSuffixEntry {
        level,
        short: short.clone(),
        canonical: canonical.clone(),
        reason,
      };

      if short.is_empty() {
        return Err(reject("short name is empty"));
      }
      if has_separator(short) || has_separator(canonical) {
        return Err(reject("names may not contain ',' or ':'"));
      }
      if !level.has_suffix(canonical) {
        return Err(reject("canonical name lacks a recognised suffix"));
      }
      if let Some(next) = entries.get(canonical)
        && next != canonical
      {
        return Err(reject("canonical name is itself remapped"));
      }
    }

    Ok(Self { level, entries })
  }

  pub fn level(&self) -> AdminLevel { self.level }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  /// Canonical form of `name`, if it is a known exception.
  pub fn lookup(&self, name: &str) -> Option<&str> {
    self.entries.get(name.trim()).map(String::as_str)
  }

  /// Canonical form of `name`, or `name` unchanged.
  pub fn apply<'a>(&'a self, name: &'a str) -> &'a str {
    self.lookup(name).unwrap_or(name)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  /// Merge `other` into this table; `other` wins on conflicting keys.
  pub fn extend(&self, other: &SuffixTable) -> Result<Self> {
    let merged = self
      .iter()
      .chain(other.iter())
      .map(|(k, v)| (k.to_owned(), v.to_owned()))
      .collect::<BTreeMap<_, _>>();
    Self::new(self.level, merged)
  }
}

fn has_separator(name: &str) -> bool { name.contains([',', ':']) }

// ─── Bundle ──────────────────────────────────────────────────────────────────

/// Everything the normalizer needs to know about the naming convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationTables {
  pub country:        String,
  pub country_marker: char,
  pub cities:         SuffixTable,
  pub provinces:      SuffixTable,
}

impl LocationTables {
  /// No suffix exceptions; only the country convention.
  pub fn empty() -> Self {
    Self {
      country:        COUNTRY.to_owned(),
      country_marker: COUNTRY_MARKER,
      cities:         SuffixTable::empty(AdminLevel::City),
      provinces:      SuffixTable::empty(AdminLevel::Province),
    }
  }

  /// The exceptions found in the legacy activity data.
  pub fn legacy() -> Self {
    let cities = ["呼和浩特", "杭州", "天津", "石家庄", "榆林", "鄂尔多斯"]
      .into_iter()
      .map(|c| (c.to_owned(), format!("{c}市")))
      .collect();
    let provinces = ["浙江", "河北", "陕西"]
      .into_iter()
      .map(|p| (p.to_owned(), format!("{p}省")))
      .collect();

    Self {
      cities: SuffixTable { level: AdminLevel::City, entries: cities },
      provinces: SuffixTable { level: AdminLevel::Province, entries: provinces },
      ..Self::empty()
    }
  }

  /// Replace the country literal.
  ///
  /// The literal is appended as the trailing segment, so it must itself read
  /// as a country on the next pass: non-empty, free of separators, and either
  /// carrying the country marker or longer than one character.
  pub fn with_country(self, country: &str) -> Result<Self> {
    let country = country.trim();
    let reject = |reason| Error::InvalidCountry { value: country.to_owned(), reason };

    if country.is_empty() {
      return Err(reject("country is empty"));
    }
    if has_separator(country) {
      return Err(reject("country may not contain ',' or ':'"));
    }
    if !country.contains(self.country_marker) && country.chars().count() < 2 {
      return Err(reject("a single character without the country marker is not a country"));
    }

    Ok(Self { country: country.to_owned(), ..self })
  }
}

impl Default for LocationTables {
  fn default() -> Self { Self::legacy() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn legacy_tables_pass_validation() {
    let legacy = LocationTables::legacy();
    let cities = SuffixTable::new(
      AdminLevel::City,
      legacy.cities.iter().map(|(k, v)| (k.to_owned(), v.to_owned())),
    )
    .unwrap();
    let provinces = SuffixTable::new(
      AdminLevel::Province,
      legacy.provinces.iter().map(|(k, v)| (k.to_owned(), v.to_owned())),
    )
    .unwrap();
    assert_eq!(cities, legacy.cities);
    assert_eq!(provinces, legacy.provinces);
    assert_eq!(legacy.cities.len(), 6);
    assert_eq!(legacy.provinces.len(), 3);
  }

  #[test]
  fn lookup_is_exact_after_trim() {
    let t = LocationTables::legacy().cities;
    assert_eq!(t.lookup("杭州"), Some("杭州市"));
    assert_eq!(t.lookup(" 杭州 "), Some("杭州市"));
    assert_eq!(t.lookup("杭州市"), None);
    assert_eq!(t.lookup("杭"), None);
  }

  #[test]
  fn apply_passes_unknown_names_through() {
    let t = LocationTables::legacy().cities;
    assert_eq!(t.apply("西安"), "西安");
    assert_eq!(t.apply("天津"), "天津市");
  }

  #[test]
  fn rejects_canonical_without_suffix() {
    let err = SuffixTable::new(AdminLevel::Province, [("浙江", "浙江")]).unwrap_err();
    assert!(matches!(err, Error::InvalidSuffixEntry { level: AdminLevel::Province, .. }));
  }

  #[test]
  fn rejects_chained_entries() {
    let err = SuffixTable::new(
      AdminLevel::City,
      [("杭", "杭州市"), ("杭州市", "杭州市区市")],
    )
    .unwrap_err();
    match err {
      Error::InvalidSuffixEntry { short, .. } => assert_eq!(short, "杭"),
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[test]
  fn rejects_empty_short_name() {
    assert!(SuffixTable::new(AdminLevel::City, [("  ", "某市")]).is_err());
  }

  #[test]
  fn rejects_separators_in_entries() {
    for (short, canonical) in [("杭州", "杭州,市"), ("杭州", "杭州:市"), ("杭,州", "杭州市")] {
      let err = SuffixTable::new(AdminLevel::City, [(short, canonical)]).unwrap_err();
      assert!(
        matches!(err, Error::InvalidSuffixEntry { ref reason, .. } if reason.contains("','")),
        "{short} -> {canonical}: {err}"
      );
    }
  }

  #[test]
  fn country_must_read_as_a_country() {
    let t = LocationTables::legacy().with_country(" 中华人民共和国 ").unwrap();
    assert_eq!(t.country, "中华人民共和国");
    assert_eq!(LocationTables::empty().with_country("国").unwrap().country, "国");

    for bad in ["", "  ", "X", "中,国", "中:国"] {
      let err = LocationTables::legacy().with_country(bad).unwrap_err();
      assert!(matches!(err, Error::InvalidCountry { .. }), "{bad:?}");
    }
  }

  #[test]
  fn municipality_is_a_valid_province() {
    let t = SuffixTable::new(AdminLevel::Province, [("天津", "天津市")]).unwrap();
    assert_eq!(t.apply("天津"), "天津市");
    assert_eq!(t.level(), AdminLevel::Province);
  }

  #[test]
  fn extend_overrides_and_revalidates() {
    let base = LocationTables::legacy().cities;
    let extra = SuffixTable::new(AdminLevel::City, [("西安", "西安市")]).unwrap();
    let merged = base.extend(&extra).unwrap();
    assert_eq!(merged.len(), 7);
    assert_eq!(merged.apply("西安"), "西安市");
    assert_eq!(merged.apply("榆林"), "榆林市");
  }

  #[test]
  fn level_suffix_sets() {
    assert!(AdminLevel::City.has_suffix("锡林郭勒盟"));
    assert!(AdminLevel::City.has_suffix("香港特别行政区"));
    assert!(!AdminLevel::City.has_suffix("内蒙古自治区"));
    assert!(AdminLevel::Province.has_suffix("内蒙古自治区"));
    assert!(AdminLevel::Province.has_suffix("北京市"));
    assert!(!AdminLevel::Province.has_suffix("陕西"));
  }
}
