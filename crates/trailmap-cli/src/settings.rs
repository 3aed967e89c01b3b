//! Layered settings: optional TOML file, then `TRAILMAP_*` environment
//! variables.

use std::{
  collections::BTreeMap,
  path::{Path, PathBuf},
};

use anyhow::Context as _;
use serde::Deserialize;
use trailmap_core::suffix::{AdminLevel, COUNTRY, LocationTables, SuffixTable};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub store_path:        PathBuf,
  pub feed_path:         PathBuf,
  pub country:           String,
  /// Start from the built-in legacy tables before adding the entries below.
  pub builtin_tables:    bool,
  pub city_suffixes:     BTreeMap<String, String>,
  pub province_suffixes: BTreeMap<String, String>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      store_path:        PathBuf::from("run_page/data.db"),
      feed_path:         PathBuf::from("src/static/activities.json"),
      country:           COUNTRY.to_owned(),
      builtin_tables:    true,
      city_suffixes:     BTreeMap::new(),
      province_suffixes: BTreeMap::new(),
    }
  }
}

impl Settings {
  /// Read `path` if it exists, then apply environment overrides.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("TRAILMAP"))
      .build()
      .context("failed to read config file")?;

    let mut settings: Settings = settings
      .try_deserialize()
      .context("failed to deserialise Settings")?;

    settings.store_path = expand_tilde(&settings.store_path);
    settings.feed_path = expand_tilde(&settings.feed_path);
    Ok(settings)
  }

  /// Build the normalizer tables. Configured entries and the country are
  /// validated; entries win over built-in ones.
  pub fn tables(&self) -> anyhow::Result<LocationTables> {
    let base = if self.builtin_tables {
      LocationTables::legacy()
    } else {
      LocationTables::empty()
    };

    let cities = SuffixTable::new(AdminLevel::City, self.city_suffixes.clone())
      .context("invalid city_suffixes entry")?;
    let provinces = SuffixTable::new(AdminLevel::Province, self.province_suffixes.clone())
      .context("invalid province_suffixes entry")?;

    let tables = LocationTables {
      cities:    base.cities.extend(&cities).context("city tables conflict")?,
      provinces: base.provinces.extend(&provinces).context("province tables conflict")?,
      ..base
    };
    tables.with_country(&self.country).context("invalid country")
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
