//! Reading and replacing the JSON feed file.

use std::{
  fs,
  io::{self, Write as _},
  path::{Path, PathBuf},
};

use anyhow::Context as _;
use serde::Deserialize;

/// Replace `path` with `bytes` via a temporary sibling and a rename, so a
/// reader never sees a half-written feed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    fs::create_dir_all(parent)?;
  }

  let tmp = temp_sibling(path);
  let result = (|| {
    let mut file = fs::File::create(&tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    fs::rename(&tmp, path)
  })();

  if result.is_err() {
    let _ = fs::remove_file(&tmp);
  }
  result
}

fn temp_sibling(path: &Path) -> PathBuf {
  let mut name = path.file_name().unwrap_or_default().to_os_string();
  name.push(".tmp");
  path.with_file_name(name)
}

/// The one field the stats report needs from each feed entry.
#[derive(Debug, Deserialize)]
struct FeedEntry {
  #[serde(default)]
  location_country: Option<String>,
}

/// Location of every entry in an existing feed file.
pub fn read_feed_locations(path: &Path) -> anyhow::Result<Vec<Option<String>>> {
  let raw = fs::read(path).with_context(|| format!("reading feed {}", path.display()))?;
  let entries: Vec<FeedEntry> =
    serde_json::from_slice(&raw).with_context(|| format!("parsing feed {}", path.display()))?;
  Ok(entries.into_iter().map(|e| e.location_country).collect())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn writes_and_replaces_without_leftovers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("static").join("activities.json");

    write_atomic(&path, "[1]".as_bytes()).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "[1]");

    write_atomic(&path, "[\"杭州市\"]".as_bytes()).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "[\"杭州市\"]");

    let names: Vec<_> = fs::read_dir(path.parent().unwrap())
      .unwrap()
      .map(|e| e.unwrap().file_name())
      .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("activities.json")]);
  }

  #[test]
  fn failed_write_keeps_previous_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("activities.json");
    write_atomic(&path, b"[]").unwrap();

    // A directory squatting on the temp name makes the write fail.
    fs::create_dir(temp_sibling(&path)).unwrap();
    assert!(write_atomic(&path, b"[1,2]").is_err());
    assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
  }

  #[test]
  fn reads_locations_from_feed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("activities.json");
    fs::write(
      &path,
      r#"[{"run_id":1,"location_country":"榆林市,陕西省,中国","streak":1},
          {"run_id":2,"location_country":null},
          {"run_id":3}]"#,
    )
    .unwrap();

    let locations = read_feed_locations(&path).unwrap();
    assert_eq!(
      locations,
      vec![Some("榆林市,陕西省,中国".to_owned()), None, None]
    );
  }

  #[test]
  fn unreadable_feed_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(read_feed_locations(&dir.path().join("missing.json")).is_err());
  }
}
