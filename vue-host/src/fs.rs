//! Filesystem abstraction for every fallback read the host performs.
//!
//! The host never writes. Any read failure is reported as "no such file" so
//! callers can treat it as empty content.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Read-only filesystem view used for files that are not open in the editor.
pub trait HostFs {
  /// Return true if the path points to a file.
  fn is_file(&self, path: &str) -> bool;
  /// Return true if the path points to a directory.
  fn is_dir(&self, path: &str) -> bool;
  /// Read a UTF-8 file. Any failure is `None`.
  fn read_to_string(&self, path: &str) -> Option<String>;
}

/// Real filesystem adapter.
#[derive(Clone, Copy, Debug, Default)]
pub struct RealFs;

impl HostFs for RealFs {
  fn is_file(&self, path: &str) -> bool {
    std::fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
  }

  fn is_dir(&self, path: &str) -> bool {
    std::fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
  }

  fn read_to_string(&self, path: &str) -> Option<String> {
    std::fs::read_to_string(path).ok()
  }
}

/// In-memory filesystem keyed by normalised path. Clones share storage, so a
/// test can keep a handle and edit "disk" after handing one to the host.
#[derive(Clone, Debug, Default)]
pub struct MemoryFs {
  files: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryFs {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&self, path: &str, text: impl Into<String>) {
    self
      .files
      .write()
      .insert(crate::path::normalize_path_str(path), text.into());
  }

  pub fn remove(&self, path: &str) {
    self
      .files
      .write()
      .remove(&crate::path::normalize_path_str(path));
  }
}

impl HostFs for MemoryFs {
  fn is_file(&self, path: &str) -> bool {
    self.files.read().contains_key(path)
  }

  fn is_dir(&self, path: &str) -> bool {
    let mut prefix = path.trim_end_matches('/').to_string();
    prefix.push('/');
    self
      .files
      .read()
      .range(prefix.clone()..)
      .next()
      .is_some_and(|(key, _)| key.starts_with(&prefix))
  }

  fn read_to_string(&self, path: &str) -> Option<String> {
    self.files.read().get(path).cloned()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn memory_fs_tracks_files_and_directories() {
    let fs = MemoryFs::new();
    fs.insert("/proj/src/a.vue", "<script></script>");
    assert!(fs.is_file("/proj/src/a.vue"));
    assert!(fs.is_dir("/proj/src"));
    assert!(fs.is_dir("/proj"));
    assert!(!fs.is_dir("/proj/sr"));
    assert!(!fs.is_file("/proj/src"));
    assert_eq!(
      fs.read_to_string("/proj/src/a.vue").as_deref(),
      Some("<script></script>")
    );
    fs.remove("/proj/src/a.vue");
    assert!(fs.read_to_string("/proj/src/a.vue").is_none());
  }
}
