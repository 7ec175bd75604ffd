//! The root file set handed to the script compiler.

use crate::path::is_mixed_content;
use ahash::HashSet;
use tracing::debug;

/// Ordered, append-only list of compilation roots.
#[derive(Clone, Debug, Default)]
pub struct RootFileSet {
  files: Vec<String>,
  seen: HashSet<String>,
}

impl RootFileSet {
  /// Seed the set with statically configured roots, keeping their order and
  /// dropping duplicates.
  pub fn new(initial: impl IntoIterator<Item = String>) -> Self {
    let mut set = Self::default();
    for path in initial {
      set.push(path);
    }
    set
  }

  /// Append `path` if it names a mixed-content document that is not a root
  /// yet. Returns whether the set grew.
  pub fn ensure_tracked(&mut self, path: &str) -> bool {
    if !is_mixed_content(path) || self.seen.contains(path) {
      return false;
    }
    self.push(path.to_string());
    debug!(path, roots = self.files.len(), "root file set grew");
    true
  }

  fn push(&mut self, path: String) {
    if self.seen.insert(path.clone()) {
      self.files.push(path);
    }
  }

  pub fn contains(&self, path: &str) -> bool {
    self.seen.contains(path)
  }

  pub fn as_slice(&self) -> &[String] {
    &self.files
  }

  pub fn len(&self) -> usize {
    self.files.len()
  }

  pub fn is_empty(&self) -> bool {
    self.files.is_empty()
  }
}
