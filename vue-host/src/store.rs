//! Version Store: the host's in-memory, versioned view of every tracked file.

use crate::dialect::Dialect;
use ahash::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Version reported for files the store has never seen.
pub const UNTRACKED_VERSION: u64 = 0;

/// A textual edit between two consecutive versions of a file, in the same
/// shape the parser's incremental path consumes: the old text's
/// `start..old_end` was replaced by the new text's `start..new_end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextChange {
  pub start: usize,
  pub old_end: usize,
  pub new_end: usize,
}

impl TextChange {
  /// Smallest single edit turning `old` into `new` (common prefix and suffix
  /// are excluded). Identical texts produce an empty change at their end.
  pub fn between(old: &str, new: &str) -> TextChange {
    let old_bytes = old.as_bytes();
    let new_bytes = new.as_bytes();
    let mut start = old_bytes
      .iter()
      .zip(new_bytes)
      .take_while(|(a, b)| a == b)
      .count();
    while !old.is_char_boundary(start) || !new.is_char_boundary(start) {
      start -= 1;
    }
    let max_suffix = old_bytes.len().min(new_bytes.len()) - start;
    let mut suffix = old_bytes
      .iter()
      .rev()
      .zip(new_bytes.iter().rev())
      .take(max_suffix)
      .take_while(|(a, b)| a == b)
      .count();
    while !old.is_char_boundary(old_bytes.len() - suffix)
      || !new.is_char_boundary(new_bytes.len() - suffix)
    {
      suffix -= 1;
    }
    TextChange {
      start,
      old_end: old_bytes.len() - suffix,
      new_end: new_bytes.len() - suffix,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.start == self.old_end && self.start == self.new_end
  }
}

/// How a file first came to be tracked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileOrigin {
  /// Opened (and possibly edited) in the editor.
  Editor,
  /// Discovered as an import target and read from disk.
  Resolution,
}

#[derive(Clone, Debug)]
pub struct TrackedFile {
  pub path: String,
  pub text: Arc<str>,
  pub version: u64,
  pub dialect: Dialect,
  pub origin: FileOrigin,
  /// Edit that produced `version` from `version - 1`.
  pub last_change: Option<TextChange>,
}

/// Result of [`VersionStore::update`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreUpdate {
  pub version: u64,
  pub dialect: Dialect,
  pub previous_dialect: Option<Dialect>,
}

impl StoreUpdate {
  /// The file was already tracked under a different dialect.
  pub fn dialect_changed(&self) -> bool {
    self
      .previous_dialect
      .is_some_and(|previous| previous != self.dialect)
  }
}

#[derive(Debug, Default)]
pub struct VersionStore {
  files: HashMap<String, TrackedFile>,
}

impl VersionStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record new text for `path`. Every call bumps the version, even when the
  /// text is unchanged.
  pub fn update(&mut self, path: &str, text: Arc<str>, dialect: Dialect) -> StoreUpdate {
    match self.files.get_mut(path) {
      Some(file) => {
        let previous_dialect = file.dialect;
        file.last_change = Some(TextChange::between(&file.text, &text));
        file.text = text;
        file.version += 1;
        file.dialect = dialect;
        file.origin = FileOrigin::Editor;
        debug!(path, version = file.version, %dialect, "tracked file updated");
        StoreUpdate {
          version: file.version,
          dialect,
          previous_dialect: Some(previous_dialect),
        }
      }
      None => {
        self.insert(path, text, dialect, FileOrigin::Editor);
        StoreUpdate {
          version: 1,
          dialect,
          previous_dialect: None,
        }
      }
    }
  }

  /// Track `path` with disk-derived content if it is not tracked yet. An
  /// existing entry is returned untouched: the editor's view always wins.
  pub fn observe(
    &mut self,
    path: &str,
    load: impl FnOnce() -> (Arc<str>, Dialect),
  ) -> &TrackedFile {
    if !self.files.contains_key(path) {
      let (text, dialect) = load();
      debug!(path, %dialect, "tracking file discovered through resolution");
      self.insert(path, text, dialect, FileOrigin::Resolution);
    }
    &self.files[path]
  }

  fn insert(&mut self, path: &str, text: Arc<str>, dialect: Dialect, origin: FileOrigin) {
    self.files.insert(path.to_string(), TrackedFile {
      path: path.to_string(),
      text,
      version: 1,
      dialect,
      origin,
      last_change: None,
    });
  }

  pub fn get(&self, path: &str) -> Option<&TrackedFile> {
    self.files.get(path)
  }

  pub fn contains(&self, path: &str) -> bool {
    self.files.contains_key(path)
  }

  /// Current version, or [`UNTRACKED_VERSION`].
  pub fn version(&self, path: &str) -> u64 {
    self
      .files
      .get(path)
      .map_or(UNTRACKED_VERSION, |file| file.version)
  }

  pub fn dialect(&self, path: &str) -> Option<Dialect> {
    self.files.get(path).map(|file| file.dialect)
  }

  /// The edit from `since_version` to the current version, if exactly one
  /// update separates them.
  pub fn change_since(&self, path: &str, since_version: u64) -> Option<TextChange> {
    let file = self.files.get(path)?;
    if file.version != since_version + 1 {
      return None;
    }
    file.last_change
  }

  pub fn len(&self) -> usize {
    self.files.len()
  }

  pub fn is_empty(&self) -> bool {
    self.files.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn versions_strictly_increase_even_for_identical_text() {
    let mut store = VersionStore::new();
    assert_eq!(store.version("/a.vue"), UNTRACKED_VERSION);
    let text: Arc<str> = Arc::from("let a = 1;");
    assert_eq!(store.update("/a.vue", text.clone(), Dialect::Js).version, 1);
    assert_eq!(store.update("/a.vue", text.clone(), Dialect::Js).version, 2);
    assert_eq!(store.update("/a.vue", text, Dialect::Js).version, 3);
    assert_eq!(store.version("/a.vue"), 3);
  }

  #[test]
  fn reports_dialect_changes_only_for_tracked_files() {
    let mut store = VersionStore::new();
    let first = store.update("/a.vue", Arc::from(""), Dialect::Js);
    assert!(!first.dialect_changed());
    let same = store.update("/a.vue", Arc::from("x"), Dialect::Js);
    assert!(!same.dialect_changed());
    let changed = store.update("/a.vue", Arc::from("x"), Dialect::Ts);
    assert!(changed.dialect_changed());
    assert_eq!(changed.previous_dialect, Some(Dialect::Js));
    assert_eq!(store.dialect("/a.vue"), Some(Dialect::Ts));
  }

  #[test]
  fn observe_never_overrides_editor_content() {
    let mut store = VersionStore::new();
    store.update("/b.vue", Arc::from("editor"), Dialect::Ts);
    let file = store.observe("/b.vue", || (Arc::from("disk"), Dialect::Js));
    assert_eq!(&*file.text, "editor");
    assert_eq!(file.dialect, Dialect::Ts);
    assert_eq!(file.version, 1);

    let file = store.observe("/c.vue", || (Arc::from("disk"), Dialect::Js));
    assert_eq!(file.origin, FileOrigin::Resolution);
    assert_eq!(file.version, 1);
  }

  #[test]
  fn change_ranges_cover_only_the_edit() {
    let change = TextChange::between("let a = 1;", "let abc = 1;");
    assert_eq!(change, TextChange {
      start: 5,
      old_end: 5,
      new_end: 7,
    });
    assert!(TextChange::between("same", "same").is_empty());
    let change = TextChange::between("aé", "aè");
    assert_eq!(change.start, 1);
    assert_eq!(change.old_end, 3);
  }

  #[test]
  fn change_since_requires_consecutive_versions() {
    let mut store = VersionStore::new();
    store.update("/a.ts", Arc::from("a"), Dialect::Ts);
    store.update("/a.ts", Arc::from("ab"), Dialect::Ts);
    assert!(store.change_since("/a.ts", 1).is_some());
    store.update("/a.ts", Arc::from("abc"), Dialect::Ts);
    assert!(store.change_since("/a.ts", 1).is_none());
    assert!(store.change_since("/a.ts", 2).is_some());
    assert!(store.change_since("/missing.ts", 0).is_none());
  }
}
