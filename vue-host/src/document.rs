//! Editor-facing document cache: editor documents in, script views out.

use crate::dialect::Dialect;
use crate::extract::ScriptExtractor;
use crate::path::is_mixed_content;
use ahash::HashMap;
use std::sync::Arc;

pub const DEFAULT_DOCUMENT_CACHE_CAPACITY: usize = 10;

/// A document as the editor front end sees it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextDocument {
  /// Normalised file identity.
  pub path: String,
  /// Editor-assigned version; unrelated to Version Store versions.
  pub version: i32,
  pub text: Arc<str>,
}

impl TextDocument {
  pub fn new(path: impl Into<String>, version: i32, text: impl Into<Arc<str>>) -> Self {
    Self {
      path: path.into(),
      version,
      text: text.into(),
    }
  }
}

/// The script-language view of a [`TextDocument`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptDocument {
  pub path: String,
  pub editor_version: i32,
  pub text: Arc<str>,
  pub dialect: Dialect,
}

pub trait DocumentCache {
  /// Current script view of `document`.
  fn get(&mut self, document: &TextDocument) -> Arc<ScriptDocument>;
  /// Forget everything about `path`.
  fn remove(&mut self, path: &str);
}

struct Entry {
  document: Arc<ScriptDocument>,
  last_used: u64,
}

/// Memoises extraction per (path, editor version), keeping at most
/// `capacity` documents and evicting the least recently used.
pub struct ScriptDocumentCache<E> {
  extractor: E,
  capacity: usize,
  entries: HashMap<String, Entry>,
  clock: u64,
}

impl<E: ScriptExtractor> ScriptDocumentCache<E> {
  pub fn new(extractor: E) -> Self {
    Self::with_capacity(extractor, DEFAULT_DOCUMENT_CACHE_CAPACITY)
  }

  pub fn with_capacity(extractor: E, capacity: usize) -> Self {
    Self {
      extractor,
      capacity: capacity.max(1),
      entries: HashMap::default(),
      clock: 0,
    }
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  fn build(&self, document: &TextDocument) -> ScriptDocument {
    let (text, dialect) = if is_mixed_content(&document.path) {
      let block = self.extractor.extract(&document.text);
      (Arc::from(block.text), block.dialect)
    } else {
      (document.text.clone(), Dialect::from_path(&document.path))
    };
    ScriptDocument {
      path: document.path.clone(),
      editor_version: document.version,
      text,
      dialect,
    }
  }

  fn evict_if_full(&mut self) {
    if self.entries.len() < self.capacity {
      return;
    }
    let oldest = self
      .entries
      .iter()
      .min_by_key(|(_, entry)| entry.last_used)
      .map(|(path, _)| path.clone());
    if let Some(oldest) = oldest {
      self.entries.remove(&oldest);
    }
  }
}

impl<E: ScriptExtractor> DocumentCache for ScriptDocumentCache<E> {
  fn get(&mut self, document: &TextDocument) -> Arc<ScriptDocument> {
    self.clock += 1;
    let now = self.clock;
    if let Some(entry) = self.entries.get_mut(&document.path) {
      if entry.document.editor_version == document.version {
        entry.last_used = now;
        return entry.document.clone();
      }
    }
    let built = Arc::new(self.build(document));
    if !self.entries.contains_key(&document.path) {
      self.evict_if_full();
    }
    self.entries.insert(document.path.clone(), Entry {
      document: built.clone(),
      last_used: now,
    });
    built
  }

  fn remove(&mut self, path: &str) {
    self.entries.remove(path);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::extract::SfcExtractor;

  #[test]
  fn memoises_per_editor_version() {
    let mut cache = ScriptDocumentCache::new(SfcExtractor);
    let v1 = TextDocument::new("/a.vue", 1, "<script lang=\"ts\">let a = 1;</script>");
    let first = cache.get(&v1);
    let again = cache.get(&v1);
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(first.dialect, Dialect::Ts);

    let v2 = TextDocument::new("/a.vue", 2, "<script>let a = 1;</script>");
    let second = cache.get(&v2);
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(second.dialect, Dialect::Js);
  }

  #[test]
  fn plain_scripts_pass_through() {
    let mut cache = ScriptDocumentCache::new(SfcExtractor);
    let doc = cache.get(&TextDocument::new("/a.tsx", 1, "<div/>"));
    assert_eq!(&*doc.text, "<div/>");
    assert_eq!(doc.dialect, Dialect::Tsx);
  }

  #[test]
  fn evicts_least_recently_used() {
    let mut cache = ScriptDocumentCache::with_capacity(SfcExtractor, 2);
    let a = TextDocument::new("/a.ts", 1, "a");
    let b = TextDocument::new("/b.ts", 1, "b");
    let c = TextDocument::new("/c.ts", 1, "c");
    let first_a = cache.get(&a);
    cache.get(&b);
    cache.get(&a);
    cache.get(&c);
    assert_eq!(cache.len(), 2);
    assert!(Arc::ptr_eq(&first_a, &cache.get(&a)));
    cache.remove("/a.ts");
    assert_eq!(cache.len(), 1);
  }
}
