//! The host adapter: the callback surface the script compiler drives, backed
//! by the Version Store, the root file set and the virtual module resolver.

use crate::bridge::{
  is_bridge_module, is_bridge_path, BRIDGE_DIALECT, BRIDGE_MODULE_NAME, BRIDGE_PATH, BRIDGE_SOURCE,
  BRIDGE_VERSION,
};
use crate::config::{CompilerSettings, ProjectConfig};
use crate::dialect::Dialect;
use crate::document::{DocumentCache, ScriptDocumentCache, TextDocument};
use crate::extract::{ScriptExtractor, SfcExtractor};
use crate::fs::HostFs;
use crate::path::{is_absolute_specifier, is_mixed_content, join, normalize_path_str};
use crate::registry::RootFileSet;
use crate::resolve::{exact_file_candidates, ModuleResolver, NodeResolver, ResolvedModule};
use crate::store::{TextChange, VersionStore};
use std::sync::Arc;
use tracing::{debug, info};

/// What the script compiler asks of its environment.
pub trait CompilerHost {
  fn compilation_settings(&self) -> &CompilerSettings;
  /// Current compilation roots, in order.
  fn script_file_names(&self) -> Vec<String>;
  /// Version of a file; `0` when the host does not track it.
  fn script_version(&self, path: &str) -> u64;
  fn script_dialect(&self, path: &str) -> Dialect;
  /// One answer per name, in input order.
  fn resolve_module_names(&mut self, names: &[String], containing_file: &str) -> Vec<Option<ResolvedModule>>;
  /// Script text of a file, or `None` if it does not exist anywhere.
  fn script_snapshot(&self, path: &str) -> Option<Arc<str>>;
  /// The edit separating `since_version` from the current version, if known.
  fn script_change_range(&self, path: &str, since_version: u64) -> Option<TextChange>;
  fn current_directory(&self) -> &str;
  fn default_lib_file_name(&self) -> String;
}

/// Result of [`VirtualHost::update_current_document`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentUpdate {
  pub path: String,
  /// Version Store version after the update.
  pub version: u64,
  pub dialect: Dialect,
  /// The document was already current at this editor version; nothing changed.
  pub unchanged: bool,
  /// The dialect differs from the one previously tracked, so every semantic
  /// result computed so far must be dropped.
  pub invalidate_semantics: bool,
}

pub struct VirtualHost {
  store: VersionStore,
  roots: RootFileSet,
  documents: Box<dyn DocumentCache>,
  extractor: Box<dyn ScriptExtractor>,
  resolver: Box<dyn ModuleResolver>,
  fs: Box<dyn HostFs>,
  settings: CompilerSettings,
  base_permit_untyped: bool,
  current: Option<(String, i32)>,
  workspace_root: String,
  lib_dir: String,
}

impl VirtualHost {
  pub fn new(config: ProjectConfig, fs: impl HostFs + 'static) -> Self {
    Self {
      store: VersionStore::new(),
      roots: RootFileSet::new(config.root_files),
      documents: Box::new(ScriptDocumentCache::new(SfcExtractor)),
      extractor: Box::new(SfcExtractor),
      resolver: Box::new(NodeResolver),
      fs: Box::new(fs),
      base_permit_untyped: config.settings.permit_untyped,
      settings: config.settings,
      current: None,
      workspace_root: config.root_dir,
      lib_dir: config.lib_dir,
    }
  }

  pub fn with_resolver(mut self, resolver: impl ModuleResolver + 'static) -> Self {
    self.resolver = Box::new(resolver);
    self
  }

  pub fn with_extractor(mut self, extractor: impl ScriptExtractor + 'static) -> Self {
    self.extractor = Box::new(extractor);
    self
  }

  pub fn with_document_cache(mut self, documents: impl DocumentCache + 'static) -> Self {
    self.documents = Box::new(documents);
    self
  }

  pub fn store(&self) -> &VersionStore {
    &self.store
  }

  pub fn roots(&self) -> &RootFileSet {
    &self.roots
  }

  /// Push the editor's view of `document` into the host. Must precede any
  /// query about it.
  pub fn update_current_document(&mut self, document: &TextDocument) -> DocumentUpdate {
    let path = normalize_path_str(&document.path);
    self.roots.ensure_tracked(&path);

    let is_current = self
      .current
      .as_ref()
      .is_some_and(|(current, version)| *current == path && *version == document.version);
    if is_current {
      if let Some(file) = self.store.get(&path) {
        return DocumentUpdate {
          path,
          version: file.version,
          dialect: file.dialect,
          unchanged: true,
          invalidate_semantics: false,
        };
      }
    }

    let script = self.documents.get(&TextDocument {
      path: path.clone(),
      ..document.clone()
    });
    let update = self.store.update(&path, script.text.clone(), script.dialect);
    self.current = Some((path.clone(), document.version));
    let invalidate_semantics = update.dialect_changed();
    if invalidate_semantics {
      self.settings.permit_untyped = self.base_permit_untyped || !update.dialect.is_typed();
      info!(
        path = %path,
        from = ?update.previous_dialect,
        to = %update.dialect,
        permit_untyped = self.settings.permit_untyped,
        "dialect changed; semantic caches must be dropped"
      );
    }
    DocumentUpdate {
      path,
      version: update.version,
      dialect: update.dialect,
      unchanged: false,
      invalidate_semantics,
    }
  }

  /// The editor closed `path`. Its Version Store entry stays.
  pub fn close_document(&mut self, path: &str) {
    let path = normalize_path_str(path);
    self.documents.remove(&path);
    if self.current.as_ref().is_some_and(|(current, _)| *current == path) {
      self.current = None;
    }
  }

  fn resolve_module_name(&mut self, name: &str, containing_file: &str) -> Option<ResolvedModule> {
    if is_bridge_module(name) {
      return Some(ResolvedModule::new(BRIDGE_PATH.to_string(), BRIDGE_DIALECT));
    }
    // The bridge has no directory of its own; it imports as if it lived at
    // the workspace root.
    let bridge_anchor;
    let containing_file = if is_bridge_path(containing_file) {
      bridge_anchor = join(&self.workspace_root, BRIDGE_MODULE_NAME);
      bridge_anchor.as_str()
    } else {
      containing_file
    };
    if is_absolute_specifier(name) || !is_mixed_content(name) {
      return self
        .resolver
        .resolve_module_name(name, containing_file, &self.settings, self.fs.as_ref());
    }
    self.resolve_mixed_content(name, containing_file)
  }

  fn resolve_mixed_content(&mut self, name: &str, containing_file: &str) -> Option<ResolvedModule> {
    let target = exact_file_candidates(name, containing_file, &self.settings)
      .into_iter()
      .find(|candidate| self.store.contains(candidate) || self.fs.is_file(candidate));
    let Some(target) = target else {
      debug!(name, containing_file, "mixed-content import unresolved");
      return None;
    };
    let (fs, extractor) = (&self.fs, &self.extractor);
    let file = self.store.observe(&target, || {
      let text = fs.read_to_string(&target).unwrap_or_default();
      let block = extractor.extract(&text);
      (Arc::from(block.text), block.dialect)
    });
    let dialect = file.dialect;
    self.roots.ensure_tracked(&target);
    Some(ResolvedModule::new(target, dialect))
  }
}

impl CompilerHost for VirtualHost {
  fn compilation_settings(&self) -> &CompilerSettings {
    &self.settings
  }

  fn script_file_names(&self) -> Vec<String> {
    self.roots.as_slice().to_vec()
  }

  fn script_version(&self, path: &str) -> u64 {
    if is_bridge_path(path) {
      return BRIDGE_VERSION;
    }
    self.store.version(path)
  }

  fn script_dialect(&self, path: &str) -> Dialect {
    if is_bridge_path(path) {
      return BRIDGE_DIALECT;
    }
    if let Some(dialect) = self.store.dialect(path) {
      return dialect;
    }
    if is_mixed_content(path) {
      let text = self.fs.read_to_string(path).unwrap_or_default();
      return self.extractor.extract(&text).dialect;
    }
    Dialect::from_path(path)
  }

  fn resolve_module_names(&mut self, names: &[String], containing_file: &str) -> Vec<Option<ResolvedModule>> {
    names
      .iter()
      .map(|name| self.resolve_module_name(name, containing_file))
      .collect()
  }

  fn script_snapshot(&self, path: &str) -> Option<Arc<str>> {
    if is_bridge_path(path) {
      return Some(Arc::from(BRIDGE_SOURCE));
    }
    if let Some(file) = self.store.get(path) {
      return Some(file.text.clone());
    }
    let text = self.fs.read_to_string(path)?;
    if is_mixed_content(path) {
      return Some(Arc::from(self.extractor.extract(&text).text));
    }
    Some(Arc::from(text))
  }

  fn script_change_range(&self, path: &str, since_version: u64) -> Option<TextChange> {
    self.store.change_since(path, since_version)
  }

  fn current_directory(&self) -> &str {
    &self.workspace_root
  }

  fn default_lib_file_name(&self) -> String {
    join(&self.lib_dir, self.settings.default_lib_file_name())
  }
}
