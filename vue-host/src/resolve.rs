//! Ordinary Node/TypeScript-style module resolution over a [`HostFs`].
//!
//! Mixed-content targets and the bridge module are special-cased by the host
//! before anything reaches this resolver.

use crate::config::CompilerSettings;
use crate::dialect::Dialect;
use crate::fs::HostFs;
use crate::path::{
  is_absolute_specifier, is_relative_specifier, join, normalize_path_str, parent_dir,
};
use serde_json::Value;

static TYPED_EXTENSIONS: [&str; 3] = [".ts", ".tsx", ".d.ts"];
static UNTYPED_EXTENSIONS: [&str; 2] = [".js", ".jsx"];
const PACKAGE_ENTRY_FIELDS: [&str; 3] = ["types", "typings", "main"];
const MAX_PACKAGE_DEPTH: usize = 8;

/// A module name resolved to a concrete file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedModule {
  pub resolved_file_name: String,
  pub dialect: Dialect,
  /// The file lives inside a `node_modules` directory.
  pub is_external_library_import: bool,
}

impl ResolvedModule {
  pub fn new(resolved_file_name: String, dialect: Dialect) -> Self {
    let is_external_library_import = resolved_file_name.contains("/node_modules/");
    Self {
      resolved_file_name,
      dialect,
      is_external_library_import,
    }
  }
}

/// The compiler's standard module resolution algorithm.
pub trait ModuleResolver {
  fn resolve_module_name(
    &self,
    name: &str,
    containing_file: &str,
    settings: &CompilerSettings,
    fs: &dyn HostFs,
  ) -> Option<ResolvedModule>;
}

/// Relative, absolute, `baseUrl` and `node_modules` resolution with extension
/// probing and `package.json` entry points.
#[derive(Clone, Copy, Debug, Default)]
pub struct NodeResolver;

impl ModuleResolver for NodeResolver {
  fn resolve_module_name(
    &self,
    name: &str,
    containing_file: &str,
    settings: &CompilerSettings,
    fs: &dyn HostFs,
  ) -> Option<ResolvedModule> {
    let lookup = Lookup { fs, settings };
    let found = if is_relative_specifier(name) {
      lookup.file_or_directory(&join(parent_dir(containing_file), name), 0)
    } else if is_absolute_specifier(name) {
      lookup.file_or_directory(&normalize_path_str(name), 0)
    } else {
      settings
        .base_url
        .as_deref()
        .and_then(|base_url| lookup.file_or_directory(&join(base_url, name), 0))
        .or_else(|| lookup.node_modules(parent_dir(containing_file), name))
    }?;
    let dialect = Dialect::from_path(&found);
    Some(ResolvedModule::new(found, dialect))
  }
}

/// Every path a specifier naming an exact file (extension included) could
/// refer to, in lookup order.
pub fn exact_file_candidates(
  name: &str,
  containing_file: &str,
  settings: &CompilerSettings,
) -> Vec<String> {
  if is_relative_specifier(name) {
    return vec![join(parent_dir(containing_file), name)];
  }
  if is_absolute_specifier(name) {
    return vec![normalize_path_str(name)];
  }
  let mut candidates = Vec::new();
  if let Some(base_url) = settings.base_url.as_deref() {
    candidates.push(join(base_url, name));
  }
  let mut dir = parent_dir(containing_file);
  loop {
    candidates.push(join(&join(dir, "node_modules"), name));
    let parent = parent_dir(dir);
    if parent == dir {
      break;
    }
    dir = parent;
  }
  candidates
}

struct Lookup<'a> {
  fs: &'a dyn HostFs,
  settings: &'a CompilerSettings,
}

impl Lookup<'_> {
  fn extensions(&self) -> impl Iterator<Item = &'static str> {
    let untyped: &'static [&'static str] = if self.settings.permit_untyped {
      &UNTYPED_EXTENSIONS
    } else {
      &[]
    };
    TYPED_EXTENSIONS.iter().chain(untyped).copied()
  }

  fn try_file(&self, candidate: &str) -> Option<String> {
    self.fs.is_file(candidate).then(|| candidate.to_string())
  }

  fn file_or_directory(&self, base: &str, depth: usize) -> Option<String> {
    if let Some(found) = self.file(base) {
      return Some(found);
    }
    if !self.fs.is_dir(base) {
      return None;
    }
    self
      .package_entry(base, depth)
      .or_else(|| self.index_file(base))
  }

  fn file(&self, base: &str) -> Option<String> {
    if let Some(stem) = base.strip_suffix(".js") {
      return TYPED_EXTENSIONS
        .iter()
        .find_map(|ext| self.try_file(&format!("{stem}{ext}")))
        .or_else(|| self.untyped_file(base));
    }
    if let Some(stem) = base.strip_suffix(".jsx") {
      return [".tsx", ".d.ts"]
        .iter()
        .find_map(|ext| self.try_file(&format!("{stem}{ext}")))
        .or_else(|| self.untyped_file(base));
    }
    if is_source_file(base) {
      if let Some(found) = self.try_file(base) {
        return Some(found);
      }
    }
    self
      .extensions()
      .find_map(|ext| self.try_file(&format!("{base}{ext}")))
  }

  fn untyped_file(&self, path: &str) -> Option<String> {
    self
      .settings
      .permit_untyped
      .then(|| self.try_file(path))
      .flatten()
  }

  fn package_entry(&self, dir: &str, depth: usize) -> Option<String> {
    if depth > MAX_PACKAGE_DEPTH {
      return None;
    }
    let manifest = self.fs.read_to_string(&join(dir, "package.json"))?;
    let parsed: Value = serde_json::from_str(&manifest).ok()?;
    PACKAGE_ENTRY_FIELDS.iter().find_map(|field| {
      let entry = parsed.get(*field)?.as_str()?;
      if entry.is_empty() {
        return None;
      }
      let target = join(dir, entry);
      // A package pointing at itself would loop forever.
      if target == dir {
        return self.index_file(dir);
      }
      self.file_or_directory(&target, depth + 1)
    })
  }

  fn index_file(&self, dir: &str) -> Option<String> {
    let index = join(dir, "index");
    self
      .extensions()
      .find_map(|ext| self.try_file(&format!("{index}{ext}")))
  }

  fn node_modules(&self, from_dir: &str, name: &str) -> Option<String> {
    let types_name = types_package_name(name);
    let mut dir = from_dir;
    loop {
      let modules = join(dir, "node_modules");
      if let Some(found) = self.file_or_directory(&join(&modules, name), 0) {
        return Some(found);
      }
      if let Some(types_name) = types_name.as_deref() {
        let types = join(&modules, "@types");
        if let Some(found) = self.file_or_directory(&join(&types, types_name), 0) {
          return Some(found);
        }
      }
      let parent = parent_dir(dir);
      if parent == dir {
        return None;
      }
      dir = parent;
    }
  }
}

fn is_source_file(name: &str) -> bool {
  TYPED_EXTENSIONS
    .iter()
    .chain(UNTYPED_EXTENSIONS.iter())
    .any(|ext| name.ends_with(ext))
}

/// `@scope/pkg` lives at `@types/scope__pkg`; `@types/*` has no fallback.
fn types_package_name(name: &str) -> Option<String> {
  if name.starts_with("@types/") {
    return None;
  }
  match name.strip_prefix('@') {
    Some(scoped) => {
      let (scope, rest) = scoped.split_once('/')?;
      Some(format!("{scope}__{rest}"))
    }
    None => Some(name.to_string()),
  }
}
