//! The script compiler service: syntax cache, program construction and the
//! component instance query, all driven through a [`CompilerHost`].

use crate::bridge::{is_bridge_path, BRIDGE_PATH};
use crate::component::{
  default_export_call, default_imports, has_default_export, module_specifiers, ComponentOptions,
};
use crate::dialect::Dialect;
use crate::host::CompilerHost;
use crate::parser::{
  ParseKind, ParseRequest, ParseStats, PatchedParser, PreviousTree, ScriptParser, SourceTree,
};
use crate::resolve::ResolvedModule;
use ahash::{HashMap, HashSet};
use parse_js::error::SyntaxError;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, debug_span};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleImport {
  pub specifier: String,
  pub resolved: Option<ResolvedModule>,
}

/// A parsed file as last synchronised from the host.
pub struct SourceFile {
  pub path: String,
  pub version: u64,
  pub dialect: Dialect,
  pub text: Arc<str>,
  pub tree: Result<SourceTree, SyntaxError>,
  pub parse_kind: ParseKind,
  pub patched: bool,
  pub imports: Vec<ModuleImport>,
}

impl SourceFile {
  fn resolved_import(&self, specifier: &str) -> Option<&ResolvedModule> {
    self
      .imports
      .iter()
      .find(|import| import.specifier == specifier)
      .and_then(|import| import.resolved.as_ref())
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Program {
  pub root_files: Vec<String>,
  /// Every file loaded, roots first, then imports breadth-first.
  pub files: Vec<String>,
  /// Roots and imports that could not be read.
  pub missing: Vec<String>,
  pub default_lib: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChildComponent {
  pub name: String,
  /// File the child's import resolves to.
  pub source: Option<String>,
  pub dialect: Option<Dialect>,
}

/// Semantic view of a component: what its runtime instance exposes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ComponentInstance {
  pub path: String,
  pub version: u64,
  pub dialect: Dialect,
  /// Whether untyped script was permitted when this was computed.
  pub permit_untyped: bool,
  pub name: Option<String>,
  pub props: Vec<String>,
  pub computed: Vec<String>,
  pub methods: Vec<String>,
  pub data: Vec<String>,
  pub components: Vec<ChildComponent>,
  /// Semantic cache generation this was computed in.
  pub generation: u64,
}

/// A computed instance together with the import resolutions it was read
/// against. Opening or deleting an imported file changes those resolutions
/// without touching the component's own version.
struct CachedInstance {
  instance: Arc<ComponentInstance>,
  imports: Vec<ModuleImport>,
}

pub struct LanguageService<P> {
  parser: PatchedParser<P>,
  files: HashMap<String, SourceFile>,
  instances: HashMap<String, CachedInstance>,
  generation: u64,
}

impl<P: ScriptParser> LanguageService<P> {
  pub fn new(parser: P) -> Self {
    Self {
      parser: PatchedParser::new(parser),
      files: HashMap::default(),
      instances: HashMap::default(),
      generation: 0,
    }
  }

  pub fn parse_stats(&self) -> ParseStats {
    self.parser.stats()
  }

  pub fn generation(&self) -> u64 {
    self.generation
  }

  pub fn source_file(&self, path: &str) -> Option<&SourceFile> {
    self.files.get(path)
  }

  /// Drop every semantic result. Syntax trees are kept.
  pub fn cleanup_semantic_cache(&mut self) {
    self.instances.clear();
    self.generation += 1;
    debug!(generation = self.generation, "semantic cache cleaned up");
  }

  /// Bring every root file and, transitively, everything they import up to
  /// date with the host.
  pub fn program(&mut self, host: &mut dyn CompilerHost) -> Program {
    let root_files = host.script_file_names();
    let _span = debug_span!("program", roots = root_files.len()).entered();
    let mut queue: VecDeque<String> = root_files.iter().cloned().collect();
    let mut seen = HashSet::default();
    let mut files = Vec::new();
    let mut missing = Vec::new();
    while let Some(path) = queue.pop_front() {
      if !seen.insert(path.clone()) {
        continue;
      }
      let Some(file) = self.sync_file(host, &path) else {
        missing.push(path);
        continue;
      };
      // Library internals are loaded but not walked.
      if !path.contains("/node_modules/") {
        for import in &file.imports {
          if let Some(resolved) = &import.resolved {
            queue.push_back(resolved.resolved_file_name.clone());
          }
        }
      }
      files.push(path);
    }
    debug!(files = files.len(), missing = missing.len(), "program synchronised");
    Program {
      root_files,
      files,
      missing,
      default_lib: host.default_lib_file_name(),
    }
  }

  /// Bring one file up to date. Imports are re-resolved every time so a
  /// change in what they point at is always picked up.
  fn sync_file(&mut self, host: &mut dyn CompilerHost, path: &str) -> Option<&SourceFile> {
    let version = host.script_version(path);
    let dialect = host.script_dialect(path);
    let reusable = self
      .files
      .get(path)
      .is_some_and(|file| file.version == version && file.dialect == dialect);
    if !reusable {
      let Some(text) = host.script_snapshot(path) else {
        self.files.remove(path);
        return None;
      };
      let previous = self.files.remove(path).and_then(|file| {
        let (version, dialect) = (file.version, file.dialect);
        file.tree.ok().map(|tree| PreviousTree {
          version,
          dialect,
          tree,
        })
      });
      let change = previous
        .as_ref()
        .and_then(|previous| host.script_change_range(path, previous.version));
      let outcome = self.parser.parse(
        ParseRequest {
          path,
          text: &text,
          version,
          dialect,
          change,
        },
        previous,
      );
      self.files.insert(path.to_string(), SourceFile {
        path: path.to_string(),
        version,
        dialect,
        text,
        tree: outcome.tree,
        parse_kind: outcome.kind,
        patched: outcome.patched,
        imports: Vec::new(),
      });
    }

    let specifiers = match self.files.get(path).map(|file| &file.tree) {
      Some(Ok(tree)) => module_specifiers(tree),
      _ => Vec::new(),
    };
    let resolved = host.resolve_module_names(&specifiers, path);
    let file = self.files.get_mut(path)?;
    file.imports = specifiers
      .into_iter()
      .zip(resolved)
      .map(|(specifier, resolved)| ModuleImport { specifier, resolved })
      .collect();
    Some(&*file)
  }

  /// The runtime instance a component script describes, or `None` if the
  /// file is not a component wired to the bridge.
  pub fn component_instance(
    &mut self,
    host: &mut dyn CompilerHost,
    path: &str,
  ) -> Option<Arc<ComponentInstance>> {
    let file = self.sync_file(host, path)?;
    let (version, imports) = (file.version, file.imports.clone());
    if let Some(cached) = self.instances.get(path) {
      if cached.instance.version == version
        && cached.instance.generation == self.generation
        && cached.imports == imports
      {
        return Some(cached.instance.clone());
      }
    }
    if !self.bridge_has_default_export(host) {
      return None;
    }
    let instance = Arc::new(self.compute_instance(host, path)?);
    self.instances.insert(path.to_string(), CachedInstance {
      instance: instance.clone(),
      imports,
    });
    Some(instance)
  }

  fn bridge_has_default_export(&mut self, host: &mut dyn CompilerHost) -> bool {
    self
      .sync_file(host, BRIDGE_PATH)
      .and_then(|bridge| bridge.tree.as_ref().ok())
      .is_some_and(has_default_export)
  }

  fn compute_instance(&self, host: &dyn CompilerHost, path: &str) -> Option<ComponentInstance> {
    let file = self.files.get(path)?;
    let tree = file.tree.as_ref().ok()?;
    let (callee, members) = default_export_call(tree)?;
    let imports = default_imports(tree);
    let bridge_import = imports.iter().find(|import| import.binding == callee)?;
    let bridge = file.resolved_import(&bridge_import.specifier)?;
    if !is_bridge_path(&bridge.resolved_file_name) {
      return None;
    }

    let options = ComponentOptions::read(members);
    let components = options
      .components
      .iter()
      .map(|(name, binding)| {
        let resolved = imports
          .iter()
          .find(|import| import.binding == *binding)
          .and_then(|import| file.resolved_import(&import.specifier));
        ChildComponent {
          name: name.clone(),
          source: resolved.map(|resolved| resolved.resolved_file_name.clone()),
          dialect: resolved.map(|resolved| resolved.dialect),
        }
      })
      .collect();
    debug!(path, generation = self.generation, "component instance computed");
    Some(ComponentInstance {
      path: file.path.clone(),
      version: file.version,
      dialect: file.dialect,
      permit_untyped: host.compilation_settings().permit_untyped,
      name: options.name,
      props: options.props,
      computed: options.computed,
      methods: options.methods,
      data: options.data,
      components,
      generation: self.generation,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::ProjectConfig;
  use crate::document::TextDocument;
  use crate::fs::MemoryFs;
  use crate::host::VirtualHost;
  use crate::parser::ParseJs;

  const PARENT: &str = "<template><Child/></template>\n<script>\nimport Child from './Child.vue';\nexport default { name: 'Parent', components: { Child } }\n</script>\n";
  const CHILD: &str = "<script>\nexport default { props: ['label'] }\n</script>\n";

  fn setup() -> (MemoryFs, VirtualHost, LanguageService<ParseJs>) {
    let fs = MemoryFs::new();
    fs.insert("/proj/src/Child.vue", CHILD);
    let host = VirtualHost::new(ProjectConfig::new("/proj", Vec::new()), fs.clone());
    (fs, host, LanguageService::new(ParseJs))
  }

  #[test]
  fn program_follows_imports_into_bridge_and_unopened_components() {
    let (_fs, mut host, mut service) = setup();
    host.update_current_document(&TextDocument::new("/proj/src/Parent.vue", 1, PARENT));
    let program = service.program(&mut host);
    assert_eq!(program.root_files, ["/proj/src/Parent.vue"]);
    assert!(program.files.contains(&"/proj/src/Child.vue".to_string()));
    assert!(program.files.contains(&BRIDGE_PATH.to_string()));
    assert!(host.roots().contains("/proj/src/Child.vue"));
    let parent = service.source_file("/proj/src/Parent.vue").unwrap();
    assert!(parent.patched);
    assert_eq!(parent.imports[0].specifier, "vue-editor-bridge");
  }

  #[test]
  fn component_instance_is_cached_per_version_and_generation() {
    let (_fs, mut host, mut service) = setup();
    host.update_current_document(&TextDocument::new("/proj/src/Parent.vue", 1, PARENT));
    let first = service.component_instance(&mut host, "/proj/src/Parent.vue").unwrap();
    assert_eq!(first.name.as_deref(), Some("Parent"));
    assert_eq!(first.components, [ChildComponent {
      name: "Child".to_string(),
      source: Some("/proj/src/Child.vue".to_string()),
      dialect: Some(Dialect::Js),
    }]);
    let again = service.component_instance(&mut host, "/proj/src/Parent.vue").unwrap();
    assert!(Arc::ptr_eq(&first, &again));

    service.cleanup_semantic_cache();
    let fresh = service.component_instance(&mut host, "/proj/src/Parent.vue").unwrap();
    assert!(!Arc::ptr_eq(&first, &fresh));
    assert_eq!(fresh.generation, 1);
  }

  #[test]
  fn component_instance_follows_import_resolution() {
    let (fs, mut host, mut service) = setup();
    fs.remove("/proj/src/Child.vue");
    host.update_current_document(&TextDocument::new("/proj/src/Parent.vue", 1, PARENT));
    let before = service.component_instance(&mut host, "/proj/src/Parent.vue").unwrap();
    assert_eq!(before.components[0].source, None);

    fs.insert("/proj/src/Child.vue", CHILD);
    let after = service.component_instance(&mut host, "/proj/src/Parent.vue").unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(after.components[0].source.as_deref(), Some("/proj/src/Child.vue"));
    assert_eq!(after.version, before.version);
  }

  #[test]
  fn plain_modules_have_no_component_instance() {
    let (fs, mut host, mut service) = setup();
    fs.insert("/proj/src/util.ts", "export default { a: 1 };");
    assert!(service.component_instance(&mut host, "/proj/src/util.ts").is_none());
    assert!(service.component_instance(&mut host, "/proj/src/missing.vue").is_none());
  }

  #[test]
  fn unchanged_files_are_not_reparsed() {
    let (_fs, mut host, mut service) = setup();
    host.update_current_document(&TextDocument::new("/proj/src/Parent.vue", 1, PARENT));
    service.program(&mut host);
    let parsed = service.parse_stats();
    service.program(&mut host);
    assert_eq!(service.parse_stats(), parsed);
  }
}
