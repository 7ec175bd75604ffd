//! Virtual project host for single-file components.
//!
//! The script compiler only ever sees script files. `.vue` documents are
//! presented as their extracted script block, imports of them resolve whether
//! or not the editor has them open, and every component script is rewritten
//! after parsing so its default export is typed as a component instance.

pub mod bridge;
pub mod component;
pub mod config;
pub mod dialect;
pub mod document;
mod error;
pub mod extract;
pub mod fs;
pub mod host;
pub mod parser;
pub mod patch;
pub mod path;
pub mod registry;
pub mod resolve;
pub mod service;
pub mod store;

pub use config::{CompilerSettings, ProjectConfig};
pub use dialect::Dialect;
pub use document::TextDocument;
pub use error::ConfigError;
pub use fs::{HostFs, MemoryFs, RealFs};
pub use host::{CompilerHost, DocumentUpdate, VirtualHost};
pub use parser::{ParseJs, ParseKind, ScriptParser};
pub use service::{ComponentInstance, LanguageService, Program, SourceFile};

use std::path::Path;
use std::sync::Arc;

/// A host together with the service it drives. This is what an editor
/// integration talks to.
pub struct ServiceHost<P = ParseJs> {
  host: VirtualHost,
  service: LanguageService<P>,
}

impl ServiceHost<ParseJs> {
  /// Discover the project governing `workspace` and serve it from disk.
  pub fn open(workspace: &Path) -> Result<Self, ConfigError> {
    let config = ProjectConfig::discover(workspace)?;
    Ok(Self::new(VirtualHost::new(config, RealFs), ParseJs))
  }
}

impl<P: ScriptParser> ServiceHost<P> {
  pub fn new(host: VirtualHost, parser: P) -> Self {
    Self {
      host,
      service: LanguageService::new(parser),
    }
  }

  /// Make `document` the current document. Must be called before querying.
  /// A dialect change drops every semantic result the service holds.
  pub fn update_current_document(&mut self, document: &TextDocument) -> DocumentUpdate {
    let update = self.host.update_current_document(document);
    if update.invalidate_semantics {
      self.service.cleanup_semantic_cache();
    }
    update
  }

  pub fn close_document(&mut self, path: &str) {
    self.host.close_document(path);
  }

  /// The live service and the host it must be driven with.
  pub fn service(&mut self) -> (&mut LanguageService<P>, &mut VirtualHost) {
    (&mut self.service, &mut self.host)
  }

  pub fn host(&self) -> &VirtualHost {
    &self.host
  }

  pub fn program(&mut self) -> Program {
    self.service.program(&mut self.host)
  }

  pub fn component_instance(&mut self, path: &str) -> Option<Arc<ComponentInstance>> {
    let path = crate::path::normalize_path_str(path);
    self.service.component_instance(&mut self.host, &path)
  }

  pub fn source_file(&self, path: &str) -> Option<&SourceFile> {
    self.service.source_file(&crate::path::normalize_path_str(path))
  }
}
