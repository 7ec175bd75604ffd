//! Parse hooks of the script compiler and the patched wrapper around them.

use crate::dialect::Dialect;
use crate::patch::rewrite_component_module;
use crate::path::is_mixed_content;
use crate::store::TextChange;
use parse_js::ast::Node;
use parse_js::error::SyntaxResult;
use tracing::debug;

/// A parsed module; the root is always `Syntax::TopLevel`.
pub type SourceTree = Node;

/// The two parse entry points of the script compiler.
pub trait ScriptParser {
  /// Parse a file seen for the first time (or whose old tree is unusable).
  fn create_source_file(&self, path: &str, text: &str, dialect: Dialect) -> SyntaxResult<SourceTree>;

  /// Reparse a file given its previous tree and the edit since that tree.
  /// Parsers without node reuse fall back to a full parse.
  fn update_source_file(
    &self,
    path: &str,
    _previous: SourceTree,
    text: &str,
    _change: TextChange,
    dialect: Dialect,
  ) -> SyntaxResult<SourceTree> {
    self.create_source_file(path, text, dialect)
  }
}

/// `parse-js` backed parser. It has no node-reuse mode, so both entry points
/// parse from scratch.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParseJs;

impl ScriptParser for ParseJs {
  fn create_source_file(&self, _path: &str, text: &str, _dialect: Dialect) -> SyntaxResult<SourceTree> {
    parse_js::parse(text.as_bytes())
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseKind {
  Full,
  Incremental,
}

/// What the caller knows about the file's last successful parse.
pub struct PreviousTree {
  pub version: u64,
  pub dialect: Dialect,
  pub tree: SourceTree,
}

pub struct ParseRequest<'a> {
  pub path: &'a str,
  pub text: &'a str,
  pub version: u64,
  pub dialect: Dialect,
  /// Edit from the previous tree's version to `version`, if known.
  pub change: Option<TextChange>,
}

pub struct ParseOutcome {
  pub tree: SyntaxResult<SourceTree>,
  pub kind: ParseKind,
  /// The component rewrite was applied to the returned tree.
  pub patched: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseStats {
  pub full: usize,
  pub incremental: usize,
}

/// Choose between the incremental and the full parse entry point.
///
/// Incremental needs an old tree, an edit range and a new version; a dialect
/// change always forces a full parse.
pub fn choose_parse_kind(previous: Option<&PreviousTree>, request: &ParseRequest<'_>) -> ParseKind {
  match previous {
    Some(previous)
      if request.change.is_some()
        && previous.version != request.version
        && previous.dialect == request.dialect =>
    {
      ParseKind::Incremental
    }
    _ => ParseKind::Full,
  }
}

/// Wraps a [`ScriptParser`] so every tree produced for a mixed-content file,
/// through either entry point, comes back with the component rewrite applied.
pub struct PatchedParser<P> {
  inner: P,
  stats: ParseStats,
}

impl<P: ScriptParser> PatchedParser<P> {
  pub fn new(inner: P) -> Self {
    Self {
      inner,
      stats: ParseStats::default(),
    }
  }

  pub fn stats(&self) -> ParseStats {
    self.stats
  }

  pub fn parse(&mut self, request: ParseRequest<'_>, previous: Option<PreviousTree>) -> ParseOutcome {
    let kind = choose_parse_kind(previous.as_ref(), &request);
    debug!(path = request.path, version = request.version, ?kind, "parsing script");
    let tree = match (kind, previous, request.change) {
      (ParseKind::Incremental, Some(previous), Some(change)) => {
        self.stats.incremental += 1;
        self.inner.update_source_file(
          request.path,
          previous.tree,
          request.text,
          change,
          request.dialect,
        )
      }
      _ => {
        self.stats.full += 1;
        self
          .inner
          .create_source_file(request.path, request.text, request.dialect)
      }
    };
    let (tree, patched) = match tree {
      Ok(mut tree) if is_mixed_content(request.path) => {
        let patched = rewrite_component_module(&mut tree);
        if patched {
          debug!(path = request.path, "component rewrite applied");
        }
        (Ok(tree), patched)
      }
      other => (other, false),
    };
    ParseOutcome { tree, kind, patched }
  }
}
