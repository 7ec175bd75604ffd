use std::path::PathBuf;

/// Failures while bootstrapping the project configuration.
///
/// Nothing past bootstrap is fatal: unresolved imports, unreadable files and
/// missing script blocks all degrade to "no result" instead of an error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("failed to parse {path}: {message}")]
  Parse { path: PathBuf, message: String },
  #[error("cycle detected while resolving extends: {0}")]
  ExtendsCycle(PathBuf),
  #[error("failed to resolve extends '{extends}' from {from}")]
  UnresolvedExtends { extends: String, from: PathBuf },
  #[error("unknown compilerOptions.target '{0}'")]
  UnknownTarget(String),
  #[error("unknown compilerOptions.jsx '{0}'")]
  UnknownJsx(String),
  #[error("invalid glob pattern '{pattern}': {source}")]
  Glob {
    pattern: String,
    #[source]
    source: globset::Error,
  },
}
