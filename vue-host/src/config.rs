//! Project bootstrap: locate `tsconfig.json`/`jsconfig.json`, follow `extends`
//! and turn the result into compiler settings plus the initial root files.

use crate::error::ConfigError;
use crate::path::{join, normalize_path, normalize_path_str, MIXED_CONTENT_EXTENSION};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Environment variable naming the directory holding the default libraries.
pub const LIB_DIR_ENV: &str = "VUE_HOST_LIB_DIR";

const CONFIG_FILE_NAMES: [&str; 2] = ["tsconfig.json", "jsconfig.json"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScriptTarget {
  Es3,
  Es5,
  Es2015,
  Es2016,
  Es2017,
  Es2018,
  Es2019,
  Es2020,
  Es2021,
  Es2022,
  #[default]
  EsNext,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JsxMode {
  #[default]
  Preserve,
  React,
  ReactNative,
  ReactJsx,
  ReactJsxdev,
}

/// Settings handed to the script compiler. Fixed after bootstrap apart from
/// `permit_untyped`, which the host may widen when a dialect changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompilerSettings {
  pub target: ScriptTarget,
  /// Whether untyped (JavaScript) script is part of the analysed program.
  pub permit_untyped: bool,
  pub allow_non_ts_extensions: bool,
  pub allow_synthetic_default_imports: bool,
  pub jsx: JsxMode,
  pub libs: Vec<String>,
  /// Normalised absolute directory for non-relative module names.
  pub base_url: Option<String>,
}

impl Default for CompilerSettings {
  fn default() -> Self {
    Self {
      target: ScriptTarget::EsNext,
      permit_untyped: true,
      allow_non_ts_extensions: true,
      allow_synthetic_default_imports: true,
      jsx: JsxMode::Preserve,
      libs: vec!["lib.dom.d.ts".to_string(), "lib.es2017.d.ts".to_string()],
      base_url: None,
    }
  }
}

impl CompilerSettings {
  /// File name of the default library for the configured target.
  pub fn default_lib_file_name(&self) -> &'static str {
    match self.target {
      ScriptTarget::Es3 | ScriptTarget::Es5 => "lib.d.ts",
      ScriptTarget::Es2015 => "lib.es6.d.ts",
      ScriptTarget::Es2016 => "lib.es2016.full.d.ts",
      ScriptTarget::Es2017 => "lib.es2017.full.d.ts",
      ScriptTarget::Es2018 => "lib.es2018.full.d.ts",
      ScriptTarget::Es2019 => "lib.es2019.full.d.ts",
      ScriptTarget::Es2020 => "lib.es2020.full.d.ts",
      ScriptTarget::Es2021 => "lib.es2021.full.d.ts",
      ScriptTarget::Es2022 => "lib.es2022.full.d.ts",
      ScriptTarget::EsNext => "lib.esnext.full.d.ts",
    }
  }
}

#[derive(Clone, Debug)]
pub struct ProjectConfig {
  /// The config file that was found, if any.
  pub config_path: Option<PathBuf>,
  /// Normalised directory the root files were discovered under.
  pub root_dir: String,
  pub settings: CompilerSettings,
  /// Normalised root files, sorted.
  pub root_files: Vec<String>,
  /// Normalised directory the default library is looked up in.
  pub lib_dir: String,
}

impl ProjectConfig {
  /// A configuration with default settings and the given roots, for hosts
  /// that are not backed by a real project directory.
  pub fn new(root_dir: &str, root_files: Vec<String>) -> Self {
    let root_dir = normalize_path_str(root_dir);
    let lib_dir = lib_dir_for(&root_dir);
    Self {
      config_path: None,
      root_dir,
      settings: CompilerSettings::default(),
      root_files: root_files
        .iter()
        .map(|file| normalize_path_str(file))
        .collect(),
      lib_dir,
    }
  }

  /// Find and load the project configuration governing `workspace`.
  ///
  /// `tsconfig.json` is looked for in `workspace` and each of its ancestors
  /// before `jsconfig.json` is. Without either, `workspace` itself is the
  /// project directory with default settings.
  pub fn discover(workspace: &Path) -> Result<ProjectConfig, ConfigError> {
    let workspace = workspace.canonicalize().map_err(|source| ConfigError::Read {
      path: workspace.to_path_buf(),
      source,
    })?;
    let config_path = find_config_file(&workspace);
    let (root, raw) = match &config_path {
      Some(path) => {
        let mut visited = HashSet::new();
        let raw = load_raw_config(path, &mut visited)?;
        let root = path.parent().unwrap_or(workspace.as_path()).to_path_buf();
        (root, raw)
      }
      None => (workspace.clone(), RawConfig::default()),
    };
    let root_dir = normalize_path(&root);
    let settings = settings_from_raw(&raw.compiler_options, &root_dir)?;
    let root_files = discover_root_files(&root, &root_dir, &raw)?;
    let workspace_dir = normalize_path(&workspace);
    debug!(
      config = ?config_path,
      root_dir = %root_dir,
      roots = root_files.len(),
      "project configuration loaded"
    );
    Ok(ProjectConfig {
      config_path,
      root_dir,
      settings,
      root_files,
      lib_dir: lib_dir_for(&workspace_dir),
    })
  }
}

fn lib_dir_for(workspace_dir: &str) -> String {
  match std::env::var(LIB_DIR_ENV) {
    Ok(dir) if !dir.trim().is_empty() => normalize_path_str(&dir),
    _ => join(workspace_dir, "node_modules/typescript/lib"),
  }
}

fn find_config_file(workspace: &Path) -> Option<PathBuf> {
  CONFIG_FILE_NAMES.iter().find_map(|name| {
    workspace
      .ancestors()
      .map(|dir| dir.join(name))
      .find(|candidate| candidate.is_file())
  })
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
  #[serde(default)]
  extends: Option<String>,
  #[serde(default)]
  compiler_options: RawCompilerOptions,
  #[serde(default)]
  files: Option<Vec<String>>,
  #[serde(default)]
  include: Option<Vec<String>>,
  #[serde(default)]
  exclude: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCompilerOptions {
  #[serde(default)]
  allow_js: Option<bool>,
  #[serde(default)]
  target: Option<String>,
  #[serde(default)]
  jsx: Option<String>,
  #[serde(default)]
  lib: Option<Vec<String>>,
  #[serde(default)]
  base_url: Option<String>,
}

fn load_raw_config(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<RawConfig, ConfigError> {
  let canonical = path.canonicalize().map_err(|source| ConfigError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  if !visited.insert(canonical.clone()) {
    return Err(ConfigError::ExtendsCycle(canonical));
  }
  let text = fs::read_to_string(&canonical).map_err(|source| ConfigError::Read {
    path: canonical.clone(),
    source,
  })?;
  let mut current: RawConfig = json5::from_str(&text).map_err(|err| ConfigError::Parse {
    path: canonical.clone(),
    message: err.to_string(),
  })?;

  let Some(extends) = current.extends.take() else {
    return Ok(current);
  };
  let config_dir = canonical.parent().unwrap_or(Path::new("/"));
  let extends_path = resolve_extends_path(config_dir, &extends)?;
  let mut base = load_raw_config(&extends_path, visited)?;
  // Relative `baseUrl` in a base config is relative to that config.
  if let Some(base_url) = base.compiler_options.base_url.take() {
    let base_dir = extends_path.parent().unwrap_or(Path::new("/"));
    base.compiler_options.base_url = Some(base_dir.join(base_url).to_string_lossy().into_owned());
  }
  Ok(merge_raw_configs(base, current))
}

fn resolve_extends_path(config_dir: &Path, extends: &str) -> Result<PathBuf, ConfigError> {
  let unresolved = || ConfigError::UnresolvedExtends {
    extends: extends.to_string(),
    from: config_dir.to_path_buf(),
  };
  if extends.starts_with('.') || Path::new(extends).is_absolute() {
    return resolve_extends_file(&config_dir.join(extends)).ok_or_else(unresolved);
  }
  config_dir
    .ancestors()
    .find_map(|ancestor| resolve_extends_file(&ancestor.join("node_modules").join(extends)))
    .ok_or_else(unresolved)
}

fn resolve_extends_file(candidate: &Path) -> Option<PathBuf> {
  let mut attempts = vec![candidate.to_path_buf()];
  if candidate.extension().is_none() {
    attempts.push(candidate.with_extension("json"));
  }
  attempts.push(candidate.join("tsconfig.json"));
  attempts.into_iter().find(|attempt| attempt.is_file())
}

fn merge_raw_configs(base: RawConfig, overlay: RawConfig) -> RawConfig {
  let (base_opts, overlay_opts) = (base.compiler_options, overlay.compiler_options);
  RawConfig {
    extends: None,
    compiler_options: RawCompilerOptions {
      allow_js: overlay_opts.allow_js.or(base_opts.allow_js),
      target: overlay_opts.target.or(base_opts.target),
      jsx: overlay_opts.jsx.or(base_opts.jsx),
      lib: overlay_opts.lib.or(base_opts.lib),
      base_url: overlay_opts.base_url.or(base_opts.base_url),
    },
    files: overlay.files.or(base.files),
    include: overlay.include.or(base.include),
    exclude: overlay.exclude.or(base.exclude),
  }
}

fn settings_from_raw(raw: &RawCompilerOptions, root_dir: &str) -> Result<CompilerSettings, ConfigError> {
  let mut settings = CompilerSettings::default();
  if let Some(allow_js) = raw.allow_js {
    settings.permit_untyped = allow_js;
  }
  if let Some(target) = raw.target.as_deref() {
    settings.target =
      parse_script_target(target).ok_or_else(|| ConfigError::UnknownTarget(target.to_string()))?;
  }
  if let Some(jsx) = raw.jsx.as_deref() {
    settings.jsx = parse_jsx_mode(jsx).ok_or_else(|| ConfigError::UnknownJsx(jsx.to_string()))?;
  }
  if let Some(libs) = raw.lib.as_ref() {
    settings.libs = libs.iter().map(|lib| lib_file_name(lib)).collect();
  }
  settings.base_url = raw.base_url.as_deref().map(|base_url| join(root_dir, base_url));
  Ok(settings)
}

fn parse_script_target(raw: &str) -> Option<ScriptTarget> {
  match raw.trim().to_ascii_lowercase().as_str() {
    "es3" => Some(ScriptTarget::Es3),
    "es5" => Some(ScriptTarget::Es5),
    "es2015" | "es6" => Some(ScriptTarget::Es2015),
    "es2016" => Some(ScriptTarget::Es2016),
    "es2017" => Some(ScriptTarget::Es2017),
    "es2018" => Some(ScriptTarget::Es2018),
    "es2019" => Some(ScriptTarget::Es2019),
    "es2020" => Some(ScriptTarget::Es2020),
    "es2021" => Some(ScriptTarget::Es2021),
    "es2022" => Some(ScriptTarget::Es2022),
    "esnext" | "latest" => Some(ScriptTarget::EsNext),
    _ => None,
  }
}

fn parse_jsx_mode(raw: &str) -> Option<JsxMode> {
  match raw.trim().to_ascii_lowercase().as_str() {
    "preserve" => Some(JsxMode::Preserve),
    "react" => Some(JsxMode::React),
    "react-native" => Some(JsxMode::ReactNative),
    "react-jsx" => Some(JsxMode::ReactJsx),
    "react-jsxdev" => Some(JsxMode::ReactJsxdev),
    _ => None,
  }
}

/// `"ES2017"` -> `"lib.es2017.d.ts"`, `"dom.iterable"` -> `"lib.dom.iterable.d.ts"`.
fn lib_file_name(lib: &str) -> String {
  format!("lib.{}.d.ts", lib.trim().to_ascii_lowercase())
}

fn discover_root_files(
  root: &Path,
  root_dir: &str,
  raw: &RawConfig,
) -> Result<Vec<String>, ConfigError> {
  let mut files = match raw.files.as_ref() {
    Some(files) => files.iter().map(|file| join(root_dir, file)).collect(),
    None => {
      let include = raw
        .include
        .clone()
        .unwrap_or_else(|| vec!["**/*".to_string()]);
      let exclude = raw.exclude.clone().unwrap_or_else(|| {
        vec![
          "node_modules".to_string(),
          "bower_components".to_string(),
          "jspm_packages".to_string(),
        ]
      });
      let include_set = build_globset(&include)?;
      let exclude_set = build_globset(&exclude)?;

      let mut files = Vec::new();
      for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
      {
        if !entry.file_type().is_file() || !is_supported_source_file(entry.path()) {
          continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
          continue;
        };
        if include_set.is_match(rel) && !exclude_set.is_match(rel) {
          files.push(normalize_path(entry.path()));
        }
      }
      files
    }
  };
  files.sort();
  files.dedup();
  Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, ConfigError> {
  let mut builder = GlobSetBuilder::new();
  for pattern in patterns {
    let trimmed = pattern.trim().trim_start_matches("./");
    if trimmed.is_empty() {
      continue;
    }
    let expanded = expand_directory_pattern(trimmed);
    let glob = Glob::new(&expanded).map_err(|source| ConfigError::Glob {
      pattern: pattern.clone(),
      source,
    })?;
    builder.add(glob);
  }
  builder.build().map_err(|source| ConfigError::Glob {
    pattern: patterns.join(", "),
    source,
  })
}

/// A bare directory name matches everything below it.
fn expand_directory_pattern(pattern: &str) -> String {
  if pattern.chars().any(|ch| matches!(ch, '*' | '?' | '[' | ']')) {
    return pattern.to_string();
  }
  let trimmed = pattern.trim_end_matches('/');
  if trimmed.is_empty() {
    return "**/*".to_string();
  }
  match Path::new(trimmed).extension() {
    Some(_) => trimmed.to_string(),
    None => format!("{trimmed}/**/*"),
  }
}

fn is_supported_source_file(path: &Path) -> bool {
  let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
  if name.ends_with(".d.ts") || name.ends_with(MIXED_CONTENT_EXTENSION) {
    return true;
  }
  matches!(
    path.extension().and_then(|e| e.to_str()),
    Some("ts" | "tsx" | "js" | "jsx")
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;

  #[test]
  fn discovers_roots_with_default_excludes() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("src/components")).unwrap();
    fs::create_dir_all(root.join("node_modules/vue")).unwrap();
    fs::write(root.join("src/main.ts"), "").unwrap();
    fs::write(root.join("src/components/App.vue"), "").unwrap();
    fs::write(root.join("src/readme.md"), "").unwrap();
    fs::write(root.join("node_modules/vue/index.d.ts"), "").unwrap();

    let config = ProjectConfig::discover(root).unwrap();
    let names: Vec<_> = config
      .root_files
      .iter()
      .map(|file| file.rsplit('/').next().unwrap().to_string())
      .collect();
    assert_eq!(names, ["App.vue", "main.ts"]);
    assert_eq!(config.settings, CompilerSettings::default());
  }

  #[test]
  fn follows_extends_and_prefers_overlay() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(
      root.join("base.json"),
      "{ compilerOptions: { target: 'es2015', allowJs: false, baseUrl: './src' } }",
    )
    .unwrap();
    fs::write(
      root.join("tsconfig.json"),
      "{\n  // comment\n  \"extends\": \"./base\",\n  \"compilerOptions\": { \"target\": \"ES2020\", },\n  \"files\": [\"a.ts\"],\n}",
    )
    .unwrap();

    let config = ProjectConfig::discover(root).unwrap();
    assert_eq!(config.settings.target, ScriptTarget::Es2020);
    assert!(!config.settings.permit_untyped);
    assert_eq!(config.settings.default_lib_file_name(), "lib.es2020.full.d.ts");
    let root_dir = normalize_path(&root.canonicalize().unwrap());
    assert_eq!(config.settings.base_url, Some(join(&root_dir, "src")));
    assert_eq!(config.root_files, [join(&root_dir, "a.ts")]);
  }

  #[test]
  fn jsconfig_is_used_when_no_tsconfig_exists() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("jsconfig.json"), "{ \"compilerOptions\": { \"jsx\": \"react\" } }").unwrap();
    let config = ProjectConfig::discover(dir.path()).unwrap();
    assert!(config.config_path.unwrap().ends_with("jsconfig.json"));
    assert_eq!(config.settings.jsx, JsxMode::React);
  }

  #[test]
  fn rejects_extends_cycles_and_unknown_targets() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("tsconfig.json"), "{ \"extends\": \"./other.json\" }").unwrap();
    fs::write(dir.path().join("other.json"), "{ \"extends\": \"./tsconfig.json\" }").unwrap();
    assert!(matches!(
      ProjectConfig::discover(dir.path()),
      Err(ConfigError::ExtendsCycle(_))
    ));

    fs::write(dir.path().join("tsconfig.json"), "{ \"compilerOptions\": { \"target\": \"es1\" } }").unwrap();
    assert!(matches!(
      ProjectConfig::discover(dir.path()),
      Err(ConfigError::UnknownTarget(target)) if target == "es1"
    ));
  }
}
