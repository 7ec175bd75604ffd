//! Deterministic path handling shared by the host, resolver and service.
//!
//! Every file identity inside the host is a normalised, POSIX-like string so
//! that the same file reached through an editor URI, a project config and an
//! import specifier always lands on the same Version Store key.

use std::path::Path;

/// Extension of the mixed-content documents the host virtualises.
pub const MIXED_CONTENT_EXTENSION: &str = ".vue";

/// Normalise an OS path into the host's file identity.
pub fn normalize_path(path: &Path) -> String {
  normalize_path_str(&path.to_string_lossy())
}

/// Normalise a path string into a deterministic, POSIX-like representation.
///
/// - Backslashes become `/`
/// - `.` segments are removed, `..` pops a segment
/// - Paths are rooted at `/` unless a drive letter prefix is present
/// - Drive letters are normalised to lowercase (`C:\foo` → `c:/foo`)
pub fn normalize_path_str(name: &str) -> String {
  let mut path = name.replace('\\', "/");
  if let Some(stripped) = path.strip_prefix("//?/") {
    path = stripped.to_string();
  }
  let mut rest = path.trim_start_matches('/');

  let mut drive = None;
  if rest.len() >= 2 {
    let bytes = rest.as_bytes();
    if bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
      let mut prefix = rest[..2].to_string();
      prefix.make_ascii_lowercase();
      drive = Some(prefix);
      rest = rest[2..].trim_start_matches('/');
    }
  }

  let mut components = Vec::new();
  for part in rest.split('/') {
    if part.is_empty() || part == "." {
      continue;
    }
    if part == ".." {
      components.pop();
      continue;
    }
    components.push(part);
  }

  let mut normalized = String::with_capacity(path.len() + 1);
  if let Some(drive) = drive {
    normalized.push_str(&drive);
  }
  normalized.push('/');
  normalized.push_str(&components.join("/"));
  normalized
}

/// Whether `path` names a mixed-content document.
pub fn is_mixed_content(path: &str) -> bool {
  path.len() > MIXED_CONTENT_EXTENSION.len()
    && path
      .get(path.len() - MIXED_CONTENT_EXTENSION.len()..)
      .is_some_and(|ext| ext.eq_ignore_ascii_case(MIXED_CONTENT_EXTENSION))
}

/// Parent directory of a normalised path. The root is its own parent.
pub fn parent_dir(path: &str) -> &str {
  match path.rfind('/') {
    Some(0) | None => "/",
    Some(idx) => {
      let parent = &path[..idx];
      // `c:` on its own is not a directory; keep the slash.
      if parent.len() == 2 && parent.as_bytes()[1] == b':' {
        &path[..=idx]
      } else {
        parent
      }
    }
  }
}

/// Join `rel` onto `dir` and normalise the result.
pub fn join(dir: &str, rel: &str) -> String {
  if rel.starts_with('/') {
    return normalize_path_str(rel);
  }
  let mut joined = String::with_capacity(dir.len() + rel.len() + 1);
  joined.push_str(dir);
  if !dir.ends_with('/') {
    joined.push('/');
  }
  joined.push_str(rel);
  normalize_path_str(&joined)
}

/// Whether a module specifier is relative to its containing file.
pub fn is_relative_specifier(specifier: &str) -> bool {
  specifier == "."
    || specifier == ".."
    || specifier.starts_with("./")
    || specifier.starts_with("../")
}

/// Whether a module specifier is an absolute path (POSIX or drive-letter).
pub fn is_absolute_specifier(specifier: &str) -> bool {
  if specifier.starts_with('/') || specifier.starts_with('\\') {
    return true;
  }
  let bytes = specifier.as_bytes();
  bytes.len() >= 3
    && bytes[0].is_ascii_alphabetic()
    && bytes[1] == b':'
    && matches!(bytes[2], b'/' | b'\\')
}
