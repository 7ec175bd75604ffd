//! Mixed-content extraction: pull the script block out of a single-file
//! component while keeping every byte offset where it was.

use crate::dialect::Dialect;
use std::ops::Range;

/// The script view of a mixed-content document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptBlock {
  /// Same byte length as the document. Bytes outside the script content are
  /// spaces; line terminators are kept so lines and columns line up too.
  pub text: String,
  pub dialect: Dialect,
  /// Byte range of the script content within the document, if there was one.
  pub content: Option<Range<usize>>,
}

/// Pure, stateless extraction of a document's script block.
pub trait ScriptExtractor {
  fn extract(&self, document: &str) -> ScriptBlock;
}

/// Extractor for `.vue` single-file components. Only top-level blocks are
/// considered and the first `<script>` wins.
#[derive(Clone, Copy, Debug, Default)]
pub struct SfcExtractor;

impl ScriptExtractor for SfcExtractor {
  fn extract(&self, document: &str) -> ScriptBlock {
    match find_script_block(document) {
      Some((content, lang)) => ScriptBlock {
        text: blank_outside(document, Some(content.clone())),
        dialect: Dialect::from_lang(lang.as_deref()),
        content: Some(content),
      },
      None => ScriptBlock {
        text: blank_outside(document, None),
        dialect: Dialect::default(),
        content: None,
      },
    }
  }
}

fn blank_outside(document: &str, keep: Option<Range<usize>>) -> String {
  let mut out = String::with_capacity(document.len());
  for (idx, ch) in document.char_indices() {
    let kept = keep.as_ref().is_some_and(|range| range.contains(&idx));
    if kept || ch == '\n' || ch == '\r' {
      out.push(ch);
    } else {
      out.extend(std::iter::repeat(' ').take(ch.len_utf8()));
    }
  }
  out
}

struct OpenTag {
  name: String,
  attrs: Vec<(String, Option<String>)>,
  self_closing: bool,
  /// Offset just past the closing `>`.
  end: usize,
}

fn find_script_block(document: &str) -> Option<(Range<usize>, Option<String>)> {
  let bytes = document.as_bytes();
  let mut pos = 0;
  while pos < bytes.len() {
    if bytes[pos] != b'<' {
      pos += 1;
      continue;
    }
    if bytes[pos..].starts_with(b"<!--") {
      pos = find_from(bytes, pos + 4, b"-->").map_or(bytes.len(), |end| end + 3);
      continue;
    }
    let Some(tag) = parse_open_tag(document, pos) else {
      pos += 1;
      continue;
    };
    if tag.self_closing {
      pos = tag.end;
      continue;
    }
    match tag.name.as_str() {
      "script" => {
        let close = find_close_tag(bytes, tag.end, "script").unwrap_or(bytes.len());
        let lang = tag
          .attrs
          .into_iter()
          .find(|(name, _)| name == "lang")
          .and_then(|(_, value)| value);
        return Some((tag.end..close, lang));
      }
      "template" => {
        pos = skip_nested_template(document, tag.end);
      }
      name => {
        pos = match find_close_tag(bytes, tag.end, name) {
          Some(close) => find_from(bytes, close, b">").map_or(bytes.len(), |gt| gt + 1),
          None => bytes.len(),
        };
      }
    }
  }
  None
}

fn parse_open_tag(document: &str, start: usize) -> Option<OpenTag> {
  let bytes = document.as_bytes();
  let mut pos = start + 1;
  let name_start = pos;
  while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'-') {
    pos += 1;
  }
  if pos == name_start || !bytes[name_start].is_ascii_alphabetic() {
    return None;
  }
  let name = document[name_start..pos].to_ascii_lowercase();
  let mut attrs = Vec::new();
  loop {
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
      pos += 1;
    }
    if pos >= bytes.len() {
      return None;
    }
    match bytes[pos] {
      b'>' => {
        return Some(OpenTag {
          name,
          attrs,
          self_closing: false,
          end: pos + 1,
        })
      }
      b'/' if bytes.get(pos + 1) == Some(&b'>') => {
        return Some(OpenTag {
          name,
          attrs,
          self_closing: true,
          end: pos + 2,
        })
      }
      _ => {}
    }
    let attr_start = pos;
    while pos < bytes.len() && !matches!(bytes[pos], b'=' | b'>' | b'/') && !bytes[pos].is_ascii_whitespace() {
      pos += 1;
    }
    if pos == attr_start {
      // Stray `/` or similar; skip it.
      pos += 1;
      continue;
    }
    let attr_name = document[attr_start..pos].to_ascii_lowercase();
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
      pos += 1;
    }
    if bytes.get(pos) != Some(&b'=') {
      attrs.push((attr_name, None));
      continue;
    }
    pos += 1;
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
      pos += 1;
    }
    let value = match bytes.get(pos) {
      Some(&quote @ (b'"' | b'\'')) => {
        let value_start = pos + 1;
        let value_end = bytes[value_start..]
          .iter()
          .position(|&b| b == quote)
          .map(|rel| value_start + rel)?;
        pos = value_end + 1;
        &document[value_start..value_end]
      }
      _ => {
        let value_start = pos;
        while pos < bytes.len() && bytes[pos] != b'>' && !bytes[pos].is_ascii_whitespace() {
          pos += 1;
        }
        &document[value_start..pos]
      }
    };
    attrs.push((attr_name, Some(value.to_string())));
  }
}

/// Whether `</name` (followed by a non-name byte) starts at `pos`.
fn is_close_tag_at(bytes: &[u8], pos: usize, name: &str) -> bool {
  let name_start = pos + 2;
  let name_end = name_start + name.len();
  bytes.len() >= name_end
    && bytes[pos..].starts_with(b"</")
    && bytes[name_start..name_end].eq_ignore_ascii_case(name.as_bytes())
    && bytes
      .get(name_end)
      .map_or(true, |&b| !(b.is_ascii_alphanumeric() || b == b'-'))
}

/// Offset of the `<` of the first `</name` at or after `from`.
fn find_close_tag(bytes: &[u8], from: usize, name: &str) -> Option<usize> {
  let mut pos = from;
  while let Some(lt) = find_from(bytes, pos, b"</") {
    if is_close_tag_at(bytes, lt, name) {
      return Some(lt);
    }
    pos = lt + 2;
  }
  None
}

/// Skip past the `</template>` matching an already-consumed `<template>`.
fn skip_nested_template(document: &str, from: usize) -> usize {
  let bytes = document.as_bytes();
  let mut depth = 1usize;
  let mut pos = from;
  while pos < bytes.len() {
    if bytes[pos] != b'<' {
      pos += 1;
      continue;
    }
    if bytes[pos..].starts_with(b"<!--") {
      pos = find_from(bytes, pos + 4, b"-->").map_or(bytes.len(), |end| end + 3);
      continue;
    }
    if is_close_tag_at(bytes, pos, "template") {
      depth -= 1;
      let after = find_from(bytes, pos, b">").map_or(bytes.len(), |gt| gt + 1);
      if depth == 0 {
        return after;
      }
      pos = after;
      continue;
    }
    if let Some(tag) = parse_open_tag(document, pos) {
      if tag.name == "template" && !tag.self_closing {
        depth += 1;
      }
      pos = tag.end;
      continue;
    }
    pos += 1;
  }
  bytes.len()
}

fn find_from(haystack: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
  if from >= haystack.len() {
    return None;
  }
  haystack[from..]
    .windows(needle.len())
    .position(|window| window == needle)
    .map(|rel| from + rel)
}
