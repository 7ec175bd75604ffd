use serde::Serialize;
use std::fmt;

/// Which variant of the script language a file (or a component's script block)
/// is written in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
  #[default]
  Js,
  Jsx,
  Ts,
  Tsx,
}

impl Dialect {
  /// Typed dialects are the TypeScript ones; everything else needs the
  /// "permit untyped script" setting to be analysed.
  pub fn is_typed(self) -> bool {
    matches!(self, Dialect::Ts | Dialect::Tsx)
  }

  /// Dialect declared by a script block's `lang` attribute.
  pub fn from_lang(lang: Option<&str>) -> Dialect {
    let Some(lang) = lang else {
      return Dialect::Js;
    };
    match lang.trim().to_ascii_lowercase().as_str() {
      "ts" | "typescript" => Dialect::Ts,
      "tsx" => Dialect::Tsx,
      "jsx" => Dialect::Jsx,
      _ => Dialect::Js,
    }
  }

  /// Dialect of an ordinary script file, derived from its extension.
  pub fn from_path(path: &str) -> Dialect {
    let lower = path.to_ascii_lowercase();
    if lower.ends_with(".tsx") {
      Dialect::Tsx
    } else if lower.ends_with(".ts") || lower.ends_with(".mts") || lower.ends_with(".cts") {
      Dialect::Ts
    } else if lower.ends_with(".jsx") {
      Dialect::Jsx
    } else {
      Dialect::Js
    }
  }

  /// Extension reported alongside a resolved module of this dialect.
  pub fn extension(self) -> &'static str {
    match self {
      Dialect::Js => ".js",
      Dialect::Jsx => ".jsx",
      Dialect::Ts => ".ts",
      Dialect::Tsx => ".tsx",
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Dialect::Js => "js",
      Dialect::Jsx => "jsx",
      Dialect::Ts => "ts",
      Dialect::Tsx => "tsx",
    }
  }
}

impl fmt::Display for Dialect {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::Dialect;

  #[test]
  fn lang_attribute_mapping() {
    assert_eq!(Dialect::from_lang(Some("ts")), Dialect::Ts);
    assert_eq!(Dialect::from_lang(Some("TypeScript")), Dialect::Ts);
    assert_eq!(Dialect::from_lang(Some("tsx")), Dialect::Tsx);
    assert_eq!(Dialect::from_lang(Some("jsx")), Dialect::Jsx);
    assert_eq!(Dialect::from_lang(Some("coffee")), Dialect::Js);
    assert_eq!(Dialect::from_lang(None), Dialect::Js);
  }

  #[test]
  fn extension_mapping() {
    assert_eq!(Dialect::from_path("/a/b.d.ts"), Dialect::Ts);
    assert_eq!(Dialect::from_path("/a/b.tsx"), Dialect::Tsx);
    assert_eq!(Dialect::from_path("/a/b.mjs"), Dialect::Js);
    assert!(Dialect::Tsx.is_typed());
    assert!(!Dialect::Jsx.is_typed());
  }
}
