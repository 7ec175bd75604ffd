//! Reading component options out of a patched component script.

use crate::parser::SourceTree;
use parse_js::ast::{
  ArrayElement, ClassOrObjectMemberKey, ClassOrObjectMemberValue, ExportNames, Node, ObjectMemberType,
  Syntax,
};

fn top_level(tree: &SourceTree) -> &[Node] {
  match tree.stx.as_ref() {
    Syntax::TopLevel { body } => body.as_slice(),
    _ => &[],
  }
}

fn pattern_name(node: &Node) -> Option<&str> {
  match node.stx.as_ref() {
    Syntax::IdentifierPattern { name } => Some(name.as_str()),
    _ => None,
  }
}

/// A default import at the top level of a module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DefaultImport {
  pub binding: String,
  pub specifier: String,
}

pub fn default_imports(tree: &SourceTree) -> Vec<DefaultImport> {
  top_level(tree)
    .iter()
    .filter_map(|stmt| match stmt.stx.as_ref() {
      Syntax::ImportStmt {
        default: Some(default),
        module,
        ..
      } => Some(DefaultImport {
        binding: pattern_name(default)?.to_string(),
        specifier: module.clone(),
      }),
      _ => None,
    })
    .collect()
}

/// Module specifiers of every top-level import and re-export, in order.
pub fn module_specifiers(tree: &SourceTree) -> Vec<String> {
  let mut specifiers: Vec<String> = Vec::new();
  for stmt in top_level(tree) {
    let specifier = match stmt.stx.as_ref() {
      Syntax::ImportStmt { module, .. } => Some(module),
      Syntax::ExportListStmt { from, .. } => from.as_ref(),
      _ => None,
    };
    if let Some(specifier) = specifier {
      if !specifiers.contains(specifier) {
        specifiers.push(specifier.clone());
      }
    }
  }
  specifiers
}

/// Whether the module has a default export of any form.
pub fn has_default_export(tree: &SourceTree) -> bool {
  top_level(tree).iter().any(|stmt| match stmt.stx.as_ref() {
    Syntax::ExportDefaultExprStmt { .. } => true,
    Syntax::FunctionDecl { export_default, .. } | Syntax::ClassDecl { export_default, .. } => *export_default,
    Syntax::ExportListStmt {
      names: ExportNames::Specific(names),
      ..
    } => names
      .iter()
      .any(|name| pattern_name(&name.alias) == Some("default")),
    _ => false,
  })
}

/// `export default callee({ ... })`: the callee's name and the members of the
/// object literal.
pub fn default_export_call(tree: &SourceTree) -> Option<(&str, &[Node])> {
  top_level(tree).iter().find_map(|stmt| {
    let Syntax::ExportDefaultExprStmt { expression } = stmt.stx.as_ref() else {
      return None;
    };
    let Syntax::CallExpr { callee, arguments, .. } = expression.stx.as_ref() else {
      return None;
    };
    let Syntax::IdentifierExpr { name: callee } = callee.stx.as_ref() else {
      return None;
    };
    let [argument] = arguments.as_slice() else {
      return None;
    };
    let Syntax::CallArg { spread: false, value } = argument.stx.as_ref() else {
      return None;
    };
    match value.stx.as_ref() {
      Syntax::LiteralObjectExpr { members } => Some((callee.as_str(), members.as_slice())),
      _ => None,
    }
  })
}

/// The options of a component definition object that carry names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComponentOptions {
  pub name: Option<String>,
  pub props: Vec<String>,
  pub computed: Vec<String>,
  pub methods: Vec<String>,
  pub data: Vec<String>,
  /// (registered name, local binding) of each child component.
  pub components: Vec<(String, String)>,
}

impl ComponentOptions {
  pub fn read(members: &[Node]) -> ComponentOptions {
    let mut options = ComponentOptions::default();
    for member in members {
      let Some((key, value)) = member_entry(member) else {
        continue;
      };
      match key {
        "name" => {
          if let Some(Syntax::LiteralStringExpr { value }) = value.map(|value| value.stx.as_ref()) {
            options.name = Some(value.clone());
          }
        }
        "props" => options.props = value.map(declared_names).unwrap_or_default(),
        "computed" => options.computed = value.map(object_keys).unwrap_or_default(),
        "methods" => options.methods = value.map(object_keys).unwrap_or_default(),
        "components" => options.components = value.map(registered_components).unwrap_or_default(),
        "data" => {
          options.data = data_function(member)
            .and_then(returned_object)
            .map(keys_of)
            .unwrap_or_default()
        }
        _ => {}
      }
    }
    options
  }
}

/// Direct keys written as string literals keep their quotes.
fn unquote(key: &str) -> &str {
  for quote in ['\'', '"'] {
    if let Some(inner) = key.strip_prefix(quote).and_then(|key| key.strip_suffix(quote)) {
      return inner;
    }
  }
  key
}

fn direct_member(member: &Node) -> Option<(&str, &ClassOrObjectMemberValue)> {
  match member.stx.as_ref() {
    Syntax::ObjectMember {
      typ: ObjectMemberType::Valued {
        key: ClassOrObjectMemberKey::Direct(key),
        value,
      },
    } => Some((unquote(key), value)),
    _ => None,
  }
}

/// The key of a member and, for plain properties, its value.
fn member_entry(member: &Node) -> Option<(&str, Option<&Node>)> {
  if let Some((key, value)) = direct_member(member) {
    let value = match value {
      ClassOrObjectMemberValue::Property { initializer } => initializer.as_ref(),
      _ => None,
    };
    return Some((key, value));
  }
  match member.stx.as_ref() {
    Syntax::ObjectMember {
      typ: ObjectMemberType::Shorthand { identifier },
    } => match identifier.stx.as_ref() {
      Syntax::IdentifierExpr { name } => Some((name.as_str(), None)),
      _ => None,
    },
    _ => None,
  }
}

fn keys_of(members: &[Node]) -> Vec<String> {
  members
    .iter()
    .filter_map(member_entry)
    .map(|(key, _)| key.to_string())
    .collect()
}

fn object_members(value: &Node) -> Option<&[Node]> {
  match value.stx.as_ref() {
    Syntax::LiteralObjectExpr { members } => Some(members.as_slice()),
    _ => None,
  }
}

fn object_keys(value: &Node) -> Vec<String> {
  object_members(value).map(keys_of).unwrap_or_default()
}

/// Prop names from either `props: { a: ... }` or `props: ['a']`.
fn declared_names(value: &Node) -> Vec<String> {
  match value.stx.as_ref() {
    Syntax::LiteralObjectExpr { members } => keys_of(members),
    Syntax::LiteralArrayExpr { elements } => elements
      .iter()
      .filter_map(|element| match element {
        ArrayElement::Single(value) => match value.stx.as_ref() {
          Syntax::LiteralStringExpr { value } => Some(value.clone()),
          _ => None,
        },
        _ => None,
      })
      .collect(),
    _ => Vec::new(),
  }
}

fn registered_components(value: &Node) -> Vec<(String, String)> {
  let Some(members) = object_members(value) else {
    return Vec::new();
  };
  members
    .iter()
    .filter_map(|member| {
      let binding = match member.stx.as_ref() {
        Syntax::ObjectMember {
          typ: ObjectMemberType::Shorthand { identifier },
        } => identifier,
        _ => match direct_member(member)? {
          (_, ClassOrObjectMemberValue::Property {
            initializer: Some(value),
          }) => value,
          _ => return None,
        },
      };
      let (key, _) = member_entry(member)?;
      match binding.stx.as_ref() {
        Syntax::IdentifierExpr { name } => Some((key.to_string(), name.clone())),
        _ => None,
      }
    })
    .collect()
}

/// `data() {}`, `data: function () {}` or `data: () => ...`, as the
/// underlying function node.
fn data_function(member: &Node) -> Option<&Node> {
  let (_, value) = direct_member(member)?;
  match value {
    ClassOrObjectMemberValue::Method { function } => Some(function),
    ClassOrObjectMemberValue::Property {
      initializer: Some(value),
    } => match value.stx.as_ref() {
      Syntax::FunctionExpr { function, .. } | Syntax::ArrowFunctionExpr { function, .. } => Some(function),
      _ => None,
    },
    _ => None,
  }
}

fn returned_object(function: &Node) -> Option<&[Node]> {
  let Syntax::Function { body, .. } = function.stx.as_ref() else {
    return None;
  };
  let returned = match body.stx.as_ref() {
    Syntax::FunctionBody { body } => body.iter().find_map(|stmt| match stmt.stx.as_ref() {
      Syntax::ReturnStmt { value } => value.as_ref(),
      _ => None,
    })?,
    // Arrow functions with an expression body.
    _ => body,
  };
  object_members(returned)
}
