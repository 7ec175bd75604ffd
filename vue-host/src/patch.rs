//! Source-rewrite patch for component scripts.
//!
//! `export default { ... }` becomes `export default __vueEditorBridge({ ... })`
//! and `import __vueEditorBridge from "vue-editor-bridge"` is spliced in as the
//! first statement. Every synthesized node sits at a zero-width location, and
//! nodes from the source keep their original locations.

use crate::bridge::{BRIDGE_BINDING, BRIDGE_MODULE_NAME};
use crate::parser::SourceTree;
use parse_js::ast::{Node, Syntax};
use parse_js::loc::Loc;

/// Rewrite a component script in place. Returns whether the tree changed.
///
/// Only a top-level default export of an object literal is rewritten; any
/// other shape is left alone.
pub fn rewrite_component_module(tree: &mut SourceTree) -> bool {
  let Syntax::TopLevel { body } = tree.stx.as_mut() else {
    return false;
  };
  let Some(export_idx) = body.iter().position(is_default_exported_object) else {
    return false;
  };
  let Syntax::ExportDefaultExprStmt { expression } = body[export_idx].stx.as_mut() else {
    return false;
  };
  let loc = expression.loc;
  let object = std::mem::replace(expression, identifier(Loc(loc.0, loc.0)));
  *expression = wrap_in_bridge_call(object);
  body.insert(0, bridge_import());
  true
}

fn is_default_exported_object(stmt: &Node) -> bool {
  match stmt.stx.as_ref() {
    Syntax::ExportDefaultExprStmt { expression } => {
      matches!(expression.stx.as_ref(), Syntax::LiteralObjectExpr { .. })
    }
    _ => false,
  }
}

fn identifier(loc: Loc) -> Node {
  Node::new(loc, Syntax::IdentifierExpr {
    name: BRIDGE_BINDING.to_string(),
  })
}

/// `__vueEditorBridge(object)`: the call spans exactly the object literal and
/// the callee is zero-width at its start.
fn wrap_in_bridge_call(object: Node) -> Node {
  let loc = object.loc;
  let callee = identifier(Loc(loc.0, loc.0));
  let argument = Node::new(loc, Syntax::CallArg {
    spread: false,
    value: object,
  });
  Node::new(loc, Syntax::CallExpr {
    optional_chaining: false,
    parenthesised: false,
    callee,
    arguments: vec![argument],
  })
}

/// `import __vueEditorBridge from "vue-editor-bridge";` at the start of the file.
fn bridge_import() -> Node {
  let start = Loc(0, 0);
  Node::new(start, Syntax::ImportStmt {
    default: Some(Node::new(start, Syntax::IdentifierPattern {
      name: BRIDGE_BINDING.to_string(),
    })),
    names: None,
    module: BRIDGE_MODULE_NAME.to_string(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use parse_js::ast::{ClassOrObjectMemberKey, ObjectMemberType};
  use parse_js::visit::{JourneyControls, Visitor};

  #[derive(Default)]
  struct Positions {
    ids: Vec<(String, Loc)>,
    keys: Vec<(String, Loc)>,
  }

  impl Visitor for Positions {
    fn on_syntax_down(&mut self, node: &Node, _ctl: &mut JourneyControls) {
      match node.stx.as_ref() {
        Syntax::IdentifierExpr { name } => self.ids.push((name.clone(), node.loc)),
        Syntax::ObjectMember {
          typ: ObjectMemberType::Valued {
            key: ClassOrObjectMemberKey::Direct(key),
            ..
          },
        } => self.keys.push((key.clone(), node.loc)),
        _ => {}
      }
    }
  }

  fn parse(source: &str) -> SourceTree {
    parse_js::parse(source.as_bytes()).unwrap()
  }

  fn body(tree: &SourceTree) -> &[Node] {
    match tree.stx.as_ref() {
      Syntax::TopLevel { body } => body.as_slice(),
      other => panic!("not a module: {other:?}"),
    }
  }

  #[test]
  fn wraps_default_export_and_imports_bridge() {
    let source = "export default { props: { a: Number } }";
    let mut tree = parse(source);
    assert!(rewrite_component_module(&mut tree));

    let body = body(&tree);
    assert_eq!(body.len(), 2);
    let Syntax::ImportStmt { default, module, .. } = body[0].stx.as_ref() else {
      panic!("first statement is not an import");
    };
    assert_eq!(module, BRIDGE_MODULE_NAME);
    assert_eq!(default.as_ref().map(|binding| binding.loc), Some(Loc(0, 0)));
    assert_eq!(body[0].loc, Loc(0, 0));

    let Syntax::ExportDefaultExprStmt { expression } = body[1].stx.as_ref() else {
      panic!("default export moved");
    };
    let Syntax::CallExpr { callee, arguments, .. } = expression.stx.as_ref() else {
      panic!("default export is not a call");
    };
    assert!(matches!(
      callee.stx.as_ref(),
      Syntax::IdentifierExpr { name } if name == BRIDGE_BINDING
    ));
    let [argument] = arguments.as_slice() else {
      panic!("expected one argument");
    };
    let Syntax::CallArg { spread: false, value } = argument.stx.as_ref() else {
      panic!("argument is not a plain call argument");
    };
    assert!(matches!(value.stx.as_ref(), Syntax::LiteralObjectExpr { .. }));

    let mut positions = Positions::default();
    positions.visit(&tree);
    let key_at = |name: &str| {
      positions
        .keys
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, loc)| loc.0)
    };
    assert_eq!(key_at("props"), source.find("props"));
    assert_eq!(key_at("a"), source.find("a:"));
    let number = positions
      .ids
      .iter()
      .find(|(name, _)| name == "Number")
      .map(|(_, loc)| *loc);
    let start = source.find("Number").unwrap();
    assert_eq!(number, Some(Loc(start, start + "Number".len())));
  }

  #[test]
  fn synthesized_callee_is_zero_width() {
    let source = "const x = 1;\nexport default {}";
    let mut tree = parse(source);
    assert!(rewrite_component_module(&mut tree));
    let mut positions = Positions::default();
    positions.visit(&tree);
    let object_start = source.find('{').unwrap();
    let (_, loc) = positions
      .ids
      .iter()
      .find(|(name, _)| name == BRIDGE_BINDING)
      .unwrap();
    assert_eq!(*loc, Loc(object_start, object_start));
  }

  #[test]
  fn leaves_other_default_exports_alone() {
    for source in [
      "export default function () {}",
      "const c = {};\nexport default c;",
      "export const a = {};",
      "",
    ] {
      let mut tree = parse(source);
      let before = body(&tree).len();
      assert!(!rewrite_component_module(&mut tree), "{source}");
      assert_eq!(body(&tree).len(), before);
    }
  }
}
