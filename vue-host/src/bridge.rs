//! The synthetic bridge module every component script imports after patching.

use crate::dialect::Dialect;

/// Reserved module specifier of the bridge.
pub const BRIDGE_MODULE_NAME: &str = "vue-editor-bridge";

/// Local binding the patch introduces for the bridge's default export.
pub const BRIDGE_BINDING: &str = "__vueEditorBridge";

/// File identity of the bridge. Normalised project paths always start with `/`
/// or a single drive letter, so a multi-letter scheme can never collide.
pub const BRIDGE_PATH: &str = "vue-host:/vue-editor-bridge.ts";

pub const BRIDGE_VERSION: u64 = 0;

pub const BRIDGE_DIALECT: Dialect = Dialect::Ts;

pub const BRIDGE_SOURCE: &str = "import Vue from 'vue';\nconst func = Vue.extend;\nexport default func;\n";

pub fn is_bridge_module(specifier: &str) -> bool {
  specifier == BRIDGE_MODULE_NAME
}

pub fn is_bridge_path(path: &str) -> bool {
  path == BRIDGE_PATH
}
