//! The top-level document node.

use remirror_core::{Extension, ExtensionContext, ExtensionDescriptor, NodeExtension};
use remirror_model::NodeSpec;
use serde_json::json;

/// Contributes the `doc` node. Its content expression is the static
/// `content` option, `block+` by default.
pub struct DocExtension;

impl DocExtension {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocExtension {
    fn default() -> Self {
        Self::new()
    }
}

impl Extension for DocExtension {
    fn descriptor(&self) -> ExtensionDescriptor {
        ExtensionDescriptor::new("doc").static_option("content", json!("block+"))
    }

    fn as_node(&self) -> Option<&dyn NodeExtension> {
        Some(self)
    }
}

impl NodeExtension for DocExtension {
    fn node_spec(&self, cx: &ExtensionContext<'_>) -> NodeSpec {
        NodeSpec::new().content(cx.options.get_str("content").unwrap_or("block+"))
    }
}
