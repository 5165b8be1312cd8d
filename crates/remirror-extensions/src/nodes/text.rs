//! Inline text.

use remirror_core::{Extension, ExtensionContext, ExtensionDescriptor, NodeExtension, Tag};
use remirror_model::NodeSpec;

/// Contributes the `text` node every schema needs.
pub struct TextExtension;

impl TextExtension {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextExtension {
    fn default() -> Self {
        Self::new()
    }
}

impl Extension for TextExtension {
    fn descriptor(&self) -> ExtensionDescriptor {
        ExtensionDescriptor::new("text").tag(Tag::InlineNode)
    }

    fn as_node(&self) -> Option<&dyn NodeExtension> {
        Some(self)
    }
}

impl NodeExtension for TextExtension {
    fn node_spec(&self, _cx: &ExtensionContext<'_>) -> NodeSpec {
        NodeSpec::new().inline()
    }
}
