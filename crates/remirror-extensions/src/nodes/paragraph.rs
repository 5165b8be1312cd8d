//! The default textblock.

use remirror_core::commands::{is_node_active, set_block_type};
use remirror_core::{
    CommandSpec, Extension, ExtensionContext, ExtensionDescriptor, KeyBinding, NodeExtension,
    Priority, Tag,
};
use remirror_model::{Attrs, DomOutput, NodeSpec, ParseRule};

/// Contributes `paragraph`. It runs ahead of other textblocks so it is the
/// schema's default textblock.
pub struct ParagraphExtension;

impl ParagraphExtension {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ParagraphExtension {
    fn default() -> Self {
        Self::new()
    }
}

impl Extension for ParagraphExtension {
    fn descriptor(&self) -> ExtensionDescriptor {
        ExtensionDescriptor::new("paragraph")
            .priority(Priority::HIGH)
            .tag(Tag::BlockNode)
            .tag(Tag::TextBlock)
            .tag(Tag::LastNodeCompatible)
    }

    fn as_node(&self) -> Option<&dyn NodeExtension> {
        Some(self)
    }

    fn commands(&self, _cx: &ExtensionContext<'_>) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("convertParagraph", |props, _| {
                set_block_type(props, "paragraph", Attrs::new())
            })
            .with_active(|state, _| is_node_active(state, "paragraph", &Attrs::new())),
        ]
    }

    fn keymap(&self, _cx: &ExtensionContext<'_>) -> Vec<KeyBinding> {
        vec![KeyBinding::new("Mod-Shift-0", |props| {
            set_block_type(props, "paragraph", Attrs::new())
        })]
    }
}

impl NodeExtension for ParagraphExtension {
    fn node_spec(&self, _cx: &ExtensionContext<'_>) -> NodeSpec {
        NodeSpec::new()
            .content("inline*")
            .parse_rule(ParseRule::tag("p"))
            .to_dom(|_| DomOutput::new("p"))
    }
}
