//! Bold text.

use remirror_core::commands::{is_mark_active, toggle_mark};
use remirror_core::{
    CommandSpec, Extension, ExtensionContext, ExtensionDescriptor, InputRule, KeyBinding,
    MarkExtension, Tag,
};
use remirror_model::{Attrs, DomOutput, MarkSpec, ParseRule};

/// Contributes the `bold` mark, `toggleBold`, `Mod-b` and the `**text**`
/// input rule.
pub struct BoldExtension;

impl BoldExtension {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BoldExtension {
    fn default() -> Self {
        Self::new()
    }
}

impl Extension for BoldExtension {
    fn descriptor(&self) -> ExtensionDescriptor {
        ExtensionDescriptor::new("bold").tag(Tag::FormattingMark)
    }

    fn as_mark(&self) -> Option<&dyn MarkExtension> {
        Some(self)
    }

    fn commands(&self, _cx: &ExtensionContext<'_>) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("toggleBold", |props, _| toggle_mark(props, "bold", Attrs::new()))
                .with_active(|state, _| is_mark_active(state, "bold")),
        ]
    }

    fn keymap(&self, _cx: &ExtensionContext<'_>) -> Vec<KeyBinding> {
        vec![KeyBinding::new("Mod-b", |props| toggle_mark(props, "bold", Attrs::new()))]
    }

    fn input_rules(&self, _cx: &ExtensionContext<'_>) -> Vec<InputRule> {
        vec![InputRule::mark(r"\*\*([^*]+)\*\*$", "bold")]
    }
}

impl MarkExtension for BoldExtension {
    fn mark_spec(&self, _cx: &ExtensionContext<'_>) -> MarkSpec {
        MarkSpec::new()
            .parse_rule(ParseRule::tag("strong"))
            .parse_rule(ParseRule::tag("b"))
            .to_dom(|_| DomOutput::new("strong"))
    }
}
