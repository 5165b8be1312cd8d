//! Italic text.

use remirror_core::commands::{is_mark_active, toggle_mark};
use remirror_core::{
    CommandSpec, Extension, ExtensionContext, ExtensionDescriptor, InputRule, KeyBinding,
    MarkExtension, Tag,
};
use remirror_model::{Attrs, DomOutput, MarkSpec, ParseRule};

pub struct ItalicExtension;

impl ItalicExtension {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ItalicExtension {
    fn default() -> Self {
        Self::new()
    }
}

impl Extension for ItalicExtension {
    fn descriptor(&self) -> ExtensionDescriptor {
        ExtensionDescriptor::new("italic").tag(Tag::FormattingMark)
    }

    fn as_mark(&self) -> Option<&dyn MarkExtension> {
        Some(self)
    }

    fn commands(&self, _cx: &ExtensionContext<'_>) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("toggleItalic", |props, _| toggle_mark(props, "italic", Attrs::new()))
                .with_active(|state, _| is_mark_active(state, "italic")),
        ]
    }

    fn keymap(&self, _cx: &ExtensionContext<'_>) -> Vec<KeyBinding> {
        vec![KeyBinding::new("Mod-i", |props| toggle_mark(props, "italic", Attrs::new()))]
    }

    fn input_rules(&self, _cx: &ExtensionContext<'_>) -> Vec<InputRule> {
        // A single underscore pair; `**` belongs to bold
        vec![InputRule::mark(r"_([^_\s][^_]*)_$", "italic")]
    }
}

impl MarkExtension for ItalicExtension {
    fn mark_spec(&self, _cx: &ExtensionContext<'_>) -> MarkSpec {
        MarkSpec::new()
            .parse_rule(ParseRule::tag("em"))
            .parse_rule(ParseRule::tag("i"))
            .to_dom(|_| DomOutput::new("em"))
    }
}
