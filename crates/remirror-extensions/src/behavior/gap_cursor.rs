//! Escape from the end of a document that ends in a special block.

use remirror_core::{
    CommandProps, CommandSpec, Extension, ExtensionContext, ExtensionDescriptor, KeyBinding,
    Priority, Tag,
};
use remirror_model::Selection;

/// Pressing `ArrowDown` at the very end of the last block, when that block
/// is not the default textblock (a heading, say), appends an empty default
/// textblock and moves the cursor into it.
pub struct GapCursorExtension;

impl GapCursorExtension {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GapCursorExtension {
    fn default() -> Self {
        Self::new()
    }
}

fn exit_last_block(props: &mut CommandProps<'_>) -> bool {
    let selection = props.tr.selection();
    let doc = props.tr.doc();
    let size = doc.content_size();
    let Some(last) = doc.child(doc.child_count().saturating_sub(1)) else {
        return false;
    };
    let schema = props.tr.schema().clone();
    let Some(default) = schema.default_textblock() else {
        return false;
    };
    if !selection.empty() || selection.from() + 1 != size || last.kind() == default.name() {
        return false;
    }
    let Ok(block) = schema.create_and_fill(default.name()) else {
        return false;
    };
    let checkpoint = props.tr.checkpoint();
    let applied = props
        .tr
        .insert_node(size, block)
        .and_then(|tr| tr.set_selection(Selection::cursor(size + 1)));
    if applied.is_err() {
        props.tr.rollback(checkpoint);
        return false;
    }
    true
}

impl Extension for GapCursorExtension {
    fn descriptor(&self) -> ExtensionDescriptor {
        ExtensionDescriptor::new("gapCursor")
            .priority(Priority::HIGH)
            .tag(Tag::Behavior)
    }

    fn commands(&self, _cx: &ExtensionContext<'_>) -> Vec<CommandSpec> {
        vec![CommandSpec::new("exitLastBlock", |props, _| exit_last_block(props))]
    }

    fn keymap(&self, _cx: &ExtensionContext<'_>) -> Vec<KeyBinding> {
        vec![KeyBinding::new("ArrowDown", exit_last_block)]
    }
}
