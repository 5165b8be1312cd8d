//! Toggle-style command bodies shared by mark and node extensions.

use std::sync::Arc;

use remirror_model::{Attrs, EditorState, Node, Schema, Selection, has_mark_type};

use super::CommandProps;

/// Add `mark` over the selection, or remove it when the whole selection
/// already carries it. An empty selection is not applicable.
pub fn toggle_mark(props: &mut CommandProps<'_>, mark: &str, attrs: Attrs) -> bool {
    let selection = props.tr.selection();
    if selection.empty() {
        return false;
    }
    let (from, to) = (selection.from(), selection.to());
    let schema = Arc::clone(props.tr.schema());
    let before = props.tr.doc().clone();
    let checkpoint = props.tr.checkpoint();

    let result = if props.tr.doc().range_has_mark(from, to, mark) {
        props.tr.remove_mark(from, to, mark).map(|_| ())
    } else {
        match schema.mark(mark, attrs) {
            Ok(mark) => props.tr.add_mark(from, to, mark).map(|_| ()),
            Err(err) => Err(err),
        }
    };

    match result {
        Ok(()) if props.tr.doc() != &before => true,
        Ok(()) => {
            props.tr.rollback(checkpoint);
            false
        }
        Err(err) => {
            tracing::debug!(mark, error = %err, "Mark toggle not applicable");
            props.tr.rollback(checkpoint);
            false
        }
    }
}

/// Turn the textblocks touched by the selection into `node`. Not applicable
/// when nothing would change.
pub fn set_block_type(props: &mut CommandProps<'_>, node: &str, attrs: Attrs) -> bool {
    let selection = props.tr.selection();
    let before = props.tr.doc().clone();
    let checkpoint = props.tr.checkpoint();
    match props.tr.set_block_type(selection.from(), selection.to(), node, attrs).map(|_| ()) {
        Ok(()) if props.tr.doc() != &before => true,
        Ok(()) => {
            props.tr.rollback(checkpoint);
            false
        }
        Err(err) => {
            tracing::debug!(node, error = %err, "Block type change not applicable");
            props.tr.rollback(checkpoint);
            false
        }
    }
}

/// Switch the selected textblocks between `node` and `fallback`.
pub fn toggle_block_type(props: &mut CommandProps<'_>, node: &str, attrs: Attrs, fallback: &str) -> bool {
    let active = blocks_match(props.tr.doc(), props.tr.schema(), props.tr.selection(), node, &attrs);
    if active {
        set_block_type(props, fallback, Attrs::new())
    } else {
        set_block_type(props, node, attrs)
    }
}

/// Whether the selection carries `mark`. For a cursor this is whether text
/// typed there would carry it.
pub fn is_mark_active(state: &EditorState, mark: &str) -> bool {
    let selection = state.selection();
    if selection.empty() {
        return state
            .tr()
            .marks_at(selection.from())
            .is_ok_and(|marks| has_mark_type(&marks, mark));
    }
    state.doc().range_has_mark(selection.from(), selection.to(), mark)
}

/// Whether every textblock touched by the selection is a `node` whose
/// attributes include `attrs`.
pub fn is_node_active(state: &EditorState, node: &str, attrs: &Attrs) -> bool {
    blocks_match(state.doc(), state.schema(), state.selection(), node, attrs)
}

fn blocks_match(doc: &Node, schema: &Schema, selection: Selection, node: &str, attrs: &Attrs) -> bool {
    let from = selection.from();
    let to = selection.to().max(from + 1).min(doc.content_size());
    let mut seen = false;
    let mut all = true;
    doc.nodes_between(from, to, &mut |child, _| {
        if schema.is_textblock(child) {
            seen = true;
            let same_attrs = attrs.iter().all(|(k, v)| child.attr(k) == Some(v));
            all &= child.kind() == node && same_attrs;
            return false;
        }
        all
    });
    seen && all
}
