//! Unique ids for block nodes.
//!
//! The extension adds an `id` attribute (rendered as `data-id`) and keeps
//! it filled: after every document change, nodes with a missing or
//! duplicated id get a fresh UUID in an appended transaction.

use std::collections::HashSet;
use std::rc::Rc;

use remirror_core::{
    CommandSpec, Extension, ExtensionContext, ExtensionDescriptor, ExtraAttributes,
    ExtraAttributesTarget, Tag,
};
use remirror_model::{AttributeDef, EditorState, Node, Plugin, Transaction};
use serde_json::Value;
use uuid::Uuid;

pub const NODE_ID_PLUGIN_KEY: &str = "nodeId";

/// Assigns ids to block nodes, or to the node types named by the static
/// `nodes` option when it is not empty.
pub struct NodeIdExtension;

impl NodeIdExtension {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NodeIdExtension {
    fn default() -> Self {
        Self::new()
    }
}

/// Positions of nodes that carry an `id` attribute which is missing or
/// already used earlier in the document
fn nodes_needing_ids(doc: &Node, state: &EditorState) -> Vec<usize> {
    let schema = state.schema();
    let mut seen = HashSet::new();
    let mut missing = Vec::new();
    doc.descendants(&mut |node, pos| {
        let has_id_attr = schema
            .node_type(node.kind())
            .is_ok_and(|t| t.spec().attrs.contains_key("id"));
        if has_id_attr {
            match node.attr("id").and_then(Value::as_str) {
                Some(id) if seen.insert(id.to_string()) => {}
                _ => missing.push(pos),
            }
        }
        true
    });
    missing
}

/// Give every node at `positions` a fresh id, keeping its other attributes
fn assign_ids(tr: &mut Transaction, positions: &[usize]) -> remirror_model::Result<()> {
    for &pos in positions {
        let Some(node) = tr.doc().node_at(pos) else {
            continue;
        };
        let mut attrs = node.attrs().clone();
        attrs.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        tr.set_node_attrs(pos, attrs)?;
    }
    Ok(())
}

#[derive(Debug)]
struct NodeIdPlugin;

impl Plugin for NodeIdPlugin {
    fn key(&self) -> &str {
        NODE_ID_PLUGIN_KEY
    }

    fn append_transaction(
        &self,
        transactions: &[Transaction],
        _old_state: &EditorState,
        new_state: &EditorState,
    ) -> Option<Transaction> {
        if !transactions.iter().any(Transaction::doc_changed) {
            return None;
        }
        let missing = nodes_needing_ids(new_state.doc(), new_state);
        if missing.is_empty() {
            return None;
        }
        let mut tr = new_state.tr();
        match assign_ids(&mut tr, &missing) {
            Ok(()) => {
                tracing::trace!(count = missing.len(), "Assigned node ids");
                Some(tr)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to assign node ids");
                None
            }
        }
    }
}

impl Extension for NodeIdExtension {
    fn descriptor(&self) -> ExtensionDescriptor {
        ExtensionDescriptor::new("nodeId")
            .static_option("nodes", Value::Array(Vec::new()))
            .tag(Tag::Behavior)
    }

    fn extra_attributes(&self, cx: &ExtensionContext<'_>) -> Vec<ExtraAttributes> {
        let names: Vec<String> = cx
            .options
            .get("nodes")
            .and_then(Value::as_array)
            .map(|nodes| nodes.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();
        let target = if names.is_empty() {
            ExtraAttributesTarget::Tags(vec![Tag::BlockNode])
        } else {
            ExtraAttributesTarget::Nodes(names)
        };
        let id = AttributeDef::with_default(Value::Null).data_codec();
        vec![ExtraAttributes::new(target).attr("id", id)]
    }

    fn commands(&self, _cx: &ExtensionContext<'_>) -> Vec<CommandSpec> {
        vec![CommandSpec::new("addMissingNodeIds", |props, _| {
            let missing = nodes_needing_ids(props.tr.doc(), props.state);
            !missing.is_empty() && assign_ids(props.tr, &missing).is_ok()
        })]
    }

    fn plugin(&self, _cx: &ExtensionContext<'_>) -> Option<Rc<dyn Plugin>> {
        Some(Rc::new(NodeIdPlugin))
    }
}
