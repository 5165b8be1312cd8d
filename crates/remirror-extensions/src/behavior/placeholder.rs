//! Placeholder text for an empty document.

use std::rc::Rc;

use remirror_core::{Extension, ExtensionContext, ExtensionDescriptor, Tag};
use remirror_model::{Decoration, EditorState, Node, Plugin};
use serde_json::json;

pub const PLACEHOLDER_PLUGIN_KEY: &str = "placeholder";

/// Decorates the first block of an empty document.
///
/// Options (both dynamic):
/// - `placeholder`: text exposed as `data-placeholder`
/// - `emptyNodeClass`: class given to the empty block
pub struct PlaceholderExtension;

impl PlaceholderExtension {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlaceholderExtension {
    fn default() -> Self {
        Self::new()
    }
}

/// A document is empty when it holds a single block without content
fn is_empty_doc(doc: &Node) -> bool {
    doc.child_count() == 1
        && doc
            .child(0)
            .is_some_and(|block| !block.is_leaf() && block.content_size() == 0)
}

#[derive(Debug)]
struct PlaceholderPlugin {
    placeholder: String,
    class: String,
}

impl Plugin for PlaceholderPlugin {
    fn key(&self) -> &str {
        PLACEHOLDER_PLUGIN_KEY
    }

    fn decorations(&self, state: &EditorState) -> Vec<Decoration> {
        let doc = state.doc();
        if !is_empty_doc(doc) {
            return Vec::new();
        }
        let size = doc.child(0).map_or(0, Node::node_size);
        vec![
            Decoration::new(0, size)
                .attr("class", self.class.clone())
                .attr("data-placeholder", self.placeholder.clone()),
        ]
    }
}

impl Extension for PlaceholderExtension {
    fn descriptor(&self) -> ExtensionDescriptor {
        ExtensionDescriptor::new("placeholder")
            .option("placeholder", json!(""))
            .option("emptyNodeClass", json!("remirror-is-empty"))
            .tag(Tag::Behavior)
    }

    fn plugin(&self, cx: &ExtensionContext<'_>) -> Option<Rc<dyn Plugin>> {
        Some(Rc::new(PlaceholderPlugin {
            placeholder: cx.options.get_str("placeholder").unwrap_or_default().to_string(),
            class: cx
                .options
                .get_str("emptyNodeClass")
                .unwrap_or("remirror-is-empty")
                .to_string(),
        }))
    }

    fn on_options_changed(&self, _cx: &ExtensionContext<'_>, changed: &[String]) {
        tracing::debug!(?changed, "Placeholder options changed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remirror_model::{NodeSpec, Schema, SchemaSpec};

    fn schema() -> Schema {
        Schema::new(SchemaSpec {
            nodes: vec![
                ("doc".into(), NodeSpec::new().content("block+")),
                ("paragraph".into(), NodeSpec::new().content("inline*").group("block")),
                ("text".into(), NodeSpec::new().inline().group("inline")),
            ],
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_empty_doc_detection() {
        let schema = schema();
        let empty = schema.empty_doc().unwrap();
        assert!(is_empty_doc(&empty));

        let text = schema.text("hi", Vec::new()).unwrap();
        let paragraph = schema.node("paragraph", Default::default(), vec![text]).unwrap();
        let filled = schema.node("doc", Default::default(), vec![paragraph]).unwrap();
        assert!(!is_empty_doc(&filled));
    }
}
