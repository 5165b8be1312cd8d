//! Initial and replacement document content.

use std::sync::Arc;

use remirror_model::{DomParser, Node, Schema};
use serde_json::Value;

/// Content handed to the manager for the editor document.
#[derive(Debug, Clone)]
pub enum Content {
    /// A document in the engine's JSON format
    Json(Value),
    /// HTML parsed through the schema's parse rules
    Html(String),
    /// An already built document; it must belong to the manager's schema
    Doc(Node),
}

impl Content {
    /// Build the document this content describes.
    pub fn to_doc(&self, schema: &Schema) -> remirror_model::Result<Node> {
        match self {
            Content::Json(value) => schema.node_from_json(value),
            Content::Html(html) => DomParser::from_schema(schema).parse(html),
            Content::Doc(doc) => {
                // Round trip through JSON so foreign documents are validated
                schema.node_from_json(&doc.to_json())
            }
        }
    }

    /// Raw form of the content for error reports
    pub fn describe(&self) -> String {
        match self {
            Content::Json(value) => value.to_string(),
            Content::Html(html) => html.clone(),
            Content::Doc(doc) => doc.to_json().to_string(),
        }
    }
}

impl From<Value> for Content {
    fn from(value: Value) -> Self {
        Content::Json(value)
    }
}

impl From<Node> for Content {
    fn from(doc: Node) -> Self {
        Content::Doc(doc)
    }
}

/// Content that did not fit the schema, passed to the `on_error` handler.
#[derive(Debug)]
pub struct ContentError {
    pub error: remirror_model::Error,
    /// The rejected content in its raw form
    pub content: String,
    pub schema: Arc<Schema>,
}
