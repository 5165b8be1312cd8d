//! Terse builders for documents in the engine's JSON format.
//!
//! ```rust
//! use remirror_test_utils::docs::{doc, p, text};
//!
//! let value = doc([p([text("hello")])]);
//! assert_eq!(value["content"][0]["type"], "paragraph");
//! ```

use serde_json::{Value, json};

/// A document holding `blocks`
pub fn doc(blocks: impl IntoIterator<Item = Value>) -> Value {
    json!({ "type": "doc", "content": blocks.into_iter().collect::<Vec<_>>() })
}

/// A paragraph. Empty paragraphs carry no `content` key, matching what the
/// engine produces.
pub fn p(inline: impl IntoIterator<Item = Value>) -> Value {
    block("paragraph", Value::Null, inline)
}

pub fn heading(level: u64, inline: impl IntoIterator<Item = Value>) -> Value {
    block("heading", json!({ "level": level }), inline)
}

/// A node of type `kind`; `attrs` is left out when `null`
pub fn block(kind: &str, attrs: Value, inline: impl IntoIterator<Item = Value>) -> Value {
    let mut node = json!({ "type": kind });
    if !attrs.is_null() {
        node["attrs"] = attrs;
    }
    let content: Vec<Value> = inline.into_iter().collect();
    if !content.is_empty() {
        node["content"] = Value::Array(content);
    }
    node
}

pub fn text(text: &str) -> Value {
    json!({ "type": "text", "text": text })
}

/// Text carrying attribute-less marks, given in schema order
pub fn marked(text: &str, marks: &[&str]) -> Value {
    let marks: Vec<Value> = marks.iter().map(|m| json!({ "type": m })).collect();
    json!({ "type": "text", "text": text, "marks": marks })
}

/// A paragraph with a single text run, the most common fixture
pub fn paragraph_doc(content: &str) -> Value {
    doc([p([text(content)])])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_paragraph_has_no_content_key() {
        assert_eq!(p([]), json!({ "type": "paragraph" }));
    }

    #[test]
    fn test_heading_carries_level() {
        assert_eq!(
            heading(2, [text("Title")]),
            json!({
                "type": "heading",
                "attrs": { "level": 2 },
                "content": [{ "type": "text", "text": "Title" }]
            })
        );
    }

    #[test]
    fn test_marked_text() {
        assert_eq!(
            marked("x", &["bold", "italic"])["marks"],
            json!([{ "type": "bold" }, { "type": "italic" }])
        );
    }
}
