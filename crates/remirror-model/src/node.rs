//! Document nodes and marks.
//!
//! Positions follow the usual flat addressing scheme: entering or leaving a
//! non-leaf node counts as one position, each character of text counts as
//! one, and a non-text leaf counts as one. Position `0` is the start of the
//! top node's content.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::attrs::Attrs;
use crate::error::{Error, Result};

/// A mark applied to inline content (bold, link, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: Attrs,
}

impl Mark {
    pub fn new(kind: impl Into<String>, attrs: Attrs) -> Self {
        Self {
            kind: kind.into(),
            attrs,
        }
    }

    /// Whether a mark of the same type and attributes is in `set`
    pub fn is_in_set(&self, set: &[Mark]) -> bool {
        set.iter().any(|m| m == self)
    }
}

/// Check whether any mark of the given type is in `set`
pub fn has_mark_type(set: &[Mark], kind: &str) -> bool {
    set.iter().any(|m| m.kind == kind)
}

/// A node in a document tree. Construct element nodes through
/// [`Schema`](crate::Schema) so that attributes and content are validated.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) kind: String,
    pub(crate) attrs: Attrs,
    pub(crate) content: Vec<Node>,
    pub(crate) text: Option<String>,
    pub(crate) marks: Vec<Mark>,
    pub(crate) leaf: bool,
}

impl Node {
    /// Create a text node. Marks should already be in schema order.
    pub(crate) fn new_text(text: String, marks: Vec<Mark>) -> Self {
        Self {
            kind: "text".to_string(),
            attrs: Attrs::new(),
            content: Vec::new(),
            text: Some(text),
            marks,
            leaf: true,
        }
    }

    pub(crate) fn new_element(
        kind: String,
        attrs: Attrs,
        content: Vec<Node>,
        marks: Vec<Mark>,
        leaf: bool,
    ) -> Self {
        Self {
            kind,
            attrs,
            content,
            text: None,
            marks,
            leaf,
        }
    }

    /// Name of this node's type
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    pub fn children(&self) -> &[Node] {
        &self.content
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.content.get(index)
    }

    pub fn child_count(&self) -> usize {
        self.content.len()
    }

    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn is_text(&self) -> bool {
        self.text.is_some()
    }

    pub fn is_leaf(&self) -> bool {
        self.leaf
    }

    /// Size of this node in the position space of its parent
    pub fn node_size(&self) -> usize {
        match &self.text {
            Some(text) => text.chars().count(),
            None if self.leaf => 1,
            None => self.content_size() + 2,
        }
    }

    /// Size of this node's content
    pub fn content_size(&self) -> usize {
        self.content.iter().map(Node::node_size).sum()
    }

    /// Concatenated text of all descendants
    pub fn text_content(&self) -> String {
        match &self.text {
            Some(text) => text.clone(),
            None => self.content.iter().map(Node::text_content).collect(),
        }
    }

    /// Text between two content positions, joining blocks with `separator`
    pub fn text_between(&self, from: usize, to: usize, separator: &str) -> String {
        self.text_between_with_leaves(from, to, separator, "")
    }

    /// Like [`text_between`](Self::text_between), with `leaf_text` standing
    /// in for every non-text leaf. A one-character `leaf_text` keeps
    /// character offsets equal to document positions inside a textblock.
    pub fn text_between_with_leaves(
        &self,
        from: usize,
        to: usize,
        separator: &str,
        leaf_text: &str,
    ) -> String {
        let mut out = String::new();
        let mut separated = true;
        self.nodes_between(from, to, &mut |node, pos| {
            if let Some(text) = node.text() {
                let start = from.saturating_sub(pos);
                let end = (to - pos).min(text.chars().count());
                out.extend(text.chars().skip(start).take(end.saturating_sub(start)));
                separated = false;
            } else if node.is_leaf() {
                if !leaf_text.is_empty() {
                    out.push_str(leaf_text);
                    separated = false;
                }
            } else if !separated && !out.is_empty() {
                out.push_str(separator);
                separated = true;
            }
            true
        });
        out
    }

    /// Visit all descendants overlapping `from..to` (content positions).
    ///
    /// The callback receives each node and its absolute start position and
    /// returns whether to descend into it.
    pub fn nodes_between(
        &self,
        from: usize,
        to: usize,
        f: &mut dyn FnMut(&Node, usize) -> bool,
    ) {
        self.nodes_between_at(from, to, f, 0);
    }

    fn nodes_between_at(
        &self,
        from: usize,
        to: usize,
        f: &mut dyn FnMut(&Node, usize) -> bool,
        start: usize,
    ) {
        let mut pos = 0;
        for child in &self.content {
            if pos >= to {
                break;
            }
            let end = pos + child.node_size();
            if end > from && f(child, start + pos) && !child.leaf {
                let inner = pos + 1;
                child.nodes_between_at(
                    from.saturating_sub(inner),
                    to.saturating_sub(inner).min(child.content_size()),
                    f,
                    start + inner,
                );
            }
            pos = end;
        }
    }

    /// Visit every descendant with its absolute position
    pub fn descendants(&self, f: &mut dyn FnMut(&Node, usize) -> bool) {
        self.nodes_between(0, self.content_size(), f);
    }

    /// Find the child index containing content offset `offset`, returning the
    /// index and the offset at which that child starts.
    pub(crate) fn find_index(&self, offset: usize) -> Result<(usize, usize)> {
        let size = self.content_size();
        if offset > size {
            return Err(Error::PositionOutOfRange { pos: offset, size });
        }
        let mut pos = 0;
        for (index, child) in self.content.iter().enumerate() {
            let end = pos + child.node_size();
            if offset < end {
                return Ok((index, pos));
            }
            pos = end;
        }
        Ok((self.content.len(), pos))
    }

    /// Node starting exactly at `pos`, if any
    pub fn node_at(&self, pos: usize) -> Option<&Node> {
        let mut node = self;
        let mut offset = pos;
        loop {
            let (index, start) = node.find_index(offset).ok()?;
            let child = node.content.get(index)?;
            if start == offset {
                return Some(child);
            }
            if child.leaf {
                return None;
            }
            node = child;
            offset -= start + 1;
        }
    }

    /// Whether every inline node in `from..to` carries a mark of `kind`.
    /// Returns `false` for empty ranges and ranges without inline content.
    pub fn range_has_mark(&self, from: usize, to: usize, kind: &str) -> bool {
        let mut seen = false;
        let mut all = true;
        self.nodes_between(from, to, &mut |node, _| {
            if node.is_text() || (node.leaf && !node.marks.is_empty()) {
                seen = true;
                if !has_mark_type(&node.marks, kind) {
                    all = false;
                }
            }
            all
        });
        seen && all
    }

    /// Whether any inline node in `from..to` carries a mark of `kind`
    pub fn range_touches_mark(&self, from: usize, to: usize, kind: &str) -> bool {
        let mut found = false;
        self.nodes_between(from, to, &mut |node, _| {
            if has_mark_type(&node.marks, kind) {
                found = true;
            }
            !found
        });
        found
    }

    /// Serialize to the engine's JSON document format
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".into(), Value::String(self.kind.clone()));
        if !self.attrs.is_empty() {
            obj.insert(
                "attrs".into(),
                Value::Object(self.attrs.clone().into_iter().collect()),
            );
        }
        if let Some(text) = &self.text {
            obj.insert("text".into(), Value::String(text.clone()));
        }
        if !self.content.is_empty() {
            obj.insert(
                "content".into(),
                Value::Array(self.content.iter().map(Node::to_json).collect()),
            );
        }
        if !self.marks.is_empty() {
            let marks = self
                .marks
                .iter()
                .map(|m| serde_json::to_value(m).unwrap_or(Value::Null))
                .collect();
            obj.insert("marks".into(), Value::Array(marks));
        }
        Value::Object(obj)
    }

    pub(crate) fn with_content(&self, content: Vec<Node>) -> Node {
        Node {
            content,
            ..self.clone()
        }
    }
}

/// Split inline content at a content offset.
pub(crate) fn split_inline(content: &[Node], offset: usize) -> (Vec<Node>, Vec<Node>) {
    let mut before = Vec::new();
    let mut after = Vec::new();
    let mut pos = 0;
    for node in content {
        let size = node.node_size();
        if pos + size <= offset {
            before.push(node.clone());
        } else if pos >= offset {
            after.push(node.clone());
        } else if let Some(text) = &node.text {
            let cut = offset - pos;
            let head: String = text.chars().take(cut).collect();
            let tail: String = text.chars().skip(cut).collect();
            before.push(Node::new_text(head, node.marks.clone()));
            after.push(Node::new_text(tail, node.marks.clone()));
        } else {
            after.push(node.clone());
        }
        pos += size;
    }
    (before, after)
}

/// Drop empty text nodes and merge adjacent text nodes with equal marks.
pub(crate) fn normalize_inline(content: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(content.len());
    for node in content {
        if node.text.as_deref() == Some("") {
            continue;
        }
        if let (Some(text), Some(prev)) = (&node.text, out.last_mut())
            && prev.marks == node.marks
            && let Some(prev_text) = prev.text.as_mut()
        {
            prev_text.push_str(text);
            continue;
        }
        out.push(node);
    }
    out
}

/// Marks at a position, taken from the inline node before it (or after it at
/// the start of a textblock).
pub(crate) fn marks_in_content_at(content: &[Node], offset: usize) -> Vec<Mark> {
    let mut pos = 0;
    let mut before: Option<&Node> = None;
    for node in content {
        let end = pos + node.node_size();
        if offset > pos && offset <= end {
            return node.marks.clone();
        }
        if offset <= pos {
            return before.unwrap_or(node).marks.clone();
        }
        before = Some(node);
        pos = end;
    }
    before.map(|n| n.marks.clone()).unwrap_or_default()
}
