//! Minimal DOM tree used for external markup import and export.
//!
//! This is not a browser DOM. It covers the subset of HTML the schema's parse
//! rules and `to_dom` functions exchange: elements with string attributes,
//! text, and void elements.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "wbr"];

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(/?)([a-zA-Z][a-zA-Z0-9-]*)((?:\s+[^\s=>/]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+))?)*)\s*(/?)>"#)
        .expect("tag pattern is valid")
});

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s=>/]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+)))?"#)
        .expect("attribute pattern is valid")
});

/// An element in the DOM tree
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DomElement {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub children: Vec<DomNode>,
}

impl DomElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: DomNode) -> Self {
        self.children.push(child);
        self
    }

    /// Look up an attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.tag.as_str())
    }
}

/// A node in the DOM tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomNode {
    Element(DomElement),
    Text(String),
}

/// Parse an HTML fragment into a list of top-level DOM nodes.
///
/// Unclosed elements are closed at the end of input and stray closing tags
/// close the nearest open element with the same name (or are ignored).
pub fn parse_html(input: &str) -> Result<Vec<DomNode>> {
    // Stack of open elements; index 0 is a synthetic root.
    let mut stack: Vec<DomElement> = vec![DomElement::new("#root")];
    let mut last = 0;

    for caps in TAG_RE.captures_iter(input) {
        let whole = caps.get(0).ok_or_else(|| Error::HtmlParse("empty tag match".into()))?;
        push_text(&mut stack, &input[last..whole.start()]);
        last = whole.end();

        let closing = !caps[1].is_empty();
        let tag = caps[2].to_ascii_lowercase();

        if closing {
            if let Some(depth) = stack.iter().rposition(|el| el.tag == tag) {
                if depth == 0 {
                    continue;
                }
                while stack.len() > depth {
                    close_top(&mut stack);
                }
            }
            continue;
        }

        let mut element = DomElement::new(tag);
        if let Some(raw) = caps.get(3) {
            for attr in ATTR_RE.captures_iter(raw.as_str()) {
                let value = attr
                    .get(2)
                    .or_else(|| attr.get(3))
                    .or_else(|| attr.get(4))
                    .map(|m| decode_entities(m.as_str()))
                    .unwrap_or_default();
                element.attrs.insert(attr[1].to_ascii_lowercase(), value);
            }
        }

        let self_closing = !caps[4].is_empty();
        if self_closing || element.is_void() {
            if let Some(parent) = stack.last_mut() {
                parent.children.push(DomNode::Element(element));
            }
        } else {
            stack.push(element);
        }
    }

    push_text(&mut stack, &input[last..]);
    while stack.len() > 1 {
        close_top(&mut stack);
    }

    let root = stack
        .pop()
        .ok_or_else(|| Error::HtmlParse("parser lost its root element".into()))?;
    Ok(root.children)
}

fn push_text(stack: &mut [DomElement], raw: &str) {
    if raw.is_empty() {
        return;
    }
    if let Some(parent) = stack.last_mut() {
        let text = decode_entities(raw);
        match parent.children.last_mut() {
            Some(DomNode::Text(existing)) => existing.push_str(&text),
            _ => parent.children.push(DomNode::Text(text)),
        }
    }
}

fn close_top(stack: &mut Vec<DomElement>) {
    if let Some(element) = stack.pop()
        && let Some(parent) = stack.last_mut()
    {
        parent.children.push(DomNode::Element(element));
    }
}

/// Serialize DOM nodes back into HTML
pub fn to_html(nodes: &[DomNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node);
    }
    out
}

fn write_node(out: &mut String, node: &DomNode) {
    match node {
        DomNode::Text(text) => out.push_str(&escape(text, false)),
        DomNode::Element(el) => {
            out.push('<');
            out.push_str(&el.tag);
            for (name, value) in &el.attrs {
                let _ = write!(out, " {}=\"{}\"", name, escape(value, true));
            }
            out.push('>');
            if el.is_void() {
                return;
            }
            for child in &el.children {
                write_node(out, child);
            }
            let _ = write!(out, "</{}>", el.tag);
        }
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}
