//! HTML import and export through the schema's parse rules and `to_dom`
//! functions.

use std::collections::BTreeMap;

use crate::attrs::{AttrMatch, AttributeDef, Attrs, DomOutput, ParseRule, ToDomFn};
use crate::dom::{DomElement, DomNode, parse_html, to_html};
use crate::error::{Error, Result};
use crate::node::{Mark, Node, normalize_inline};
use crate::schema::{NodeType, Schema};

/// Rules without an explicit priority are tried after all others.
const UNSET_PRIORITY: i32 = i32::MAX;

/// Turns documents into DOM trees.
pub struct DomSerializer<'a> {
    schema: &'a Schema,
}

impl<'a> DomSerializer<'a> {
    pub fn from_schema(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Serialize a document's content to an HTML string
    pub fn to_html(&self, doc: &Node) -> Result<String> {
        Ok(to_html(&self.serialize_fragment(doc.children())?))
    }

    /// Serialize a list of sibling nodes. Marks shared by adjacent inline
    /// nodes are rendered as one wrapping element.
    pub fn serialize_fragment(&self, nodes: &[Node]) -> Result<Vec<DomNode>> {
        let mut root: Vec<DomNode> = Vec::new();
        let mut open: Vec<(Mark, DomElement)> = Vec::new();

        for node in nodes {
            let keep = open
                .iter()
                .zip(node.marks())
                .take_while(|((open_mark, _), mark)| open_mark == *mark)
                .count();
            while open.len() > keep {
                close_mark(&mut open, &mut root);
            }
            for mark in &node.marks()[keep..] {
                let element = self.mark_element(mark)?;
                open.push((mark.clone(), element));
            }

            let dom = match node.text() {
                Some(text) => DomNode::Text(text.to_string()),
                None => DomNode::Element(self.node_element(node)?),
            };
            match open.last_mut() {
                Some((_, parent)) => parent.children.push(dom),
                None => root.push(dom),
            }
        }
        while !open.is_empty() {
            close_mark(&mut open, &mut root);
        }
        Ok(root)
    }

    fn node_element(&self, node: &Node) -> Result<DomElement> {
        let node_type = self.schema.node_type(node.kind())?;
        let spec = node_type.spec();
        let mut element = render(spec.to_dom, &spec.attrs, node.attrs())
            .ok_or_else(|| Error::NotSerializable(node.kind().to_string()))?;
        if !node.is_leaf() {
            element.children = self.serialize_fragment(node.children())?;
        }
        Ok(element)
    }

    fn mark_element(&self, mark: &Mark) -> Result<DomElement> {
        let spec = self.schema.mark_type(&mark.kind)?.spec();
        render(spec.to_dom, &spec.attrs, &mark.attrs)
            .ok_or_else(|| Error::NotSerializable(mark.kind.clone()))
    }
}

fn render(
    to_dom: Option<ToDomFn>,
    defs: &BTreeMap<String, AttributeDef>,
    attrs: &Attrs,
) -> Option<DomElement> {
    let to_dom = to_dom?;
    let DomOutput { tag, attrs: dom_attrs } = to_dom(attrs);
    let mut element = DomElement::new(tag);
    element.attrs = dom_attrs;
    for (name, def) in defs {
        if let (Some(to_dom), Some(value)) = (def.to_dom, attrs.get(name))
            && let Some((key, rendered)) = to_dom(name, value)
        {
            element.attrs.insert(key, rendered);
        }
    }
    Some(element)
}

fn close_mark(open: &mut Vec<(Mark, DomElement)>, root: &mut Vec<DomNode>) {
    if let Some((_, element)) = open.pop() {
        let node = DomNode::Element(element);
        match open.last_mut() {
            Some((_, parent)) => parent.children.push(node),
            None => root.push(node),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RuleTarget {
    Node(String),
    Mark(String),
}

#[derive(Debug, Clone)]
struct CompiledRule {
    target: RuleTarget,
    rule: ParseRule,
}

/// Builds documents from DOM trees.
///
/// Rules are tried in ascending priority, ties in schema order. A rule whose
/// attribute parser reports [`AttrMatch::NoMatch`] is skipped and the next
/// rule for the same tag gets a chance. Elements no rule claims are
/// transparent: their children are parsed in place.
pub struct DomParser<'a> {
    schema: &'a Schema,
    rules: Vec<CompiledRule>,
}

impl<'a> DomParser<'a> {
    pub fn from_schema(schema: &'a Schema) -> Self {
        let mut rules: Vec<CompiledRule> = Vec::new();
        for node_type in schema.nodes() {
            for rule in &node_type.spec().parse_dom {
                rules.push(CompiledRule {
                    target: RuleTarget::Node(node_type.name().to_string()),
                    rule: rule.clone(),
                });
            }
        }
        for mark_type in schema.marks() {
            for rule in &mark_type.spec().parse_dom {
                rules.push(CompiledRule {
                    target: RuleTarget::Mark(mark_type.name().to_string()),
                    rule: rule.clone(),
                });
            }
        }
        rules.sort_by_key(|r| r.rule.priority.unwrap_or(UNSET_PRIORITY));
        Self { schema, rules }
    }

    pub fn parse(&self, html: &str) -> Result<Node> {
        self.parse_dom(&parse_html(html)?)
    }

    pub fn parse_dom(&self, dom: &[DomNode]) -> Result<Node> {
        let top = self.schema.top_node_type();
        let mut content = Vec::new();
        self.collect(dom, &[], &mut content)?;
        let content = self.fit(top, content)?;
        self.schema.node(top.name(), Attrs::new(), content)
    }

    fn match_element(&self, element: &DomElement) -> Result<Option<(&RuleTarget, Attrs)>> {
        'rules: for compiled in self.rules.iter().filter(|r| r.rule.tag == element.tag) {
            let defs = match &compiled.target {
                RuleTarget::Node(name) => &self.schema.node_type(name)?.spec().attrs,
                RuleTarget::Mark(name) => &self.schema.mark_type(name)?.spec().attrs,
            };
            let mut attrs = compiled.rule.attrs.clone();
            for (name, def) in defs {
                let Some(parse) = def.parse_dom else {
                    continue;
                };
                match parse(element, name) {
                    AttrMatch::Value(value) => {
                        attrs.insert(name.clone(), value);
                    }
                    AttrMatch::Default => {}
                    AttrMatch::NoMatch => continue 'rules,
                }
            }
            return Ok(Some((&compiled.target, attrs)));
        }
        Ok(None)
    }

    fn collect(&self, dom: &[DomNode], marks: &[Mark], out: &mut Vec<Node>) -> Result<()> {
        for node in dom {
            let element = match node {
                DomNode::Text(text) => {
                    if !text.is_empty() {
                        out.push(self.schema.text(text.clone(), marks.to_vec())?);
                    }
                    continue;
                }
                DomNode::Element(element) => element,
            };
            match self.match_element(element)? {
                Some((RuleTarget::Mark(name), attrs)) => {
                    let mark = self.schema.mark(name, attrs)?;
                    let marks = self.schema.add_mark_to_set(marks, &mark)?;
                    self.collect(&element.children, &marks, out)?;
                }
                Some((RuleTarget::Node(name), attrs)) => {
                    let node_type = self.schema.node_type(name)?;
                    let node_marks = if node_type.is_inline() {
                        marks.to_vec()
                    } else {
                        Vec::new()
                    };
                    let content = if node_type.is_leaf() {
                        Vec::new()
                    } else {
                        let mut children = Vec::new();
                        self.collect(&element.children, &node_marks, &mut children)?;
                        self.fit(node_type, children)?
                    };
                    out.push(self.schema.node_with_marks(name, attrs, content, node_marks)?);
                }
                None => self.collect(&element.children, marks, out)?,
            }
        }
        Ok(())
    }

    /// Massage parsed children into something `node_type` accepts.
    fn fit(&self, node_type: &NodeType, content: Vec<Node>) -> Result<Vec<Node>> {
        if node_type.is_textblock() {
            let mut inline = Vec::new();
            self.flatten_inline(content, &mut inline)?;
            for node in &mut inline {
                node.marks.retain(|m| node_type.allows_mark(&m.kind));
            }
            return Ok(normalize_inline(inline));
        }

        let mut out = Vec::new();
        let mut pending = Vec::new();
        for node in content {
            if self.schema.node_type(node.kind())?.is_inline() {
                pending.push(node);
            } else {
                self.flush_inline(&mut pending, &mut out)?;
                out.push(node);
            }
        }
        self.flush_inline(&mut pending, &mut out)?;

        if out.is_empty() && self.schema.check_content(node_type, &out).is_err() {
            let filled = self.schema.create_and_fill(node_type.name())?;
            return Ok(filled.children().to_vec());
        }
        Ok(out)
    }

    fn flatten_inline(&self, content: Vec<Node>, out: &mut Vec<Node>) -> Result<()> {
        for node in content {
            if self.schema.node_type(node.kind())?.is_inline() {
                out.push(node);
            } else {
                self.flatten_inline(node.children().to_vec(), out)?;
            }
        }
        Ok(())
    }

    /// Wrap stray inline content in the default textblock. Runs of pure
    /// whitespace between blocks are dropped.
    fn flush_inline(&self, pending: &mut Vec<Node>, out: &mut Vec<Node>) -> Result<()> {
        if pending.is_empty() {
            return Ok(());
        }
        let inline = std::mem::take(pending);
        let blank = inline
            .iter()
            .all(|n| n.text().is_some_and(|t| t.trim().is_empty()));
        if blank {
            return Ok(());
        }
        let textblock = self
            .schema
            .default_textblock()
            .ok_or_else(|| Error::HtmlParse("no textblock to hold inline content".into()))?;
        let wrapped = self
            .schema
            .node(textblock.name(), Attrs::new(), normalize_inline(inline))?;
        out.push(wrapped);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::{AttrMatch, AttributeDef, DomOutput, ParseRule};
    use crate::schema::tests::basic_spec;
    use crate::schema::{MarkSpec, NodeSpec};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn href(element: &DomElement, _: &str) -> AttrMatch {
        match element.attr("href") {
            Some(href) if !href.is_empty() => AttrMatch::Value(Value::String(href.into())),
            _ => AttrMatch::NoMatch,
        }
    }

    fn schema() -> Schema {
        let mut spec = basic_spec();
        spec.nodes.insert(
            2,
            (
                "heading".into(),
                NodeSpec::new()
                    .content("inline*")
                    .group("block")
                    .attr("level", AttributeDef::with_default(json!(1)))
                    .parse_rule(ParseRule::tag("h1").with_attr("level", json!(1)))
                    .parse_rule(ParseRule::tag("h2").with_attr("level", json!(2)))
                    .to_dom(|attrs| match attrs.get("level").and_then(Value::as_u64) {
                        Some(2) => DomOutput::new("h2"),
                        _ => DomOutput::new("h1"),
                    }),
            ),
        );
        spec.marks.push((
            "link".into(),
            MarkSpec::new()
                .attr(
                    "href",
                    AttributeDef::required()
                        .parse_dom(href)
                        .to_dom(crate::attrs::render_string_attr),
                )
                .parse_rule(ParseRule::tag("a"))
                .to_dom(|_| DomOutput::new("a"))
                .exclusive(),
        ));
        Schema::new(spec).unwrap()
    }

    #[test]
    fn test_serialize_groups_shared_marks() {
        let schema = schema();
        let doc = schema
            .node_from_json(&json!({
                "type": "doc",
                "content": [{"type": "paragraph", "content": [
                    {"type": "text", "text": "a", "marks": [{"type": "bold"}]},
                    {"type": "text", "text": "b", "marks": [
                        {"type": "bold"},
                        {"type": "link", "attrs": {"href": "/x"}}
                    ]},
                    {"type": "text", "text": "c"}
                ]}]
            }))
            .unwrap();
        let html = DomSerializer::from_schema(&schema).to_html(&doc).unwrap();
        assert_eq!(html, r#"<p><strong>a<a href="/x">b</a></strong>c</p>"#);
    }

    #[test]
    fn test_parse_rule_attrs_and_fallback() {
        let schema = schema();
        let doc = DomParser::from_schema(&schema)
            .parse("<h2>Title</h2><p>x <a>no href</a> <a href=\"/y\">y</a></p>")
            .unwrap();
        assert_eq!(doc.child(0).unwrap().kind(), "heading");
        assert_eq!(doc.child(0).unwrap().attr("level"), Some(&json!(2)));
        let para = doc.child(1).unwrap();
        assert_eq!(para.text_content(), "x no href y");
        // The anchor without href is transparent, the other becomes a link.
        assert!(!para.range_touches_mark(0, 9, "link"));
        assert!(para.range_has_mark(10, 11, "link"));
    }

    #[test]
    fn test_stray_inline_content_is_wrapped() {
        let schema = schema();
        let doc = DomParser::from_schema(&schema)
            .parse("loose <strong>text</strong><p>block</p>\n")
            .unwrap();
        assert_eq!(doc.child_count(), 2);
        assert_eq!(doc.child(0).unwrap().kind(), "paragraph");
        assert_eq!(doc.child(0).unwrap().text_content(), "loose text");
    }

    #[test]
    fn test_empty_input_produces_empty_doc() {
        let schema = schema();
        let doc = DomParser::from_schema(&schema).parse("").unwrap();
        assert_eq!(doc, schema.empty_doc().unwrap());
    }

    #[test]
    fn test_parse_priority_orders_competing_rules() {
        let mut spec = basic_spec();
        spec.nodes.push((
            "callout".into(),
            NodeSpec::new()
                .content("inline*")
                .group("block")
                .parse_rule(ParseRule::tag("p").with_priority(-1))
                .to_dom(|_| DomOutput::new("aside")),
        ));
        let schema = Schema::new(spec).unwrap();
        let doc = DomParser::from_schema(&schema).parse("<p>x</p>").unwrap();
        assert_eq!(doc.child(0).unwrap().kind(), "callout");
    }
}
