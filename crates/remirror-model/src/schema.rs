//! Schema: the set of node and mark types a document may contain.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::attrs::{AttributeDef, Attrs, ParseRule, ToDomFn};
use crate::content::{ContentExpr, parse_expr};
use crate::error::{Error, Result};
use crate::node::{Mark, Node, normalize_inline};

/// Declaration of a node type.
#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    /// Content expression; `None` makes the node a leaf.
    pub content: Option<String>,
    /// Space separated list of groups this node belongs to.
    pub group: Option<String>,
    pub inline: bool,
    /// Allowed marks: `"_"` for all, `""` for none, or space separated names.
    /// Defaults to all marks for textblocks and none otherwise.
    pub marks: Option<String>,
    pub attrs: BTreeMap<String, AttributeDef>,
    pub parse_dom: Vec<ParseRule>,
    pub to_dom: Option<ToDomFn>,
}

impl NodeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, expr: impl Into<String>) -> Self {
        self.content = Some(expr.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn inline(mut self) -> Self {
        self.inline = true;
        self
    }

    pub fn marks(mut self, marks: impl Into<String>) -> Self {
        self.marks = Some(marks.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, def: AttributeDef) -> Self {
        self.attrs.insert(name.into(), def);
        self
    }

    pub fn parse_rule(mut self, rule: ParseRule) -> Self {
        self.parse_dom.push(rule);
        self
    }

    pub fn to_dom(mut self, to_dom: ToDomFn) -> Self {
        self.to_dom = Some(to_dom);
        self
    }
}

/// Declaration of a mark type.
#[derive(Debug, Clone)]
pub struct MarkSpec {
    pub attrs: BTreeMap<String, AttributeDef>,
    pub parse_dom: Vec<ParseRule>,
    pub to_dom: Option<ToDomFn>,
    /// Whether text typed at the end of the mark inherits it.
    pub inclusive: bool,
}

impl Default for MarkSpec {
    fn default() -> Self {
        Self {
            attrs: BTreeMap::new(),
            parse_dom: Vec::new(),
            to_dom: None,
            inclusive: true,
        }
    }
}

impl MarkSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attr(mut self, name: impl Into<String>, def: AttributeDef) -> Self {
        self.attrs.insert(name.into(), def);
        self
    }

    pub fn parse_rule(mut self, rule: ParseRule) -> Self {
        self.parse_dom.push(rule);
        self
    }

    pub fn to_dom(mut self, to_dom: ToDomFn) -> Self {
        self.to_dom = Some(to_dom);
        self
    }

    pub fn exclusive(mut self) -> Self {
        self.inclusive = false;
        self
    }
}

/// Input to [`Schema::new`]: ordered node and mark declarations.
#[derive(Debug, Clone, Default)]
pub struct SchemaSpec {
    pub nodes: Vec<(String, NodeSpec)>,
    pub marks: Vec<(String, MarkSpec)>,
    /// Name of the top node; defaults to `doc`.
    pub top_node: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AllowedMarks {
    All,
    Only(Vec<String>),
}

/// A resolved node type
#[derive(Debug, Clone)]
pub struct NodeType {
    name: String,
    index: usize,
    spec: NodeSpec,
    groups: Vec<String>,
    content: ContentExpr,
    textblock: bool,
    allowed_marks: AllowedMarks,
}

impl NodeType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &NodeSpec {
        &self.spec
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn content_expr(&self) -> &ContentExpr {
        &self.content
    }

    pub fn is_leaf(&self) -> bool {
        self.spec.content.is_none()
    }

    pub fn is_inline(&self) -> bool {
        self.spec.inline
    }

    pub fn is_block(&self) -> bool {
        !self.spec.inline
    }

    /// A block whose content is inline
    pub fn is_textblock(&self) -> bool {
        self.textblock
    }

    pub fn allows_mark(&self, mark: &str) -> bool {
        match &self.allowed_marks {
            AllowedMarks::All => true,
            AllowedMarks::Only(names) => names.iter().any(|n| n == mark),
        }
    }

    /// Fill in defaults and check required attributes
    pub fn compute_attrs(&self, given: &Attrs) -> Result<Attrs> {
        compute_attrs(&self.name, &self.spec.attrs, given)
    }
}

/// A resolved mark type
#[derive(Debug, Clone)]
pub struct MarkType {
    name: String,
    rank: usize,
    spec: MarkSpec,
}

impl MarkType {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position of this mark in the schema; marks on a node are kept in rank order.
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn spec(&self) -> &MarkSpec {
        &self.spec
    }

    pub fn compute_attrs(&self, given: &Attrs) -> Result<Attrs> {
        compute_attrs(&self.name, &self.spec.attrs, given)
    }
}

fn compute_attrs(owner: &str, defs: &BTreeMap<String, AttributeDef>, given: &Attrs) -> Result<Attrs> {
    let mut attrs = Attrs::new();
    for (name, def) in defs {
        let value = match given.get(name) {
            Some(value) => value.clone(),
            None => def.default.clone().ok_or_else(|| Error::MissingAttribute {
                owner: owner.to_string(),
                attribute: name.clone(),
            })?,
        };
        attrs.insert(name.clone(), value);
    }
    Ok(attrs)
}

/// The compiled schema. Immutable once built.
#[derive(Debug, Clone)]
pub struct Schema {
    nodes: Vec<NodeType>,
    marks: Vec<MarkType>,
    node_index: HashMap<String, usize>,
    mark_index: HashMap<String, usize>,
    top_node: String,
}

impl Schema {
    /// Compile a schema from its declarations.
    ///
    /// # Errors
    ///
    /// Fails on duplicate names, a missing top or `text` node, and content
    /// expressions that are malformed or reference unknown names.
    pub fn new(spec: SchemaSpec) -> Result<Self> {
        let top_node = spec.top_node.unwrap_or_else(|| "doc".to_string());

        let mut node_index = HashMap::new();
        for (index, (name, _)) in spec.nodes.iter().enumerate() {
            if node_index.insert(name.clone(), index).is_some() {
                return Err(Error::DuplicateType {
                    kind: "node",
                    name: name.clone(),
                });
            }
        }
        let mut mark_index = HashMap::new();
        for (index, (name, _)) in spec.marks.iter().enumerate() {
            if mark_index.insert(name.clone(), index).is_some() {
                return Err(Error::DuplicateType {
                    kind: "mark",
                    name: name.clone(),
                });
            }
        }
        for required in [top_node.as_str(), "text"] {
            if !node_index.contains_key(required) {
                return Err(Error::MissingNodeType(required.to_string()));
            }
        }

        let groups: Vec<Vec<String>> = spec
            .nodes
            .iter()
            .map(|(_, s)| {
                s.group
                    .as_deref()
                    .unwrap_or("")
                    .split_whitespace()
                    .map(str::to_string)
                    .collect()
            })
            .collect();
        let lookup = |name: &str| -> Vec<usize> {
            if let Some(&index) = node_index.get(name) {
                return vec![index];
            }
            groups
                .iter()
                .enumerate()
                .filter(|(_, g)| g.iter().any(|g| g == name))
                .map(|(i, _)| i)
                .collect()
        };

        let mut contents = Vec::with_capacity(spec.nodes.len());
        for (name, node_spec) in &spec.nodes {
            let expr = match node_spec.content.as_deref() {
                Some(source) => ContentExpr::resolve(name, parse_expr(name, source)?, lookup)?,
                None => ContentExpr::empty(),
            };
            contents.push(expr);
        }

        let inline: Vec<bool> = spec.nodes.iter().map(|(_, s)| s.inline).collect();
        let mark_names: Vec<String> = spec.marks.iter().map(|(n, _)| n.clone()).collect();
        let mut nodes = Vec::with_capacity(spec.nodes.len());
        for (index, ((name, node_spec), content)) in
            spec.nodes.into_iter().zip(contents).enumerate()
        {
            let textblock =
                !node_spec.inline && !content.is_empty() && content.accepted().all(|i| inline[i]);
            let allowed_marks = match node_spec.marks.as_deref() {
                Some("_") => AllowedMarks::All,
                Some(list) => {
                    let names: Vec<String> = list.split_whitespace().map(str::to_string).collect();
                    if let Some(unknown) = names.iter().find(|m| !mark_names.contains(m)) {
                        return Err(Error::UnknownMarkType(unknown.clone()));
                    }
                    AllowedMarks::Only(names)
                }
                None if textblock => AllowedMarks::All,
                None => AllowedMarks::Only(Vec::new()),
            };
            nodes.push(NodeType {
                name,
                index,
                spec: node_spec,
                groups: groups[index].clone(),
                content,
                textblock,
                allowed_marks,
            });
        }

        let marks = spec
            .marks
            .into_iter()
            .enumerate()
            .map(|(rank, (name, spec))| MarkType { name, rank, spec })
            .collect();

        tracing::debug!(
            nodes = node_index.len(),
            marks = mark_index.len(),
            top = %top_node,
            "Compiled schema"
        );

        Ok(Self {
            nodes,
            marks,
            node_index,
            mark_index,
            top_node,
        })
    }

    pub fn top_node_type(&self) -> &NodeType {
        &self.nodes[self.node_index[&self.top_node]]
    }

    pub fn node_type(&self, name: &str) -> Result<&NodeType> {
        self.node_index
            .get(name)
            .map(|&i| &self.nodes[i])
            .ok_or_else(|| Error::UnknownNodeType(name.to_string()))
    }

    pub fn mark_type(&self, name: &str) -> Result<&MarkType> {
        self.mark_index
            .get(name)
            .map(|&i| &self.marks[i])
            .ok_or_else(|| Error::UnknownMarkType(name.to_string()))
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.node_index.contains_key(name)
    }

    pub fn has_mark(&self, name: &str) -> bool {
        self.mark_index.contains_key(name)
    }

    /// Node types in declaration order
    pub fn nodes(&self) -> &[NodeType] {
        &self.nodes
    }

    /// Mark types in rank order
    pub fn marks(&self) -> &[MarkType] {
        &self.marks
    }

    /// The first textblock type in schema order, used to wrap stray inline content
    pub fn default_textblock(&self) -> Option<&NodeType> {
        self.nodes.iter().find(|n| n.textblock)
    }

    /// Whether `node` is an instance of a textblock type
    pub fn is_textblock(&self, node: &Node) -> bool {
        self.node_type(node.kind()).is_ok_and(NodeType::is_textblock)
    }

    /// Create a mark, filling in default attributes
    pub fn mark(&self, name: &str, attrs: Attrs) -> Result<Mark> {
        let mark_type = self.mark_type(name)?;
        Ok(Mark::new(name, mark_type.compute_attrs(&attrs)?))
    }

    /// Sort marks by rank and drop duplicates of the same type (last wins)
    pub fn normalize_marks(&self, marks: Vec<Mark>) -> Result<Vec<Mark>> {
        let mut ranked: Vec<(usize, Mark)> = Vec::with_capacity(marks.len());
        for mark in marks {
            let rank = self.mark_type(&mark.kind)?.rank;
            ranked.retain(|(r, _)| *r != rank);
            ranked.push((rank, mark));
        }
        ranked.sort_by_key(|(rank, _)| *rank);
        Ok(ranked.into_iter().map(|(_, m)| m).collect())
    }

    /// Add `mark` to a mark set, replacing any mark of the same type
    pub fn add_mark_to_set(&self, set: &[Mark], mark: &Mark) -> Result<Vec<Mark>> {
        let mut marks: Vec<Mark> = set.iter().filter(|m| m.kind != mark.kind).cloned().collect();
        marks.push(mark.clone());
        self.normalize_marks(marks)
    }

    /// Create a text node. Empty text is rejected.
    pub fn text(&self, text: impl Into<String>, marks: Vec<Mark>) -> Result<Node> {
        let text = text.into();
        if text.is_empty() {
            return Err(Error::content("text", "empty text nodes are not allowed"));
        }
        Ok(Node::new_text(text, self.normalize_marks(marks)?))
    }

    /// Create and validate an element node
    pub fn node(&self, name: &str, attrs: Attrs, content: Vec<Node>) -> Result<Node> {
        self.node_with_marks(name, attrs, content, Vec::new())
    }

    /// Create and validate an element node carrying marks (inline leaves)
    pub fn node_with_marks(
        &self,
        name: &str,
        attrs: Attrs,
        content: Vec<Node>,
        marks: Vec<Mark>,
    ) -> Result<Node> {
        let node_type = self.node_type(name)?;
        if name == "text" {
            return Err(Error::content("text", "use Schema::text to create text nodes"));
        }
        let attrs = node_type.compute_attrs(&attrs)?;
        let content = if node_type.textblock {
            normalize_inline(content)
        } else {
            content
        };
        self.check_content(node_type, &content)?;
        Ok(Node::new_element(
            name.to_string(),
            attrs,
            content,
            self.normalize_marks(marks)?,
            node_type.is_leaf(),
        ))
    }

    /// Check that `content` is valid for `node_type`, including allowed marks
    pub fn check_content(&self, node_type: &NodeType, content: &[Node]) -> Result<()> {
        let mut indices = Vec::with_capacity(content.len());
        for child in content {
            let child_type = self.node_type(child.kind())?;
            indices.push(child_type.index);
            for mark in child.marks() {
                if !node_type.allows_mark(&mark.kind) {
                    return Err(Error::MarkNotAllowed {
                        mark: mark.kind.clone(),
                        node: node_type.name.clone(),
                    });
                }
            }
        }
        if !node_type.content.matches(&indices) {
            let kinds: Vec<&str> = content.iter().map(Node::kind).collect();
            return Err(Error::content(
                &node_type.name,
                format!(
                    "children [{}] do not match '{}'",
                    kinds.join(", "),
                    node_type.spec.content.as_deref().unwrap_or("")
                ),
            ));
        }
        Ok(())
    }

    /// Create the smallest valid node of the given type
    pub fn create_and_fill(&self, name: &str) -> Result<Node> {
        self.create_and_fill_depth(name, 0)
    }

    fn create_and_fill_depth(&self, name: &str, depth: usize) -> Result<Node> {
        if depth > 32 {
            return Err(Error::content(name, "content cannot be filled without recursion"));
        }
        let node_type = self.node_type(name)?;
        let mut content = Vec::new();
        for term in node_type.content.terms() {
            for _ in 0..term.min {
                let filler = term
                    .choices
                    .iter()
                    .map(|&i| &self.nodes[i])
                    .find(|n| !n.spec.inline && n.name != "text")
                    .ok_or_else(|| Error::content(name, "required content cannot be generated"))?;
                content.push(self.create_and_fill_depth(&filler.name.clone(), depth + 1)?);
            }
        }
        self.node(name, Attrs::new(), content)
    }

    /// An empty document of the top node type
    pub fn empty_doc(&self) -> Result<Node> {
        self.create_and_fill(&self.top_node)
    }

    /// Build a document from the engine's JSON format, validating it.
    pub fn node_from_json(&self, value: &Value) -> Result<Node> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::InvalidJson("node must be an object".into()))?;
        let kind = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidJson("node is missing 'type'".into()))?;

        let marks = match obj.get("marks") {
            Some(Value::Array(raw)) => {
                let mut marks = Vec::with_capacity(raw.len());
                for m in raw {
                    let mark: Mark = serde_json::from_value(m.clone())?;
                    marks.push(self.mark(&mark.kind, mark.attrs)?);
                }
                marks
            }
            Some(_) => return Err(Error::InvalidJson("'marks' must be an array".into())),
            None => Vec::new(),
        };

        if kind == "text" {
            let text = obj
                .get("text")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::InvalidJson("text node is missing 'text'".into()))?;
            return self.text(text, marks);
        }

        let attrs: Attrs = match obj.get("attrs") {
            Some(Value::Object(map)) => map.clone().into_iter().collect(),
            Some(_) => return Err(Error::InvalidJson("'attrs' must be an object".into())),
            None => Attrs::new(),
        };
        let content = match obj.get("content") {
            Some(Value::Array(children)) => children
                .iter()
                .map(|c| self.node_from_json(c))
                .collect::<Result<Vec<_>>>()?,
            Some(_) => return Err(Error::InvalidJson("'content' must be an array".into())),
            None => Vec::new(),
        };
        self.node_with_marks(kind, attrs, content, marks)
    }
}
