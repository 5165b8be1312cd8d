//! Schema assembly from extension contributions.
//!
//! Node and mark specs are installed in extension order. Extra attributes
//! contributed by other extensions (or by settings) are merged into the
//! specs they target afterwards. Assembly either yields a complete
//! [`Schema`] or fails; nothing partial is ever returned.

use std::collections::{BTreeMap, HashMap};

use remirror_model::{AttributeDef, MarkSpec, NodeSpec, ParseRule, Schema, SchemaSpec};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::priority::Priority;
use crate::settings::ExtraAttributesConfig;
use crate::tags::{Tag, groups_for};

/// Owner name reported for attributes declared in settings
pub const SETTINGS_OWNER: &str = "settings";

/// Which node and mark types an extra attribute applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtraAttributesTarget {
    /// Every node type except `text`
    AllNodes,
    AllMarks,
    Nodes(Vec<String>),
    Marks(Vec<String>),
    /// Node and mark types whose extension carries any of the tags
    Tags(Vec<Tag>),
}

/// A set of attributes injected into other extensions' types.
#[derive(Debug, Clone)]
pub struct ExtraAttributes {
    pub target: ExtraAttributesTarget,
    pub attributes: BTreeMap<String, AttributeDef>,
}

impl ExtraAttributes {
    pub fn new(target: ExtraAttributesTarget) -> Self {
        Self {
            target,
            attributes: BTreeMap::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, def: AttributeDef) -> Self {
        self.attributes.insert(name.into(), def);
        self
    }
}

/// Everything one extension contributes to the schema
#[derive(Debug, Clone)]
pub struct SchemaContribution<'a> {
    pub extension: &'a str,
    pub priority: Priority,
    pub tags: &'a [Tag],
    /// Node type name and spec
    pub node: Option<(String, NodeSpec)>,
    /// Mark type name and spec
    pub mark: Option<(String, MarkSpec)>,
    pub extra_attributes: Vec<ExtraAttributes>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum EntryKind {
    Node,
    Mark,
}

impl EntryKind {
    fn as_str(self) -> &'static str {
        match self {
            EntryKind::Node => "node",
            EntryKind::Mark => "mark",
        }
    }
}

struct Entry<'a> {
    name: String,
    owner: &'a str,
    tags: &'a [Tag],
}

/// Assemble the schema for contributions given in resolved extension order.
///
/// # Errors
///
/// - [`Error::DuplicateSchemaEntry`] when two extensions claim a node or mark name
/// - [`Error::AttributeConflict`] when two definitions of the same attribute
///   on the same type differ
/// - [`Error::Model`] when the merged specs do not form a valid schema
pub fn assemble_schema(
    contributions: Vec<SchemaContribution<'_>>,
    settings_extras: &[ExtraAttributesConfig],
) -> Result<Schema> {
    let mut nodes: Vec<(Entry<'_>, NodeSpec)> = Vec::new();
    let mut marks: Vec<(Entry<'_>, MarkSpec)> = Vec::new();
    let mut extras: Vec<(&str, ExtraAttributes)> = Vec::new();

    for contribution in contributions {
        let owner = contribution.extension;
        let parse_priority = contribution.priority.value();

        if let Some((name, mut spec)) = contribution.node {
            check_unique(&nodes, EntryKind::Node, &name, owner)?;
            fill_parse_priority(&mut spec.parse_dom, parse_priority);
            if spec.group.is_none() {
                spec.group = groups_for(contribution.tags);
            }
            nodes.push((Entry { name, owner, tags: contribution.tags }, spec));
        }
        if let Some((name, mut spec)) = contribution.mark {
            check_unique(&marks, EntryKind::Mark, &name, owner)?;
            fill_parse_priority(&mut spec.parse_dom, parse_priority);
            marks.push((Entry { name, owner, tags: contribution.tags }, spec));
        }
        extras.extend(contribution.extra_attributes.into_iter().map(|e| (owner, e)));
    }

    for config in settings_extras {
        let extra = ExtraAttributes::new(config.target.clone())
            .attr(config.attribute.clone(), config.to_definition());
        extras.push((SETTINGS_OWNER, extra));
    }

    // Owner of every attribute per (kind, type, attribute)
    let mut origins: HashMap<(EntryKind, String, String), String> = HashMap::new();
    for (entry, spec) in &nodes {
        for attr in spec.attrs.keys() {
            origins.insert((EntryKind::Node, entry.name.clone(), attr.clone()), entry.owner.to_string());
        }
    }
    for (entry, spec) in &marks {
        for attr in spec.attrs.keys() {
            origins.insert((EntryKind::Mark, entry.name.clone(), attr.clone()), entry.owner.to_string());
        }
    }

    for (owner, extra) in &extras {
        for index in targets(&nodes, EntryKind::Node, &extra.target)? {
            let (entry, spec) = &mut nodes[index];
            if entry.owner == *owner {
                continue;
            }
            merge_attributes(&mut origins, EntryKind::Node, &entry.name, &mut spec.attrs, owner, extra)?;
        }
        for index in targets(&marks, EntryKind::Mark, &extra.target)? {
            let (entry, spec) = &mut marks[index];
            if entry.owner == *owner {
                continue;
            }
            merge_attributes(&mut origins, EntryKind::Mark, &entry.name, &mut spec.attrs, owner, extra)?;
        }
    }

    tracing::debug!(
        nodes = nodes.len(),
        marks = marks.len(),
        extra_attributes = extras.len(),
        "Assembling schema"
    );

    let schema = Schema::new(SchemaSpec {
        nodes: nodes.into_iter().map(|(e, s)| (e.name, s)).collect(),
        marks: marks.into_iter().map(|(e, s)| (e.name, s)).collect(),
        top_node: Some("doc".to_string()),
    })?;
    Ok(schema)
}

fn check_unique<S>(existing: &[(Entry<'_>, S)], kind: EntryKind, name: &str, owner: &str) -> Result<()> {
    match existing.iter().find(|(e, _)| e.name == name) {
        Some((first, _)) => Err(Error::DuplicateSchemaEntry {
            kind: kind.as_str(),
            name: name.to_string(),
            first: first.owner.to_string(),
            second: owner.to_string(),
        }),
        None => Ok(()),
    }
}

fn fill_parse_priority(rules: &mut [ParseRule], priority: i32) {
    for rule in rules.iter_mut().filter(|r| r.priority.is_none()) {
        rule.priority = Some(priority);
    }
}

/// Indices of the entries of `kind` that `target` selects
fn targets<S>(entries: &[(Entry<'_>, S)], kind: EntryKind, target: &ExtraAttributesTarget) -> Result<Vec<usize>> {
    let all = |filter: &dyn Fn(&Entry<'_>) -> bool| -> Vec<usize> {
        entries
            .iter()
            .enumerate()
            .filter(|(_, (e, _))| filter(e))
            .map(|(i, _)| i)
            .collect()
    };
    let named = |names: &[String]| -> Result<Vec<usize>> {
        names
            .iter()
            .map(|name| {
                entries
                    .iter()
                    .position(|(e, _)| &e.name == name)
                    .ok_or_else(|| match kind {
                        EntryKind::Node => remirror_model::Error::UnknownNodeType(name.clone()).into(),
                        EntryKind::Mark => remirror_model::Error::UnknownMarkType(name.clone()).into(),
                    })
            })
            .collect()
    };

    Ok(match (target, kind) {
        (ExtraAttributesTarget::AllNodes, EntryKind::Node) => all(&|e| e.name != "text"),
        (ExtraAttributesTarget::AllMarks, EntryKind::Mark) => all(&|_| true),
        (ExtraAttributesTarget::Nodes(names), EntryKind::Node) => named(names)?,
        (ExtraAttributesTarget::Marks(names), EntryKind::Mark) => named(names)?,
        (ExtraAttributesTarget::Tags(tags), _) => all(&|e| e.tags.iter().any(|t| tags.contains(t))),
        _ => Vec::new(),
    })
}

fn merge_attributes(
    origins: &mut HashMap<(EntryKind, String, String), String>,
    kind: EntryKind,
    target: &str,
    attrs: &mut BTreeMap<String, AttributeDef>,
    owner: &str,
    extra: &ExtraAttributes,
) -> Result<()> {
    for (name, def) in &extra.attributes {
        match attrs.get(name) {
            Some(existing) if existing.same_definition(def) => {}
            Some(_) => {
                let first = origins
                    .get(&(kind, target.to_string(), name.clone()))
                    .cloned()
                    .unwrap_or_default();
                return Err(Error::AttributeConflict {
                    attribute: name.clone(),
                    target: target.to_string(),
                    first,
                    second: owner.to_string(),
                });
            }
            None => {
                attrs.insert(name.clone(), def.clone());
                origins.insert((kind, target.to_string(), name.clone()), owner.to_string());
                tracing::debug!(attribute = %name, target, owner, "Merged extra attribute");
            }
        }
    }
    Ok(())
}
