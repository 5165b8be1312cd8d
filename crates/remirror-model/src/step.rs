//! Atomic document changes and the position maps they produce.

use crate::attrs::Attrs;
use crate::error::{Error, Result};
use crate::node::{Mark, Node, normalize_inline, split_inline};
use crate::resolve::ResolvedPos;
use crate::schema::Schema;

/// A single atomic change to a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Add `mark` to all inline content in `from..to` where the parent allows it.
    AddMark { from: usize, to: usize, mark: Mark },
    /// Remove marks of type `kind` from inline content in `from..to`.
    RemoveMark { from: usize, to: usize, kind: String },
    /// Replace `from..to` inside one textblock with text carrying `marks`.
    ReplaceText {
        from: usize,
        to: usize,
        text: String,
        marks: Vec<Mark>,
    },
    /// Delete `from..to`, joining the textblocks at both ends when they
    /// differ. Deleting every child of a node that requires content refills
    /// it with an empty default textblock.
    DeleteRange { from: usize, to: usize },
    /// Insert `node` at `pos`.
    InsertNode { pos: usize, node: Node },
    /// Delete the node starting at `pos`.
    DeleteNode { pos: usize },
    /// Change the type and attributes of the node starting at `pos`,
    /// keeping its content.
    SetNodeMarkup {
        pos: usize,
        kind: String,
        attrs: Attrs,
    },
}

impl Step {
    /// Apply this step, returning the new document and the map describing
    /// how positions moved.
    pub fn apply(&self, doc: &Node, schema: &Schema) -> Result<(Node, StepMap)> {
        match self {
            Step::AddMark { from, to, mark } => {
                let mark_type = schema.mark_type(&mark.kind)?;
                let mark = Mark::new(mark.kind.clone(), mark_type.compute_attrs(&mark.attrs)?);
                let next = map_inline(doc, schema, *from, *to, &mut |parent, marks| {
                    if parent.allows_mark(&mark.kind) {
                        schema.add_mark_to_set(marks, &mark)
                    } else {
                        Ok(marks.to_vec())
                    }
                })?;
                Ok((next, StepMap::identity()))
            }
            Step::RemoveMark { from, to, kind } => {
                schema.mark_type(kind)?;
                let next = map_inline(doc, schema, *from, *to, &mut |_, marks| {
                    Ok(marks.iter().filter(|m| &m.kind != kind).cloned().collect())
                })?;
                Ok((next, StepMap::identity()))
            }
            Step::ReplaceText {
                from,
                to,
                text,
                marks,
            } => {
                let next = replace_text(doc, schema, *from, *to, text, marks)?;
                Ok((next, StepMap::new(vec![(*from, to - from, text.chars().count())])))
            }
            Step::DeleteRange { from, to } => {
                let next = delete_range(doc, schema, *from, *to)?;
                let map = range_map(*from, *to, doc, &next);
                Ok((next, map))
            }
            Step::InsertNode { pos, node } => {
                let next = insert_node(doc, schema, *pos, node)?;
                Ok((next, StepMap::new(vec![(*pos, 0, node.node_size())])))
            }
            Step::DeleteNode { pos } => {
                let size = doc.node_at(*pos).map(Node::node_size).unwrap_or(0);
                let next = delete_node(doc, schema, *pos)?;
                Ok((next, StepMap::new(vec![(*pos, size, 0)])))
            }
            Step::SetNodeMarkup { pos, kind, attrs } => {
                let next = set_node_markup(doc, schema, *pos, kind, attrs)?;
                Ok((next, StepMap::identity()))
            }
        }
    }
}

/// Map for a step that replaced `from..to` and changed the document size by
/// whatever it inserted in its place.
fn range_map(from: usize, to: usize, before: &Node, after: &Node) -> StepMap {
    let old_size = to - from;
    let new_size = (after.content_size() + old_size).saturating_sub(before.content_size());
    StepMap::new(vec![(from, old_size, new_size)])
}

/// Rewrite the ancestor chain of a resolved position, replacing the node at
/// `depth` with `replacement`.
fn rebuild(rp: &ResolvedPos<'_>, depth: usize, replacement: Node) -> Node {
    let mut node = replacement;
    for d in (0..depth).rev() {
        let parent = rp.node(d);
        let mut content = parent.children().to_vec();
        content[rp.index(d)] = node;
        node = parent.with_content(content);
    }
    node
}

fn textblock_at<'a>(
    doc: &'a Node,
    schema: &Schema,
    pos: usize,
) -> Result<(ResolvedPos<'a>, bool)> {
    let rp = ResolvedPos::resolve(doc, pos)?;
    let is_textblock = schema.is_textblock(rp.parent());
    Ok((rp, is_textblock))
}

fn replace_text(
    doc: &Node,
    schema: &Schema,
    from: usize,
    to: usize,
    text: &str,
    marks: &[Mark],
) -> Result<Node> {
    if from > to {
        return Err(Error::step(format!("invalid range {from}..{to}")));
    }
    let (start, is_textblock) = textblock_at(doc, schema, from)?;
    let end = ResolvedPos::resolve(doc, to)?;
    if !is_textblock || !start.same_parent(&end) {
        return Err(Error::step(format!(
            "range {from}..{to} does not lie inside a single textblock"
        )));
    }
    let parent = start.parent();
    let parent_type = schema.node_type(parent.kind())?;
    for mark in marks {
        if !parent_type.allows_mark(&mark.kind) {
            return Err(Error::MarkNotAllowed {
                mark: mark.kind.clone(),
                node: parent.kind().to_string(),
            });
        }
    }

    let (before, rest) = split_inline(parent.children(), start.parent_offset);
    let (_, after) = split_inline(&rest, end.parent_offset - start.parent_offset);
    let mut content = before;
    if !text.is_empty() {
        content.push(schema.text(text, marks.to_vec())?);
    }
    content.extend(after);

    let replaced = parent.with_content(normalize_inline(content));
    Ok(rebuild(&start, start.depth(), replaced))
}

fn delete_range(doc: &Node, schema: &Schema, from: usize, to: usize) -> Result<Node> {
    if from > to {
        return Err(Error::step(format!("invalid range {from}..{to}")));
    }
    let start = ResolvedPos::resolve(doc, from)?;
    let end = ResolvedPos::resolve(doc, to)?;

    if start.same_parent(&end) {
        let parent = start.parent();
        let parent_type = schema.node_type(parent.kind())?;
        if parent_type.is_textblock() {
            return replace_text(doc, schema, from, to, "", &[]);
        }
        // Block boundaries inside one parent: drop whole children.
        let (before, rest) = split_inline(parent.children(), start.parent_offset);
        let (_, after) = split_inline(&rest, end.parent_offset - start.parent_offset);
        let mut content = before;
        content.extend(after);
        if schema.check_content(parent_type, &content).is_err() {
            let filler = schema
                .default_textblock()
                .ok_or_else(|| Error::step("no textblock available to refill content"))?;
            let filler = schema.create_and_fill(filler.name())?;
            content.insert(start.index(start.depth()), filler);
            schema.check_content(parent_type, &content)?;
        }
        return Ok(rebuild(&start, start.depth(), parent.with_content(content)));
    }

    // Join two sibling textblocks.
    let depth = start.depth();
    if depth == 0
        || end.depth() != depth
        || start.start(depth - 1) != end.start(depth - 1)
        || !schema.is_textblock(start.parent())
        || !schema.is_textblock(end.parent())
    {
        return Err(Error::step(format!(
            "range {from}..{to} does not span sibling textblocks"
        )));
    }
    let head_block = start.parent();
    let (kept_head, _) = split_inline(head_block.children(), start.parent_offset);
    let (_, kept_tail) = split_inline(end.parent().children(), end.parent_offset);
    let mut joined_content = kept_head;
    joined_content.extend(kept_tail);
    let joined_content = normalize_inline(joined_content);
    schema.check_content(schema.node_type(head_block.kind())?, &joined_content)?;
    let joined = head_block.with_content(joined_content);

    let container = start.node(depth - 1);
    let first = start.index(depth - 1);
    let last = end.index(depth - 1);
    let mut siblings = container.children()[..first].to_vec();
    siblings.push(joined);
    siblings.extend_from_slice(&container.children()[last + 1..]);
    Ok(rebuild(&start, depth - 1, container.with_content(siblings)))
}

fn insert_node(doc: &Node, schema: &Schema, pos: usize, node: &Node) -> Result<Node> {
    let rp = ResolvedPos::resolve(doc, pos)?;
    let parent = rp.parent();
    let parent_type = schema.node_type(parent.kind())?;

    let (before, after) = split_inline(parent.children(), rp.parent_offset);
    let mut content = before;
    content.push(node.clone());
    content.extend(after);
    if parent_type.is_textblock() {
        content = normalize_inline(content);
    }
    schema.check_content(parent_type, &content)?;

    let replaced = parent.with_content(content);
    Ok(rebuild(&rp, rp.depth(), replaced))
}

fn delete_node(doc: &Node, schema: &Schema, pos: usize) -> Result<Node> {
    let rp = ResolvedPos::resolve(doc, pos)?;
    let parent = rp.parent();
    let index = rp.index(rp.depth());
    let starts_here = doc.node_at(pos).is_some();
    if !starts_here || index >= parent.child_count() {
        return Err(Error::step(format!("no node starts at position {pos}")));
    }
    let mut content = parent.children().to_vec();
    content.remove(index);
    let parent_type = schema.node_type(parent.kind())?;
    if parent_type.is_textblock() {
        content = normalize_inline(content);
    }
    schema.check_content(parent_type, &content)?;

    let replaced = parent.with_content(content);
    Ok(rebuild(&rp, rp.depth(), replaced))
}

fn set_node_markup(
    doc: &Node,
    schema: &Schema,
    pos: usize,
    kind: &str,
    attrs: &Attrs,
) -> Result<Node> {
    let rp = ResolvedPos::resolve(doc, pos)?;
    let target = doc
        .node_at(pos)
        .filter(|n| !n.is_text())
        .ok_or_else(|| Error::step(format!("no element starts at position {pos}")))?;

    let new_type = schema.node_type(kind)?;
    if new_type.is_leaf() != target.is_leaf() {
        return Err(Error::step(format!(
            "cannot change '{}' into '{}'",
            target.kind(),
            kind
        )));
    }
    // Marks the new type does not allow are dropped from the content.
    let content: Vec<Node> = target
        .children()
        .iter()
        .map(|child| {
            let mut child = child.clone();
            child.marks.retain(|m| new_type.allows_mark(&m.kind));
            child
        })
        .collect();
    let content = if new_type.is_textblock() {
        normalize_inline(content)
    } else {
        content
    };
    let replaced = schema.node_with_marks(kind, attrs.clone(), content, target.marks().to_vec())?;

    let parent = rp.parent();
    let mut siblings = parent.children().to_vec();
    siblings[rp.index(rp.depth())] = replaced;
    let parent_type = schema.node_type(parent.kind())?;
    schema.check_content(parent_type, &siblings)?;
    Ok(rebuild(&rp, rp.depth(), parent.with_content(siblings)))
}

/// Apply `f` to the marks of every inline node overlapping `from..to`.
fn map_inline(
    doc: &Node,
    schema: &Schema,
    from: usize,
    to: usize,
    f: &mut dyn FnMut(&crate::schema::NodeType, &[Mark]) -> Result<Vec<Mark>>,
) -> Result<Node> {
    let size = doc.content_size();
    if from > to || to > size {
        return Err(Error::PositionOutOfRange { pos: to, size });
    }
    map_inline_in(doc, schema, from, to, 0, f)
}

fn map_inline_in(
    node: &Node,
    schema: &Schema,
    from: usize,
    to: usize,
    content_start: usize,
    f: &mut dyn FnMut(&crate::schema::NodeType, &[Mark]) -> Result<Vec<Mark>>,
) -> Result<Node> {
    let node_type = schema.node_type(node.kind())?;
    if node_type.is_textblock() {
        let local_from = from.saturating_sub(content_start);
        let local_to = (to - content_start.min(to)).min(node.content_size());
        if local_from >= local_to {
            return Ok(node.clone());
        }
        let (before, rest) = split_inline(node.children(), local_from);
        let (middle, after) = split_inline(&rest, local_to - local_from);
        let mut content = before;
        for mut child in middle {
            child.marks = f(node_type, &child.marks)?;
            content.push(child);
        }
        content.extend(after);
        return Ok(node.with_content(normalize_inline(content)));
    }

    let mut content = Vec::with_capacity(node.child_count());
    let mut pos = content_start;
    for child in node.children() {
        let end = pos + child.node_size();
        if end > from && pos < to && !child.is_leaf() {
            content.push(map_inline_in(child, schema, from, to, pos + 1, f)?);
        } else {
            content.push(child.clone());
        }
        pos = end;
    }
    Ok(node.with_content(content))
}

/// Result of mapping a position through a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapResult {
    pub pos: usize,
    /// Whether the content around the original position was deleted.
    pub deleted: bool,
}

/// How a single step moves positions: a list of replaced ranges given as
/// `(start, old_size, new_size)` in pre-step coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StepMap {
    ranges: Vec<(usize, usize, usize)>,
}

impl StepMap {
    pub fn new(ranges: Vec<(usize, usize, usize)>) -> Self {
        Self { ranges }
    }

    pub fn identity() -> Self {
        Self::default()
    }

    /// Map a position. `assoc` picks the side (-1 before, 1 after) an
    /// insertion exactly at `pos` ends up on.
    pub fn map_result(&self, pos: usize, assoc: i8) -> MapResult {
        let mut diff: isize = 0;
        for &(start, old_size, new_size) in &self.ranges {
            if start > pos {
                break;
            }
            let end = start + old_size;
            if pos <= end {
                let side = if old_size == 0 {
                    assoc
                } else if pos == start {
                    -1
                } else if pos == end {
                    1
                } else {
                    assoc
                };
                let base = start as isize + diff;
                let mapped = if side < 0 { base } else { base + new_size as isize };
                return MapResult {
                    pos: mapped.max(0) as usize,
                    deleted: pos != start && pos != end,
                };
            }
            diff += new_size as isize - old_size as isize;
        }
        MapResult {
            pos: (pos as isize + diff).max(0) as usize,
            deleted: false,
        }
    }

    pub fn map(&self, pos: usize, assoc: i8) -> usize {
        self.map_result(pos, assoc).pos
    }
}

/// A sequence of step maps.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    pub fn truncate(&mut self, len: usize) {
        self.maps.truncate(len);
    }

    pub fn extend(&mut self, other: &Mapping) {
        self.maps.extend(other.maps.iter().cloned());
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Map a position through every step, reporting deletion if any step
    /// deleted the content around it.
    pub fn map_result(&self, pos: usize, assoc: i8) -> MapResult {
        let mut deleted = false;
        let mut pos = pos;
        for map in &self.maps {
            let result = map.map_result(pos, assoc);
            deleted |= result.deleted;
            pos = result.pos;
        }
        MapResult { pos, deleted }
    }

    pub fn map(&self, pos: usize, assoc: i8) -> usize {
        self.map_result(pos, assoc).pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    // Insertion of 3 at 5.
    #[case(vec![(5, 0, 3)], 2, 1, 2, false)]
    #[case(vec![(5, 0, 3)], 5, 1, 8, false)]
    #[case(vec![(5, 0, 3)], 5, -1, 5, false)]
    #[case(vec![(5, 0, 3)], 9, 1, 12, false)]
    // Deletion of 5..9.
    #[case(vec![(5, 4, 0)], 7, 1, 5, true)]
    #[case(vec![(5, 4, 0)], 5, 1, 5, false)]
    #[case(vec![(5, 4, 0)], 9, 1, 5, false)]
    #[case(vec![(5, 4, 0)], 12, 1, 8, false)]
    fn test_step_map(
        #[case] ranges: Vec<(usize, usize, usize)>,
        #[case] pos: usize,
        #[case] assoc: i8,
        #[case] expected: usize,
        #[case] deleted: bool,
    ) {
        let result = StepMap::new(ranges).map_result(pos, assoc);
        assert_eq!(result, MapResult { pos: expected, deleted });
    }

    #[test]
    fn test_mapping_accumulates_deletion() {
        let mut mapping = Mapping::new();
        mapping.push(StepMap::new(vec![(2, 0, 4)]));
        mapping.push(StepMap::new(vec![(6, 3, 0)]));
        let result = mapping.map_result(5, 1);
        assert_eq!(result.pos, 6);
        assert!(!result.deleted);
        let inner = mapping.map_result(4, 1);
        assert_eq!(inner.pos, 6);
        assert!(inner.deleted);
    }
}
