//! Transactions: a document, a selection and the steps that produced them.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::attrs::Attrs;
use crate::error::{Error, Result};
use crate::node::{Mark, Node, marks_in_content_at, split_inline};
use crate::resolve::ResolvedPos;
use crate::schema::Schema;
use crate::selection::Selection;
use crate::step::{Mapping, Step};

/// A snapshot of a transaction that can be restored with
/// [`Transaction::rollback`].
#[derive(Debug, Clone)]
pub struct Checkpoint {
    steps: usize,
    doc: Node,
    selection: Selection,
    selection_set: bool,
    meta: HashMap<String, Value>,
}

/// An in-progress change to an editor state.
///
/// Every method that adds a step either applies it fully or returns an error
/// and leaves the transaction untouched.
#[derive(Debug, Clone)]
pub struct Transaction {
    schema: Arc<Schema>,
    before: Node,
    doc: Node,
    steps: Vec<Step>,
    mapping: Mapping,
    selection: Selection,
    selection_set: bool,
    meta: HashMap<String, Value>,
}

impl Transaction {
    pub fn new(schema: Arc<Schema>, doc: Node, selection: Selection) -> Self {
        Self {
            schema,
            before: doc.clone(),
            doc,
            steps: Vec::new(),
            mapping: Mapping::new(),
            selection,
            selection_set: false,
            meta: HashMap::new(),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The document before any step was applied
    pub fn before(&self) -> &Node {
        &self.before
    }

    /// The current document
    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Whether the selection was set explicitly rather than mapped
    pub fn selection_set(&self) -> bool {
        self.selection_set
    }

    /// Whether any step changed the document
    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty() && self.doc != self.before
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            steps: self.steps.len(),
            doc: self.doc.clone(),
            selection: self.selection,
            selection_set: self.selection_set,
            meta: self.meta.clone(),
        }
    }

    /// Restore the transaction to a checkpoint taken earlier from it
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.steps.truncate(checkpoint.steps);
        self.mapping.truncate(checkpoint.steps);
        self.doc = checkpoint.doc;
        self.selection = checkpoint.selection;
        self.selection_set = checkpoint.selection_set;
        self.meta = checkpoint.meta;
    }

    /// Apply a step
    pub fn step(&mut self, step: Step) -> Result<&mut Self> {
        let (doc, map) = step.apply(&self.doc, &self.schema)?;
        let mut single = Mapping::new();
        single.push(map.clone());
        self.selection = self.selection.map(&single);
        self.mapping.push(map);
        self.doc = doc;
        self.steps.push(step);
        Ok(self)
    }

    pub fn set_selection(&mut self, selection: Selection) -> Result<&mut Self> {
        selection.validate(&self.doc)?;
        self.selection = selection;
        self.selection_set = true;
        Ok(self)
    }

    pub fn set_meta(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.meta.insert(key.into(), value);
        self
    }

    pub fn get_meta(&self, key: &str) -> Option<&Value> {
        self.meta.get(key)
    }

    pub fn add_mark(&mut self, from: usize, to: usize, mark: Mark) -> Result<&mut Self> {
        self.step(Step::AddMark { from, to, mark })
    }

    pub fn remove_mark(&mut self, from: usize, to: usize, kind: &str) -> Result<&mut Self> {
        self.step(Step::RemoveMark {
            from,
            to,
            kind: kind.to_string(),
        })
    }

    /// Marks that text inserted at `pos` would carry: those of the text
    /// before it, minus non-inclusive marks that end there.
    pub fn marks_at(&self, pos: usize) -> Result<Vec<Mark>> {
        let rp = ResolvedPos::resolve(&self.doc, pos)?;
        let parent = rp.parent();
        if !self.schema.is_textblock(parent) {
            return Ok(Vec::new());
        }
        let marks = marks_in_content_at(parent.children(), rp.parent_offset);
        let (_, after) = split_inline(parent.children(), rp.parent_offset);
        let following = after.first().map(|n| n.marks().to_vec()).unwrap_or_default();
        let mut kept = Vec::with_capacity(marks.len());
        for mark in marks {
            let inclusive = self.schema.mark_type(&mark.kind)?.spec().inclusive;
            if inclusive || mark.is_in_set(&following) {
                kept.push(mark);
            }
        }
        Ok(kept)
    }

    /// Replace `from..to` with text, inheriting the marks at `from`. The
    /// cursor ends up after the inserted text.
    pub fn insert_text(&mut self, text: &str, from: usize, to: usize) -> Result<&mut Self> {
        let marks = self.marks_at(from)?;
        self.insert_text_with_marks(text, from, to, marks)
    }

    pub fn insert_text_with_marks(
        &mut self,
        text: &str,
        from: usize,
        to: usize,
        marks: Vec<Mark>,
    ) -> Result<&mut Self> {
        self.step(Step::ReplaceText {
            from,
            to,
            text: text.to_string(),
            marks,
        })?;
        let end = from + text.chars().count();
        self.selection = Selection::cursor(end);
        Ok(self)
    }

    /// Replace the current selection with text
    pub fn replace_selection_with_text(&mut self, text: &str) -> Result<&mut Self> {
        let selection = self.selection;
        self.insert_text(text, selection.from(), selection.to())
    }

    /// Delete `from..to`, leaving a cursor where the range started.
    pub fn delete(&mut self, from: usize, to: usize) -> Result<&mut Self> {
        self.step(Step::DeleteRange { from, to })?;
        let mut pos = self.mapping.map(from, -1).min(self.doc.content_size());
        let rp = ResolvedPos::resolve(&self.doc, pos)?;
        if !self.schema.is_textblock(rp.parent())
            && self.doc.node_at(pos).is_some_and(|n| self.schema.is_textblock(n))
        {
            pos += 1;
        }
        self.selection = Selection::cursor(pos);
        Ok(self)
    }

    pub fn delete_selection(&mut self) -> Result<&mut Self> {
        let selection = self.selection;
        self.delete(selection.from(), selection.to())
    }

    pub fn insert_node(&mut self, pos: usize, node: Node) -> Result<&mut Self> {
        self.step(Step::InsertNode { pos, node })
    }

    pub fn delete_node(&mut self, pos: usize) -> Result<&mut Self> {
        self.step(Step::DeleteNode { pos })
    }

    /// Replace the attributes of the node at `pos`, keeping its type
    pub fn set_node_attrs(&mut self, pos: usize, attrs: Attrs) -> Result<&mut Self> {
        let kind = self
            .doc
            .node_at(pos)
            .filter(|n| !n.is_text())
            .map(|n| n.kind().to_string())
            .ok_or_else(|| Error::step(format!("no element starts at position {pos}")))?;
        self.step(Step::SetNodeMarkup { pos, kind, attrs })
    }

    /// Turn every textblock touching `from..to` into `kind` with `attrs`.
    /// Fails without changes when any of them cannot be converted.
    pub fn set_block_type(
        &mut self,
        from: usize,
        to: usize,
        kind: &str,
        attrs: Attrs,
    ) -> Result<&mut Self> {
        let target = self.schema.node_type(kind)?;
        if !target.is_textblock() {
            return Err(Error::step(format!("'{kind}' is not a textblock")));
        }
        let mut positions = Vec::new();
        let schema = Arc::clone(&self.schema);
        let to = to.max(from + 1).min(self.doc.content_size());
        self.doc.nodes_between(from, to, &mut |node, pos| {
            if schema.is_textblock(node) {
                positions.push(pos);
                return false;
            }
            true
        });
        if positions.is_empty() {
            return Err(Error::step(format!("no textblock in range {from}..{to}")));
        }

        let checkpoint = self.checkpoint();
        for pos in positions {
            let step = Step::SetNodeMarkup {
                pos,
                kind: kind.to_string(),
                attrs: attrs.clone(),
            };
            if let Err(err) = self.step(step) {
                self.rollback(checkpoint);
                return Err(err);
            }
        }
        Ok(self)
    }

    /// Replace the whole document
    pub fn replace_doc(&mut self, doc: Node) -> Result<&mut Self> {
        let checkpoint = self.checkpoint();
        if let Err(err) = self.replace_content(&doc) {
            self.rollback(checkpoint);
            return Err(err);
        }
        self.selection = Selection::at_start(&self.doc, &self.schema);
        self.selection_set = true;
        Ok(self)
    }

    fn replace_content(&mut self, doc: &Node) -> Result<()> {
        let size = self.doc.content_size();
        self.step(Step::DeleteRange { from: 0, to: size })?;
        // Whatever the range delete left behind sits after the new content.
        let leftover = self.doc.child_count();
        let mut pos = 0;
        for child in doc.children() {
            self.step(Step::InsertNode {
                pos,
                node: child.clone(),
            })?;
            pos += child.node_size();
        }
        for _ in 0..leftover {
            self.step(Step::DeleteNode { pos })?;
        }
        Ok(())
    }
}
