//! Text selections.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::node::Node;
use crate::resolve::ResolvedPos;
use crate::schema::Schema;
use crate::step::Mapping;

/// A selection between two positions. `anchor` stays put while `head` moves
/// when the selection is extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// A collapsed selection at `pos`
    pub fn cursor(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    /// A selection spanning the whole document content
    pub fn all(doc: &Node) -> Self {
        Self::new(0, doc.content_size())
    }

    /// A cursor at the start of the first textblock, or position 0 if the
    /// document has none.
    pub fn at_start(doc: &Node, schema: &Schema) -> Self {
        let mut found = None;
        doc.descendants(&mut |node, pos| {
            if found.is_some() {
                return false;
            }
            if schema.is_textblock(node) {
                found = Some(pos + 1);
                return false;
            }
            true
        });
        Self::cursor(found.unwrap_or(0))
    }

    /// A cursor at the end of the last textblock
    pub fn at_end(doc: &Node, schema: &Schema) -> Self {
        let mut found = None;
        doc.descendants(&mut |node, pos| {
            if schema.is_textblock(node) {
                found = Some(pos + node.node_size() - 1);
                return false;
            }
            true
        });
        Self::cursor(found.unwrap_or(0))
    }

    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn empty(&self) -> bool {
        self.anchor == self.head
    }

    /// Map both ends through a change
    pub fn map(&self, mapping: &Mapping) -> Self {
        Self::new(mapping.map(self.anchor, 1), mapping.map(self.head, 1))
    }

    /// Check that both ends lie inside `doc`.
    pub fn validate(&self, doc: &Node) -> Result<()> {
        let size = doc.content_size();
        for pos in [self.anchor, self.head] {
            if pos > size {
                return Err(Error::PositionOutOfRange { pos, size });
            }
        }
        Ok(())
    }

    /// Whether the whole selection lies inside one textblock
    pub fn in_single_textblock(&self, doc: &Node, schema: &Schema) -> bool {
        let (Ok(from), Ok(to)) = (
            ResolvedPos::resolve(doc, self.from()),
            ResolvedPos::resolve(doc, self.to()),
        ) else {
            return false;
        };
        from.same_parent(&to) && schema.is_textblock(from.parent())
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::cursor(0)
    }
}
