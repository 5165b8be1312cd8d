//! Resolving flat positions into their place in the tree.

use crate::error::Result;
use crate::node::Node;

/// A position resolved against a document: the chain of ancestors that
/// contain it and the offset into the innermost one.
#[derive(Debug, Clone)]
pub struct ResolvedPos<'a> {
    pub pos: usize,
    /// Ancestors from the top node down to the direct parent.
    nodes: Vec<&'a Node>,
    /// Index into each ancestor's children at this position.
    indices: Vec<usize>,
    /// Absolute position where each ancestor's content starts.
    starts: Vec<usize>,
    pub parent_offset: usize,
}

impl<'a> ResolvedPos<'a> {
    pub fn resolve(doc: &'a Node, pos: usize) -> Result<Self> {
        let mut nodes = Vec::new();
        let mut indices = Vec::new();
        let mut starts = Vec::new();

        let mut node = doc;
        let mut start = 0;
        let mut offset = pos;
        loop {
            let (index, child_start) = node.find_index(offset)?;
            let rem = offset - child_start;
            nodes.push(node);
            indices.push(index);
            starts.push(start);
            if rem == 0 {
                break;
            }
            let Some(child) = node.child(index) else {
                break;
            };
            if child.is_text() || child.is_leaf() {
                break;
            }
            node = child;
            start += child_start + 1;
            offset = rem - 1;
        }

        Ok(Self {
            pos,
            nodes,
            indices,
            starts,
            parent_offset: offset,
        })
    }

    /// Depth of the parent node (0 for the top node)
    pub fn depth(&self) -> usize {
        self.nodes.len() - 1
    }

    /// The direct parent of this position
    pub fn parent(&self) -> &'a Node {
        self.nodes[self.depth()]
    }

    /// The ancestor at `depth`
    pub fn node(&self, depth: usize) -> &'a Node {
        self.nodes[depth]
    }

    /// Child index in the ancestor at `depth`
    pub fn index(&self, depth: usize) -> usize {
        self.indices[depth]
    }

    /// Start of the content of the ancestor at `depth`
    pub fn start(&self, depth: usize) -> usize {
        self.starts[depth]
    }

    /// End of the content of the ancestor at `depth`
    pub fn end(&self, depth: usize) -> usize {
        self.starts[depth] + self.nodes[depth].content_size()
    }

    /// Position directly before the ancestor at `depth` (`depth >= 1`)
    pub fn before(&self, depth: usize) -> usize {
        self.starts[depth].saturating_sub(1)
    }

    /// Position directly after the ancestor at `depth` (`depth >= 1`)
    pub fn after(&self, depth: usize) -> usize {
        self.end(depth) + 1
    }

    /// Whether this position and `other` share the same parent node
    pub fn same_parent(&self, other: &ResolvedPos<'_>) -> bool {
        self.depth() == other.depth() && self.start(self.depth()) == other.start(other.depth())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::Attrs;

    fn sample() -> Node {
        let text = |s: &str| Node::new_text(s.to_string(), vec![]);
        let para = |c| Node::new_element("paragraph".into(), Attrs::new(), c, vec![], false);
        Node::new_element(
            "doc".into(),
            Attrs::new(),
            vec![para(vec![text("abc")]), para(vec![text("de")])],
            vec![],
            false,
        )
    }

    #[test]
    fn test_resolve_inside_text() {
        let doc = sample();
        let rp = ResolvedPos::resolve(&doc, 2).unwrap();
        assert_eq!(rp.depth(), 1);
        assert_eq!(rp.parent().kind(), "paragraph");
        assert_eq!(rp.parent_offset, 1);
        assert_eq!(rp.start(1), 1);
        assert_eq!(rp.end(1), 4);
        assert_eq!(rp.before(1), 0);
        assert_eq!(rp.after(1), 5);
    }

    #[test]
    fn test_resolve_between_blocks() {
        let doc = sample();
        let rp = ResolvedPos::resolve(&doc, 5).unwrap();
        assert_eq!(rp.depth(), 0);
        assert_eq!(rp.index(0), 1);
        assert_eq!(rp.parent_offset, 5);
    }

    #[test]
    fn test_resolve_second_block() {
        let doc = sample();
        let rp = ResolvedPos::resolve(&doc, 8).unwrap();
        assert_eq!(rp.parent().kind(), "paragraph");
        assert_eq!(rp.start(1), 6);
        assert_eq!(rp.parent_offset, 2);
        assert!(!rp.same_parent(&ResolvedPos::resolve(&doc, 2).unwrap()));
        assert!(rp.same_parent(&ResolvedPos::resolve(&doc, 6).unwrap()));
    }

    #[test]
    fn test_out_of_range() {
        let doc = sample();
        assert!(ResolvedPos::resolve(&doc, 10).is_err());
    }
}
