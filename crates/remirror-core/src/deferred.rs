//! Positions held across asynchronous work.
//!
//! A deferred mutation takes an anchor when it starts. Every transaction the
//! manager dispatches afterwards maps the anchor forward, so when the work
//! completes the mutation lands where the anchor ended up. If the content
//! around the anchor was deleted in the meantime the mutation is dropped.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use remirror_model::Mapping;

/// What happened to a deferred mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredOutcome {
    /// Dispatched at the mapped position
    Applied { pos: usize },
    /// The anchor's content was deleted; nothing was dispatched
    Dropped,
    /// The mutation declined to apply at the mapped position
    Rejected,
}

/// Live anchors keyed by id. `None` marks an anchor whose content was deleted.
#[derive(Debug, Default)]
pub(crate) struct AnchorTable {
    next: u64,
    anchors: BTreeMap<u64, Option<usize>>,
}

impl AnchorTable {
    pub(crate) fn insert(table: &Rc<RefCell<AnchorTable>>, pos: usize) -> DeferredAnchor {
        let mut inner = table.borrow_mut();
        let id = inner.next;
        inner.next += 1;
        inner.anchors.insert(id, Some(pos));
        DeferredAnchor {
            id,
            table: Rc::downgrade(table),
        }
    }

    pub(crate) fn map(&mut self, mapping: &Mapping) {
        for anchor in self.anchors.values_mut() {
            if let Some(pos) = *anchor {
                let mapped = mapping.map_result(pos, 1);
                *anchor = (!mapped.deleted).then_some(mapped.pos);
            }
        }
    }

    pub(crate) fn position(&self, id: u64) -> Option<usize> {
        self.anchors.get(&id).copied().flatten()
    }

    /// Anchors that have not been resolved or cancelled
    pub(crate) fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Drop every anchor; used when the manager is destroyed
    pub(crate) fn clear(&mut self) {
        self.anchors.clear();
    }

    fn cancel(&mut self, id: u64) {
        self.anchors.remove(&id);
    }
}

/// A position tracked through later transactions. Dropping it cancels the
/// deferred mutation.
#[derive(Debug)]
pub struct DeferredAnchor {
    id: u64,
    table: Weak<RefCell<AnchorTable>>,
}

impl DeferredAnchor {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current position, or `None` once the anchor's content was deleted
    pub fn position(&self) -> Option<usize> {
        self.table
            .upgrade()
            .and_then(|table| table.borrow().position(self.id))
    }

    pub(crate) fn belongs_to(&self, table: &Rc<RefCell<AnchorTable>>) -> bool {
        std::ptr::eq(self.table.as_ptr(), Rc::as_ptr(table))
    }
}

impl Drop for DeferredAnchor {
    fn drop(&mut self) {
        if let Some(table) = self.table.upgrade() {
            table.borrow_mut().cancel(self.id);
        }
    }
}
