//! The view boundary.
//!
//! Rendering lives outside this crate. A view only has to accept new states
//! and release its resources; [`HeadlessView`] records what it was given so
//! callers without a rendering surface can still observe it.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use crate::plugin::Decoration;
use crate::state::EditorState;

pub trait EditorView {
    /// Present a new state
    fn update_state(&mut self, state: &EditorState);

    /// Release the rendering surface. Called once.
    fn destroy(&mut self);

    fn editable(&self) -> bool {
        true
    }
}

/// What a [`HeadlessView`] has observed.
#[derive(Debug, Default, Clone)]
pub struct ViewRecord {
    pub updates: usize,
    /// JSON of the last presented document
    pub doc: Option<Value>,
    pub decorations: Vec<Decoration>,
    pub destroyed: bool,
}

/// Shared handle onto a [`HeadlessView`]'s record; stays readable after the
/// view itself has been handed over.
#[derive(Debug, Default, Clone)]
pub struct ViewLog(Rc<RefCell<ViewRecord>>);

impl ViewLog {
    pub fn snapshot(&self) -> ViewRecord {
        self.0.borrow().clone()
    }

    pub fn updates(&self) -> usize {
        self.0.borrow().updates
    }

    pub fn destroyed(&self) -> bool {
        self.0.borrow().destroyed
    }

    pub fn decorations(&self) -> Vec<Decoration> {
        self.0.borrow().decorations.clone()
    }
}

/// A view without a rendering surface.
#[derive(Debug)]
pub struct HeadlessView {
    log: ViewLog,
    editable: bool,
}

impl HeadlessView {
    pub fn new() -> Self {
        Self {
            log: ViewLog::default(),
            editable: true,
        }
    }

    pub fn read_only() -> Self {
        Self {
            editable: false,
            ..Self::new()
        }
    }

    pub fn log(&self) -> ViewLog {
        self.log.clone()
    }
}

impl Default for HeadlessView {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorView for HeadlessView {
    fn update_state(&mut self, state: &EditorState) {
        let mut record = self.log.0.borrow_mut();
        record.updates += 1;
        record.doc = Some(state.doc().to_json());
        record.decorations = state.decorations();
    }

    fn destroy(&mut self) {
        self.log.0.borrow_mut().destroyed = true;
    }

    fn editable(&self) -> bool {
        self.editable
    }
}
