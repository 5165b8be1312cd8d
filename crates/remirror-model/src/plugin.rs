//! Plugins hosted by an [`EditorState`].

use std::collections::BTreeMap;

use crate::state::EditorState;
use crate::transaction::Transaction;

/// Receives transactions produced by a plugin's event handlers.
pub type Dispatch<'a> = &'a mut dyn FnMut(Transaction);

/// A key press as delivered by the view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyEvent {
    /// Key name, e.g. `"b"`, `"Enter"`, `"ArrowDown"`.
    pub key: String,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }
}

/// A visual annotation over `from..to` that does not change the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
    pub from: usize,
    pub to: usize,
    pub attrs: BTreeMap<String, String>,
}

impl Decoration {
    pub fn new(from: usize, to: usize) -> Self {
        Self {
            from,
            to,
            attrs: BTreeMap::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }
}

/// A unit of behaviour registered with the editor state.
///
/// Every hook has a no-op default. Event handlers return `true` when they
/// handled the event, which stops the remaining plugins from seeing it.
pub trait Plugin {
    /// Unique key identifying this plugin in a state
    fn key(&self) -> &str;

    /// Veto a transaction before it is applied
    fn filter_transaction(&self, _tr: &Transaction, _state: &EditorState) -> bool {
        true
    }

    /// Follow up on applied transactions with one of its own
    fn append_transaction(
        &self,
        _transactions: &[Transaction],
        _old_state: &EditorState,
        _new_state: &EditorState,
    ) -> Option<Transaction> {
        None
    }

    fn handle_key_down(
        &self,
        _state: &EditorState,
        _event: &KeyEvent,
        _dispatch: Dispatch<'_>,
    ) -> bool {
        false
    }

    /// Text typed over `from..to`
    fn handle_text_input(
        &self,
        _state: &EditorState,
        _from: usize,
        _to: usize,
        _text: &str,
        _dispatch: Dispatch<'_>,
    ) -> bool {
        false
    }

    /// Plain text pasted over the selection
    fn handle_paste(&self, _state: &EditorState, _text: &str, _dispatch: Dispatch<'_>) -> bool {
        false
    }

    fn decorations(&self, _state: &EditorState) -> Vec<Decoration> {
        Vec::new()
    }
}
