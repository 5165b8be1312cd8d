//! Immutable editor state.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::node::Node;
use crate::plugin::{Decoration, Plugin};
use crate::schema::Schema;
use crate::selection::Selection;
use crate::transaction::Transaction;

/// Meta key set on transactions appended by plugins. Its value is the number
/// of the transaction (in application order) that triggered the append.
pub const APPENDED_TRANSACTION: &str = "appendedTransaction";

/// Document, selection and the plugins active for them.
#[derive(Clone)]
pub struct EditorState {
    schema: Arc<Schema>,
    doc: Node,
    selection: Selection,
    plugins: Vec<Rc<dyn Plugin>>,
}

/// Outcome of [`EditorState::apply_transaction`].
pub struct AppliedTransaction {
    pub state: EditorState,
    /// The root transaction followed by any appended ones. Empty when a
    /// plugin filtered the root transaction out.
    pub transactions: Vec<Transaction>,
}

impl fmt::Debug for EditorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self.plugins.iter().map(|p| p.key()).collect();
        f.debug_struct("EditorState")
            .field("doc", &self.doc)
            .field("selection", &self.selection)
            .field("plugins", &keys)
            .finish()
    }
}

impl EditorState {
    /// Create a state. Without `doc`, an empty document of the schema's top
    /// node is used and the cursor is placed at its start.
    pub fn create(
        schema: Arc<Schema>,
        doc: Option<Node>,
        plugins: Vec<Rc<dyn Plugin>>,
    ) -> Result<Self> {
        let doc = match doc {
            Some(doc) => doc,
            None => schema.empty_doc()?,
        };
        let selection = Selection::at_start(&doc, &schema);
        Ok(Self {
            schema,
            doc,
            selection,
            plugins,
        })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn plugins(&self) -> &[Rc<dyn Plugin>] {
        &self.plugins
    }

    pub fn plugin(&self, key: &str) -> Option<&Rc<dyn Plugin>> {
        self.plugins.iter().find(|p| p.key() == key)
    }

    /// Start a transaction from this state
    pub fn tr(&self) -> Transaction {
        Transaction::new(Arc::clone(&self.schema), self.doc.clone(), self.selection)
    }

    /// Apply a transaction, ignoring plugin filters and appends
    pub fn apply(&self, tr: &Transaction) -> Result<EditorState> {
        self.apply_inner(tr)
    }

    /// Apply a transaction through the plugins: any plugin may filter it
    /// out, and each plugin may append follow-up transactions until none
    /// has anything left to add.
    pub fn apply_transaction(&self, root: Transaction) -> Result<AppliedTransaction> {
        if !self.filter_transaction(&root, None) {
            tracing::debug!("Transaction filtered out by a plugin");
            return Ok(AppliedTransaction {
                state: self.clone(),
                transactions: Vec::new(),
            });
        }

        let mut new_state = self.apply_inner(&root)?;
        let mut transactions = vec![root];
        // Per plugin: the state and transaction count it last saw.
        let mut seen: Option<Vec<(EditorState, usize)>> = None;

        loop {
            let mut have_new = false;
            for (index, plugin) in self.plugins.iter().enumerate() {
                let (old_state, count) = match &seen {
                    Some(seen) => (seen[index].0.clone(), seen[index].1),
                    None => (self.clone(), 0),
                };
                if count < transactions.len()
                    && let Some(mut tr) =
                        plugin.append_transaction(&transactions[count..], &old_state, &new_state)
                    && new_state.filter_transaction(&tr, Some(index))
                {
                    tr.set_meta(APPENDED_TRANSACTION, Value::from(count));
                    let seen = seen.get_or_insert_with(|| {
                        self.plugins.iter().map(|_| (self.clone(), 0)).collect()
                    });
                    new_state = new_state.apply_inner(&tr)?;
                    transactions.push(tr);
                    have_new = true;
                    seen[index] = (new_state.clone(), transactions.len());
                    continue;
                }
                if let Some(seen) = seen.as_mut() {
                    seen[index] = (new_state.clone(), transactions.len());
                }
            }
            if !have_new {
                return Ok(AppliedTransaction {
                    state: new_state,
                    transactions,
                });
            }
        }
    }

    /// The same document and selection with a different plugin list
    pub fn reconfigure(&self, plugins: Vec<Rc<dyn Plugin>>) -> EditorState {
        Self {
            plugins,
            ..self.clone()
        }
    }

    /// Decorations from every plugin, in plugin order
    pub fn decorations(&self) -> Vec<Decoration> {
        self.plugins
            .iter()
            .flat_map(|p| p.decorations(self))
            .collect()
    }

    fn filter_transaction(&self, tr: &Transaction, ignore: Option<usize>) -> bool {
        self.plugins
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != ignore)
            .all(|(_, p)| p.filter_transaction(tr, self))
    }

    fn apply_inner(&self, tr: &Transaction) -> Result<EditorState> {
        if tr.before() != &self.doc {
            return Err(Error::step("transaction was not created from this state"));
        }
        Ok(Self {
            schema: Arc::clone(&self.schema),
            doc: tr.doc().clone(),
            selection: tr.selection(),
            plugins: self.plugins.clone(),
        })
    }
}
