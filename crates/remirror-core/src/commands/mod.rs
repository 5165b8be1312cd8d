//! Commands and helpers aggregated from every extension.
//!
//! A command receives [`CommandProps`] holding the current state and a
//! transaction it may add steps to, and reports whether it applied. A
//! command returning `false` has its transaction changes discarded, so
//! inapplicable commands never dispatch. Helpers are read-only queries.

mod chain;
mod toggle;

use std::collections::BTreeMap;
use std::rc::Rc;

use remirror_model::{EditorState, Transaction};
use serde_json::Value;

use crate::error::{Error, Result};

pub use chain::{Chain, ChainMode, ChainOutcome};
pub use toggle::{is_mark_active, is_node_active, set_block_type, toggle_block_type, toggle_mark};

/// What a command runs against.
pub struct CommandProps<'a> {
    pub state: &'a EditorState,
    pub tr: &'a mut Transaction,
    /// `false` during a dry run: the transaction will be thrown away, so
    /// side effects outside it must be skipped
    pub dispatch: bool,
}

/// Raw command body. Receives the invocation arguments.
pub type CommandFn = Rc<dyn Fn(&mut CommandProps<'_>, &Value) -> bool>;

/// Activation query of a toggle-style command
pub type ActiveFn = Rc<dyn Fn(&EditorState, &Value) -> bool>;

/// Read-only query over the editor state
pub type HelperFn = Rc<dyn Fn(&EditorState, &Value) -> Value>;

/// A named command contributed by an extension.
#[derive(Clone)]
pub struct CommandSpec {
    pub name: String,
    pub run: CommandFn,
    pub active: Option<ActiveFn>,
}

impl CommandSpec {
    pub fn new(
        name: impl Into<String>,
        run: impl Fn(&mut CommandProps<'_>, &Value) -> bool + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            run: Rc::new(run),
            active: None,
        }
    }

    /// Mark the command as toggle-style with an activation query
    pub fn with_active(mut self, active: impl Fn(&EditorState, &Value) -> bool + 'static) -> Self {
        self.active = Some(Rc::new(active));
        self
    }
}

/// A named helper contributed by an extension.
#[derive(Clone)]
pub struct HelperSpec {
    pub name: String,
    pub run: HelperFn,
}

impl HelperSpec {
    pub fn new(name: impl Into<String>, run: impl Fn(&EditorState, &Value) -> Value + 'static) -> Self {
        Self {
            name: name.into(),
            run: Rc::new(run),
        }
    }
}

#[derive(Clone)]
pub(crate) struct Registered<T> {
    pub(crate) owner: String,
    pub(crate) item: T,
}

/// Flat command and helper namespaces. Names are unique across extensions.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Registered<CommandSpec>>,
    helpers: BTreeMap<String, Registered<HelperSpec>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the commands of `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateCommand`] when a name is already taken.
    pub fn add_commands(&mut self, owner: &str, commands: Vec<CommandSpec>) -> Result<()> {
        for command in commands {
            if let Some(existing) = self.commands.get(&command.name) {
                return Err(Error::DuplicateCommand {
                    name: command.name,
                    first: existing.owner.clone(),
                    second: owner.to_string(),
                });
            }
            self.commands.insert(
                command.name.clone(),
                Registered {
                    owner: owner.to_string(),
                    item: command,
                },
            );
        }
        Ok(())
    }

    /// Add the helpers of `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateHelper`] when a name is already taken.
    pub fn add_helpers(&mut self, owner: &str, helpers: Vec<HelperSpec>) -> Result<()> {
        for helper in helpers {
            if let Some(existing) = self.helpers.get(&helper.name) {
                return Err(Error::DuplicateHelper {
                    name: helper.name,
                    first: existing.owner.clone(),
                    second: owner.to_string(),
                });
            }
            self.helpers.insert(
                helper.name.clone(),
                Registered {
                    owner: owner.to_string(),
                    item: helper,
                },
            );
        }
        Ok(())
    }

    pub fn command(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.get(name).map(|r| &r.item)
    }

    pub fn helper(&self, name: &str) -> Option<&HelperSpec> {
        self.helpers.get(name).map(|r| &r.item)
    }

    /// Extension that contributed a command
    pub fn command_owner(&self, name: &str) -> Option<&str> {
        self.commands.get(name).map(|r| r.owner.as_str())
    }

    /// Command names, sorted
    pub fn command_names(&self) -> Vec<String> {
        self.commands.keys().cloned().collect()
    }

    /// Helper names, sorted
    pub fn helper_names(&self) -> Vec<String> {
        self.helpers.keys().cloned().collect()
    }
}

/// Run `command` against a fresh transaction from `state`. Returns the
/// transaction only when the command applied.
pub fn run_on_state(command: &CommandSpec, state: &EditorState, args: &Value, dispatch: bool) -> Option<Transaction> {
    let mut tr = state.tr();
    let applied = {
        let mut props = CommandProps {
            state,
            tr: &mut tr,
            dispatch,
        };
        (command.run)(&mut props, args)
    };
    applied.then_some(tr)
}
