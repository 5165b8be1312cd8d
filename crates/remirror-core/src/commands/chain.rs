//! Command chains: several commands sharing one transaction.

use remirror_model::{EditorState, Transaction};
use serde_json::Value;

use super::{CommandProps, CommandSpec};
use crate::error::Result;
use crate::manager::RemirrorManager;

/// What a chain does when one of its commands is not applicable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainMode {
    /// Abort the whole chain without dispatching
    Strict,
    /// Skip the command and continue with the transaction as it stood before it
    NonStrict,
}

/// Result of running a chain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainOutcome {
    /// Commands whose changes made it into the transaction, in call order
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
    /// A strict chain stopped at an inapplicable command
    pub aborted: bool,
    /// The shared transaction was dispatched (exactly once)
    pub dispatched: bool,
}

impl ChainOutcome {
    pub fn success(&self) -> bool {
        !self.aborted && !self.applied.is_empty()
    }
}

/// Queue of commands run against one shared transaction.
///
/// Calls only queue; nothing touches the editor until [`Chain::run`].
#[must_use = "a chain does nothing until run"]
pub struct Chain<'m> {
    manager: &'m RemirrorManager,
    queue: Vec<(String, Value)>,
    mode: ChainMode,
}

impl<'m> Chain<'m> {
    pub(crate) fn new(manager: &'m RemirrorManager, mode: ChainMode) -> Self {
        Self {
            manager,
            queue: Vec::new(),
            mode,
        }
    }

    /// Queue a command with its arguments
    pub fn cmd(mut self, name: impl Into<String>, args: Value) -> Self {
        self.queue.push((name.into(), args));
        self
    }

    pub fn mode(mut self, mode: ChainMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Apply every queued command to one transaction in call order and
    /// dispatch it once if anything applied.
    ///
    /// # Errors
    ///
    /// Fails before running anything when a queued name is unknown, and on
    /// lifecycle violations (destroyed manager, re-entrant call).
    pub fn run(self) -> Result<ChainOutcome> {
        let _busy = self.manager.enter()?;
        let state = self.manager.current_state()?;
        let commands = self.resolve()?;
        let mut tr = state.tr();
        let mut outcome = apply_queue(&state, &mut tr, &commands, self.mode, true);
        if outcome.success() {
            self.manager.dispatch_entered(tr)?;
            outcome.dispatched = true;
        }
        tracing::debug!(
            applied = outcome.applied.len(),
            skipped = outcome.skipped.len(),
            aborted = outcome.aborted,
            "Ran command chain"
        );
        Ok(outcome)
    }

    /// Dry run: whether [`Chain::run`] would dispatch
    pub fn enabled(&self) -> Result<bool> {
        let _busy = self.manager.enter()?;
        let state = self.manager.current_state()?;
        let commands = self.resolve()?;
        let mut tr = state.tr();
        Ok(apply_queue(&state, &mut tr, &commands, self.mode, false).success())
    }

    fn resolve(&self) -> Result<Vec<(String, CommandSpec, Value)>> {
        self.queue
            .iter()
            .map(|(name, args)| Ok((name.clone(), self.manager.command_spec(name)?, args.clone())))
            .collect()
    }
}

/// Run queued commands against `tr`, rolling back each one that is not
/// applicable. A strict queue rolls back everything on the first failure.
pub(crate) fn apply_queue(
    state: &EditorState,
    tr: &mut Transaction,
    commands: &[(String, CommandSpec, Value)],
    mode: ChainMode,
    dispatch: bool,
) -> ChainOutcome {
    let start = tr.checkpoint();
    let mut outcome = ChainOutcome::default();

    for (name, command, args) in commands {
        let checkpoint = tr.checkpoint();
        let applied = {
            let mut props = CommandProps {
                state,
                tr: &mut *tr,
                dispatch,
            };
            (command.run)(&mut props, args)
        };
        if applied {
            outcome.applied.push(name.clone());
            continue;
        }
        tr.rollback(checkpoint);
        outcome.skipped.push(name.clone());
        if mode == ChainMode::Strict {
            tr.rollback(start);
            outcome.aborted = true;
            outcome.applied.clear();
            break;
        }
    }
    outcome
}
