//! Extension composition for Remirror.
//!
//! This crate turns a list of independently written extensions into one
//! editor:
//!
//! - ordering by priority and declared relations ([`resolver`])
//! - schema assembly with extra-attribute merging ([`schema`])
//! - a flat command and helper namespace with chains ([`commands`])
//! - merged key bindings, input rules and paste rules as plugins
//! - the [`RemirrorManager`] lifecycle, events and deferred mutations

pub mod commands;
pub mod content;
pub mod deferred;
pub mod error;
pub mod events;
pub mod extension;
pub mod keymap;
pub mod logging;
pub mod manager;
pub mod options;
pub mod priority;
pub mod registry;
pub mod resolver;
pub mod rules;
pub mod schema;
pub mod settings;
pub mod tags;

pub use commands::{
    Chain, ChainMode, ChainOutcome, CommandProps, CommandRegistry, CommandSpec, HelperSpec,
};
pub use content::{Content, ContentError};
pub use deferred::{DeferredAnchor, DeferredOutcome};
pub use error::{Error, Result};
pub use events::{ManagerEvent, SubscriptionId};
pub use extension::{
    Extension, ExtensionContext, ExtensionKind, MarkExtension, NodeExtension,
};
pub use keymap::{KeyBinding, KeyChord, KeymapPlugin};
pub use manager::{CommandHandle, Phase, RemirrorManager};
pub use options::{ExtensionDescriptor, HandlerId, Options};
pub use priority::Priority;
pub use registry::{ExtensionRegistry, ExtensionSlot};
pub use rules::{InputRule, PasteRule, RuleMatch};
pub use schema::{ExtraAttributes, ExtraAttributesTarget};
pub use settings::{ExtensionSettings, ExtraAttributesConfig, ManagerSettings, Platform};
pub use tags::Tag;
