//! Error types for remirror-core

use crate::manager::Phase;

/// Result type for remirror-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the extension manager.
///
/// Everything except the lifecycle variants at the end is a configuration
/// error: it is reported by the call that triggered it and indicates a
/// mistake in how extensions were put together.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Descriptor declares inconsistent metadata
    #[error("Invalid descriptor for extension '{extension}': {reason}")]
    InvalidDescriptor { extension: String, reason: String },

    /// Two extensions share a name
    #[error("Duplicate extension name '{name}' at positions {first} and {second}")]
    DuplicateExtension {
        name: String,
        first: usize,
        second: usize,
    },

    /// An extension names another extension that is not present
    #[error("Extension '{extension}' depends on missing extension '{dependency}'")]
    MissingDependency {
        extension: String,
        dependency: String,
    },

    /// Priorities order two extensions against a declared relation
    #[error("Extension '{extension}' must run {relation} '{other}' but its priority orders it otherwise")]
    OrderingViolation {
        extension: String,
        relation: &'static str,
        other: String,
    },

    /// Two extensions claim the same node or mark name
    #[error("Duplicate {kind} '{name}' contributed by '{first}' and '{second}'")]
    DuplicateSchemaEntry {
        kind: &'static str,
        name: String,
        first: String,
        second: String,
    },

    /// Two contributions define the same attribute differently
    #[error("Conflicting definitions of attribute '{attribute}' on '{target}' from '{first}' and '{second}'")]
    AttributeConflict {
        attribute: String,
        target: String,
        first: String,
        second: String,
    },

    /// Two extensions expose a command with the same name
    #[error("Duplicate command '{name}' from '{first}' and '{second}'")]
    DuplicateCommand {
        name: String,
        first: String,
        second: String,
    },

    /// Two extensions expose a helper with the same name
    #[error("Duplicate helper '{name}' from '{first}' and '{second}'")]
    DuplicateHelper {
        name: String,
        first: String,
        second: String,
    },

    /// A keymap chord could not be parsed
    #[error("Invalid key binding '{chord}' in '{extension}': {reason}")]
    InvalidKeyBinding {
        extension: String,
        chord: String,
        reason: String,
    },

    /// An input or paste rule pattern is not a valid regex
    #[error("Invalid rule pattern '{pattern}' in '{extension}': {reason}")]
    InvalidInputRule {
        extension: String,
        pattern: String,
        reason: String,
    },

    /// Option or handler key not declared by the extension's descriptor
    #[error("Extension '{extension}' has no option '{option}'")]
    UnknownOption { extension: String, option: String },

    /// Static options shape the schema and cannot change once it exists
    #[error("Cannot change static option '{option}' of '{extension}' after the schema was built")]
    StaticOptionWhileAttached { extension: String, option: String },

    /// Schema-contributing extensions cannot be added or removed live
    #[error("Extension '{extension}' contributes to the schema and cannot be changed after initialization")]
    SchemaReconfiguration { extension: String },

    #[error("Unknown extension: {0}")]
    UnknownExtension(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Unknown helper: {0}")]
    UnknownHelper(String),

    /// Lifecycle method called in the wrong phase
    #[error("Cannot move manager from {from} to {to}")]
    InvalidTransition { from: Phase, to: Phase },

    /// The manager has no editor state yet
    #[error("Manager is not initialized")]
    NotInitialized,

    #[error("Manager has been destroyed")]
    ManagerDestroyed,

    /// A manager operation was started from inside another one
    #[error("Re-entrant call into the manager")]
    Reentrant,

    // Transparent wrappers for underlying crate errors
    /// Document engine error
    #[error(transparent)]
    Model(#[from] remirror_model::Error),

    #[error("Failed to parse settings: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
