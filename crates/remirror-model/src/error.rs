//! Error types for remirror-model

/// Result type for remirror-model operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building schemas, documents and transactions
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Schema defines {kind} type '{name}' more than once")]
    DuplicateType { kind: &'static str, name: String },

    #[error("Schema is missing required node type '{0}'")]
    MissingNodeType(String),

    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Unknown mark type: {0}")]
    UnknownMarkType(String),

    #[error("Content expression for '{node}' references unknown node or group '{name}'")]
    UnknownContent { node: String, name: String },

    #[error("Invalid content expression for '{node}': {message}")]
    InvalidContentExpression { node: String, message: String },

    #[error("Invalid content for node '{node}': {message}")]
    InvalidContent { node: String, message: String },

    #[error("No value supplied for required attribute '{attribute}' of '{owner}'")]
    MissingAttribute { owner: String, attribute: String },

    #[error("Mark '{mark}' is not allowed in '{node}'")]
    MarkNotAllowed { mark: String, node: String },

    #[error("Position {pos} is out of range (document size {size})")]
    PositionOutOfRange { pos: usize, size: usize },

    #[error("Step could not be applied: {0}")]
    StepFailed(String),

    #[error("Node type '{0}' has no DOM serialization")]
    NotSerializable(String),

    #[error("Failed to parse HTML: {0}")]
    HtmlParse(String),

    #[error("Invalid JSON document: {0}")]
    InvalidJson(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn step(message: impl Into<String>) -> Self {
        Self::StepFailed(message.into())
    }

    pub fn content(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidContent {
            node: node.into(),
            message: message.into(),
        }
    }
}
