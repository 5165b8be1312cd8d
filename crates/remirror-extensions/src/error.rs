//! Error types for remirror-extensions

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Manager error: {0}")]
    Core(#[from] remirror_core::Error),

    #[error("Document error: {0}")]
    Model(#[from] remirror_model::Error),

    /// The upload future reported a failure
    #[error("Upload of '{name}' failed: {reason}")]
    UploadFailed { name: String, reason: String },

    /// The manager has no extension that the operation needs
    #[error("Extension '{0}' is not registered with the manager")]
    MissingExtension(&'static str),
}
