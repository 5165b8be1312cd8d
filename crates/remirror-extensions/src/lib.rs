//! Built-in extensions for the Remirror manager.
//!
//! Node types live in [`nodes`], marks in [`marks`] and schema-less
//! behaviour in [`behavior`]. [`core_preset`] bundles what every editor
//! needs; [`upload`] adds file nodes filled in by asynchronous uploads.

pub mod behavior;
pub mod error;
pub mod marks;
pub mod nodes;
pub mod preset;
pub mod upload;

pub use behavior::{GapCursorExtension, NodeIdExtension, PlaceholderExtension};
pub use error::{Error, Result};
pub use marks::{BoldExtension, ItalicExtension, LinkExtension};
pub use nodes::{DocExtension, HeadingExtension, ParagraphExtension, TextExtension};
pub use preset::core_preset;
pub use upload::{UploadExtension, UploadedFile, upload_file};
