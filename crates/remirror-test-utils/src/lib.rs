//! Shared test fixtures for the Remirror workspace.
//!
//! A dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`docs`]: JSON document builders
//! - [`recording`]: [`RecordingExtension`] for lifecycle and option assertions
//! - [`editor`]: [`TestEditor`] builder around a live manager

pub mod docs;
pub mod editor;
pub mod recording;

pub use editor::TestEditor;
pub use recording::{HookLog, RecordingExtension};
