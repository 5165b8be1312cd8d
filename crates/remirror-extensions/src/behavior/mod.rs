//! Extensions that change editing behaviour without adding node or mark types.

mod gap_cursor;
mod node_id;
mod placeholder;

pub use gap_cursor::GapCursorExtension;
pub use node_id::{NODE_ID_PLUGIN_KEY, NodeIdExtension};
pub use placeholder::{PLACEHOLDER_PLUGIN_KEY, PlaceholderExtension};
