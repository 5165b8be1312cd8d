//! Document engine for Remirror
//!
//! This crate provides the editing primitives the framework composes
//! extensions against:
//!
//! - [`Schema`] compiled from node and mark specs, with content expressions,
//!   attribute definitions and DOM parse/serialize hooks
//! - [`Node`] trees addressed by flat positions, [`Mark`]s on inline content
//! - [`Step`]s with position [`Mapping`]s and [`Transaction`]s with
//!   checkpoint/rollback
//! - [`EditorState`] hosting [`Plugin`]s, and the [`EditorView`] boundary
//! - JSON and HTML import/export

pub mod attrs;
pub mod content;
pub mod dom;
pub mod error;
pub mod html;
pub mod node;
pub mod plugin;
pub mod resolve;
pub mod schema;
pub mod selection;
pub mod state;
pub mod step;
pub mod transaction;
pub mod view;

pub use attrs::{
    AttrMatch, AttrToDomFn, AttributeDef, Attrs, DATA_CODEC, DomOutput, ParseAttrFn, ParseRule,
    STRING_CODEC, ToDomFn, parse_data_attr, parse_string_attr, render_data_attr, render_string_attr,
};
pub use dom::{DomElement, DomNode, parse_html, to_html};
pub use error::{Error, Result};
pub use html::{DomParser, DomSerializer};
pub use node::{Mark, Node, has_mark_type};
pub use plugin::{Decoration, Dispatch, KeyEvent, Plugin};
pub use resolve::ResolvedPos;
pub use schema::{MarkSpec, MarkType, NodeSpec, NodeType, Schema, SchemaSpec};
pub use selection::Selection;
pub use state::{APPENDED_TRANSACTION, AppliedTransaction, EditorState};
pub use step::{MapResult, Mapping, Step, StepMap};
pub use transaction::{Checkpoint, Transaction};
pub use view::{EditorView, HeadlessView, ViewLog, ViewRecord};
