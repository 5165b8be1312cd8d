//! The extension capability interface.
//!
//! An extension is one value implementing [`Extension`]. Extensions that
//! contribute a node or mark type additionally implement [`NodeExtension`]
//! or [`MarkExtension`] and return themselves from `as_node`/`as_mark`.
//! Every contribution hook is optional and receives an
//! [`ExtensionContext`] carrying the extension's current options and, once
//! the schema exists, the schema itself.

use std::any::Any;
use std::rc::Rc;
use std::sync::Arc;

use remirror_model::{EditorView, MarkSpec, MarkType, NodeSpec, NodeType, Plugin, Schema};

use crate::commands::{CommandSpec, HelperSpec};
use crate::error::{Error, Result};
use crate::keymap::KeyBinding;
use crate::options::{ExtensionDescriptor, Options};
use crate::priority::Priority;
use crate::rules::{InputRule, PasteRule};
use crate::schema::ExtraAttributes;
use crate::tags::Tag;

/// Which schema namespace an extension contributes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionKind {
    Node,
    Mark,
    Plain,
}

/// What an extension sees when one of its hooks runs.
#[derive(Clone, Copy)]
pub struct ExtensionContext<'a> {
    pub name: &'a str,
    pub options: &'a Options,
    pub priority: Priority,
    pub tags: &'a [Tag],
    schema: Option<&'a Arc<Schema>>,
}

impl<'a> ExtensionContext<'a> {
    pub fn new(
        name: &'a str,
        options: &'a Options,
        priority: Priority,
        tags: &'a [Tag],
        schema: Option<&'a Arc<Schema>>,
    ) -> Self {
        Self {
            name,
            options,
            priority,
            tags,
            schema,
        }
    }

    /// The assembled schema. Not available while the schema is being built.
    pub fn schema(&self) -> Result<&'a Arc<Schema>> {
        self.schema.ok_or(Error::NotInitialized)
    }

    /// Resolve a node type by name
    pub fn node_type(&self, name: &str) -> Result<&'a NodeType> {
        Ok(self.schema()?.node_type(name)?)
    }

    /// Resolve a mark type by name
    pub fn mark_type(&self, name: &str) -> Result<&'a MarkType> {
        Ok(self.schema()?.mark_type(name)?)
    }

    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }
}

/// A self-contained contributor of schema, commands, keymaps and plugins.
///
/// Extensions know nothing about their siblings. The manager owns each
/// extension exclusively: registering one moves it into the manager.
pub trait Extension: Any {
    fn descriptor(&self) -> ExtensionDescriptor;

    fn as_node(&self) -> Option<&dyn NodeExtension> {
        None
    }

    fn as_mark(&self) -> Option<&dyn MarkExtension> {
        None
    }

    fn kind(&self) -> ExtensionKind {
        if self.as_node().is_some() {
            ExtensionKind::Node
        } else if self.as_mark().is_some() {
            ExtensionKind::Mark
        } else {
            ExtensionKind::Plain
        }
    }

    /// Attributes this extension adds to node and mark types it does not own
    fn extra_attributes(&self, _cx: &ExtensionContext<'_>) -> Vec<ExtraAttributes> {
        Vec::new()
    }

    fn commands(&self, _cx: &ExtensionContext<'_>) -> Vec<CommandSpec> {
        Vec::new()
    }

    fn helpers(&self, _cx: &ExtensionContext<'_>) -> Vec<HelperSpec> {
        Vec::new()
    }

    fn keymap(&self, _cx: &ExtensionContext<'_>) -> Vec<KeyBinding> {
        Vec::new()
    }

    fn input_rules(&self, _cx: &ExtensionContext<'_>) -> Vec<InputRule> {
        Vec::new()
    }

    fn paste_rules(&self, _cx: &ExtensionContext<'_>) -> Vec<PasteRule> {
        Vec::new()
    }

    /// The extension's own plugin, placed before its external plugins
    fn plugin(&self, _cx: &ExtensionContext<'_>) -> Option<Rc<dyn Plugin>> {
        None
    }

    /// Plugins built directly against the document engine
    fn external_plugins(&self, _cx: &ExtensionContext<'_>) -> Vec<Rc<dyn Plugin>> {
        Vec::new()
    }

    /// Called once the schema is bound, in ascending priority order
    fn on_create(&self, _cx: &ExtensionContext<'_>) {}

    /// Called when a view is attached, in ascending priority order
    fn on_view(&self, _cx: &ExtensionContext<'_>, _view: &dyn EditorView) {}

    /// Called on teardown, in descending priority order
    fn on_destroy(&self, _cx: &ExtensionContext<'_>) {}

    /// Called after dynamic options changed, with the changed keys
    fn on_options_changed(&self, _cx: &ExtensionContext<'_>, _changed: &[String]) {}
}

/// Extension contributing a node type
pub trait NodeExtension: Extension {
    /// Name of the node type; the extension's own name unless overridden
    fn node_name(&self, cx: &ExtensionContext<'_>) -> String {
        cx.name.to_string()
    }

    fn node_spec(&self, cx: &ExtensionContext<'_>) -> NodeSpec;
}

/// Extension contributing a mark type
pub trait MarkExtension: Extension {
    /// Name of the mark type; the extension's own name unless overridden
    fn mark_name(&self, cx: &ExtensionContext<'_>) -> String {
        cx.name.to_string()
    }

    fn mark_spec(&self, cx: &ExtensionContext<'_>) -> MarkSpec;
}
