//! An extension that records every hook the manager calls on it.

use std::cell::RefCell;
use std::rc::Rc;

use remirror_core::{Extension, ExtensionContext, ExtensionDescriptor, Priority};
use remirror_model::EditorView;
use serde_json::json;

/// Shared, ordered record of `"<extension>:<hook>"` entries
#[derive(Debug, Clone, Default)]
pub struct HookLog(Rc<RefCell<Vec<String>>>);

impl HookLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    /// Entries recorded for one hook, as extension names
    pub fn hook(&self, hook: &str) -> Vec<String> {
        let suffix = format!(":{hook}");
        self.0
            .borrow()
            .iter()
            .filter_map(|entry| entry.strip_suffix(&suffix).map(str::to_string))
            .collect()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    fn push(&self, entry: String) {
        self.0.borrow_mut().push(entry);
    }
}

/// A plain extension with a dynamic `label` option that writes each
/// lifecycle hook into a [`HookLog`].
///
/// # Example
///
/// ```rust
/// use remirror_core::Priority;
/// use remirror_test_utils::{HookLog, RecordingExtension};
///
/// let log = HookLog::new();
/// let ext = RecordingExtension::new("probe", &log).priority(Priority::HIGH);
/// # let _ = ext;
/// ```
pub struct RecordingExtension {
    name: String,
    priority: Priority,
    log: HookLog,
}

impl RecordingExtension {
    pub fn new(name: impl Into<String>, log: &HookLog) -> Self {
        Self {
            name: name.into(),
            priority: Priority::DEFAULT,
            log: log.clone(),
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn boxed(self) -> Box<dyn Extension> {
        Box::new(self)
    }

    fn record(&self, hook: &str) {
        self.log.push(format!("{}:{hook}", self.name));
    }
}

impl Extension for RecordingExtension {
    fn descriptor(&self) -> ExtensionDescriptor {
        ExtensionDescriptor::new(self.name.clone())
            .priority(self.priority)
            .option("label", json!(""))
    }

    fn on_create(&self, _cx: &ExtensionContext<'_>) {
        self.record("create");
    }

    fn on_view(&self, _cx: &ExtensionContext<'_>, _view: &dyn EditorView) {
        self.record("view");
    }

    fn on_destroy(&self, _cx: &ExtensionContext<'_>) {
        self.record("destroy");
    }

    fn on_options_changed(&self, _cx: &ExtensionContext<'_>, changed: &[String]) {
        self.record(&format!("options({})", changed.join(",")));
    }
}
