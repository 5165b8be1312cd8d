//! [`TestEditor`]: a manager with a headless view attached, plus helpers for
//! moving the selection and reading the document back.

use remirror_core::{Extension, ManagerSettings, RemirrorManager};
use remirror_extensions::{BoldExtension, HeadingExtension, ItalicExtension, core_preset};
use remirror_model::{HeadlessView, Selection, ViewLog};
use serde_json::Value;

use crate::docs::paragraph_doc;

/// Builds a [`TestEditor`]. Starts from [`core_preset`] unless
/// [`bare`](Self::bare) is called.
pub struct TestEditorBuilder {
    extensions: Vec<Box<dyn Extension>>,
    settings: ManagerSettings,
    content: Option<Value>,
    attach_view: bool,
}

impl TestEditorBuilder {
    /// Drop the preset; only extensions added with [`with`](Self::with) are
    /// registered
    pub fn bare(mut self) -> Self {
        self.extensions.clear();
        self
    }

    pub fn with(mut self, extension: impl Extension) -> Self {
        self.extensions.push(Box::new(extension));
        self
    }

    pub fn with_boxed(mut self, extension: Box<dyn Extension>) -> Self {
        self.extensions.push(extension);
        self
    }

    pub fn settings(mut self, settings: ManagerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Settings parsed from TOML.
    ///
    /// # Panics
    /// Panics if the TOML does not describe valid settings.
    pub fn settings_toml(self, toml: &str) -> Self {
        let settings = ManagerSettings::from_toml(toml)
            .unwrap_or_else(|e| panic!("TestEditorBuilder::settings_toml: {e}"));
        self.settings(settings)
    }

    /// Initial document in the engine's JSON format
    pub fn content(mut self, content: Value) -> Self {
        self.content = Some(content);
        self
    }

    /// Stop at `SchemaBound` instead of attaching a headless view
    pub fn without_view(mut self) -> Self {
        self.attach_view = false;
        self
    }

    /// Create, initialize and (by default) attach a view.
    ///
    /// # Panics
    /// Panics if any lifecycle step fails.
    pub fn build(self) -> TestEditor {
        let manager = RemirrorManager::create(self.extensions, self.settings)
            .unwrap_or_else(|e| panic!("TestEditor: failed to create manager: {e}"));
        let initialized = match self.content {
            Some(content) => manager.initialize_with_content(content),
            None => manager.initialize(),
        };
        initialized.unwrap_or_else(|e| panic!("TestEditor: failed to initialize: {e}"));

        let view = HeadlessView::new();
        let log = view.log();
        if self.attach_view {
            manager
                .attach_view(Box::new(view))
                .unwrap_or_else(|e| panic!("TestEditor: failed to attach view: {e}"));
        }
        TestEditor { manager, view: log }
    }
}

/// A live manager for behaviour tests.
///
/// # Example
///
/// ```rust
/// use remirror_test_utils::TestEditor;
///
/// let editor = TestEditor::formatting("hello world");
/// editor.select(1, 6);
/// assert!(editor.manager().run_command("toggleBold", serde_json::Value::Null).unwrap());
/// assert_eq!(editor.text(), "hello world");
/// ```
pub struct TestEditor {
    manager: RemirrorManager,
    view: ViewLog,
}

impl TestEditor {
    pub fn builder() -> TestEditorBuilder {
        TestEditorBuilder {
            extensions: core_preset(),
            settings: ManagerSettings::default(),
            content: None,
            attach_view: true,
        }
    }

    /// The core preset with heading, bold and italic, holding one paragraph
    /// of `text`
    pub fn formatting(text: &str) -> Self {
        Self::builder()
            .with(HeadingExtension::new())
            .with(BoldExtension::new())
            .with(ItalicExtension::new())
            .content(paragraph_doc(text))
            .build()
    }

    pub fn manager(&self) -> &RemirrorManager {
        &self.manager
    }

    /// What the headless view has been shown
    pub fn view(&self) -> &ViewLog {
        &self.view
    }

    /// Set the selection through a dispatched transaction.
    ///
    /// # Panics
    /// Panics if the range is not valid in the current document.
    pub fn select(&self, from: usize, to: usize) {
        let mut tr = self.state_or_panic().tr();
        tr.set_selection(Selection::new(from, to))
            .unwrap_or_else(|e| panic!("TestEditor::select({from}, {to}): {e}"));
        self.manager
            .dispatch(tr)
            .unwrap_or_else(|e| panic!("TestEditor::select: dispatch failed: {e}"));
    }

    pub fn cursor(&self, pos: usize) {
        self.select(pos, pos);
    }

    pub fn doc_json(&self) -> Value {
        self.state_or_panic().doc().to_json()
    }

    /// JSON of the top-level block at `index`
    pub fn block(&self, index: usize) -> Value {
        self.doc_json()["content"][index].clone()
    }

    /// Inline content of the top-level block at `index`
    pub fn inline(&self, index: usize) -> Value {
        self.block(index)["content"].clone()
    }

    pub fn text(&self) -> String {
        self.state_or_panic().doc().text_content()
    }

    /// Assert the document equals `expected` (engine JSON).
    ///
    /// # Panics
    /// Panics with both documents printed when they differ.
    pub fn assert_doc(&self, expected: &Value) {
        let actual = self.doc_json();
        assert!(
            &actual == expected,
            "Document mismatch.\nExpected: {expected:#}\nActual: {actual:#}"
        );
    }

    fn state_or_panic(&self) -> remirror_model::EditorState {
        self.manager
            .state()
            .unwrap_or_else(|e| panic!("TestEditor: no editor state: {e}"))
    }
}
