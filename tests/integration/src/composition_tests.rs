//! Composition properties: ordering, schema merging, collisions and
//! lifecycle hook order.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use remirror_core::{
    Error, Extension, ExtensionContext, ExtensionDescriptor, ManagerSettings, NodeExtension,
    Phase, Priority, RemirrorManager, Tag,
};
use remirror_extensions::{
    BoldExtension, HeadingExtension, ItalicExtension, LinkExtension, NodeIdExtension,
    UploadExtension, core_preset,
};
use remirror_model::NodeSpec;
use remirror_test_utils::{HookLog, RecordingExtension, TestEditor};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn recorders(priorities: &[i32], log: &HookLog) -> Vec<Box<dyn Extension>> {
    priorities
        .iter()
        .enumerate()
        .map(|(i, p)| RecordingExtension::new(format!("ext{i}"), log).priority(Priority(*p)).boxed())
        .collect()
}

/// A second extension claiming the `paragraph` node type
struct LegacyParagraph;

impl Extension for LegacyParagraph {
    fn descriptor(&self) -> ExtensionDescriptor {
        ExtensionDescriptor::new("legacyParagraph")
            .tag(Tag::BlockNode)
            .tag(Tag::TextBlock)
    }

    fn as_node(&self) -> Option<&dyn NodeExtension> {
        Some(self)
    }
}

impl NodeExtension for LegacyParagraph {
    fn node_name(&self, _cx: &ExtensionContext<'_>) -> String {
        "paragraph".to_string()
    }

    fn node_spec(&self, _cx: &ExtensionContext<'_>) -> NodeSpec {
        NodeSpec::new().content("inline*")
    }
}

// =============================================================================
// Determinism
// =============================================================================

proptest! {
    #[test]
    fn test_resolved_order_is_deterministic(priorities in prop::collection::vec(0i32..4, 1..10)) {
        let log = HookLog::new();
        let first = RemirrorManager::create(recorders(&priorities, &log), ManagerSettings::default()).unwrap();
        let second = RemirrorManager::create(recorders(&priorities, &log), ManagerSettings::default()).unwrap();
        prop_assert_eq!(first.extension_names(), second.extension_names());

        // Ascending priority, ties in declaration order
        let mut expected: Vec<usize> = (0..priorities.len()).collect();
        expected.sort_by_key(|i| priorities[*i]);
        let expected: Vec<String> = expected.iter().map(|i| format!("ext{i}")).collect();
        prop_assert_eq!(first.extension_names(), expected);
    }
}

#[test]
fn test_reinserted_extension_goes_last_among_equals() {
    let log = HookLog::new();
    let editor = TestEditor::builder()
        .with(RecordingExtension::new("a", &log))
        .with(RecordingExtension::new("b", &log))
        .with(RecordingExtension::new("c", &log))
        .build();
    let manager = editor.manager();
    assert_eq!(
        manager.extension_names(),
        ["paragraph", "gapCursor", "doc", "text", "a", "b", "c"]
    );

    let a = manager.remove_extension("a").unwrap();
    manager.add_extension(a).unwrap();
    assert_eq!(
        manager.extension_names(),
        ["paragraph", "gapCursor", "doc", "text", "b", "c", "a"]
    );
    assert_eq!(log.entries()[log.entries().len() - 3..], ["a:destroy", "a:create", "a:view"]);
}

// =============================================================================
// Schema merging
// =============================================================================

#[test]
fn test_schema_is_union_of_contributions() {
    let editor = TestEditor::builder()
        .with(HeadingExtension::new())
        .with(BoldExtension::new())
        .with(ItalicExtension::new())
        .with(LinkExtension::new())
        .with(UploadExtension::new())
        .with(NodeIdExtension::new())
        .build();
    let schema = editor.manager().schema().unwrap();

    let mut nodes: Vec<&str> = schema.nodes().iter().map(|n| n.name()).collect();
    nodes.sort_unstable();
    assert_eq!(nodes, ["doc", "file", "heading", "paragraph", "text"]);
    let marks: Vec<&str> = schema.marks().iter().map(|m| m.name()).collect();
    assert_eq!(marks, ["bold", "italic", "link"]);

    let attrs = |node: &str| -> Vec<String> {
        schema.node_type(node).unwrap().spec().attrs.keys().cloned().collect()
    };
    // Own attributes survive next to injected ones
    assert_eq!(attrs("heading"), ["id", "level"]);
    assert_eq!(attrs("paragraph"), ["id"]);
    assert_eq!(attrs("file"), ["name", "url"]);
    assert!(attrs("doc").is_empty());
    let link: Vec<&String> = schema.mark_type("link").unwrap().spec().attrs.keys().collect();
    assert_eq!(link, ["href", "target"]);
}

#[test]
fn test_node_name_collision_is_fatal_before_create() {
    let log = HookLog::new();
    let mut extensions = core_preset();
    extensions.push(Box::new(LegacyParagraph));
    extensions.push(RecordingExtension::new("probe", &log).boxed());
    let manager = RemirrorManager::create(extensions, ManagerSettings::default()).unwrap();

    let err = manager.initialize().unwrap_err();
    assert!(matches!(
        err,
        Error::DuplicateSchemaEntry { kind: "node", ref name, .. } if name == "paragraph"
    ));
    assert!(log.entries().is_empty());
    assert_eq!(manager.phase(), Phase::Destroyed);
    assert!(matches!(manager.run_command("toggleBold", serde_json::Value::Null), Err(Error::ManagerDestroyed)));
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_hooks_run_by_priority_and_destroy_in_reverse() {
    let log = HookLog::new();
    // Declared B first; A has the lower value and runs first
    let editor = TestEditor::builder()
        .with(RecordingExtension::new("B", &log).priority(Priority(2)))
        .with(RecordingExtension::new("A", &log).priority(Priority(1)))
        .build();
    editor.manager().destroy().unwrap();

    assert_eq!(log.hook("create"), ["A", "B"]);
    assert_eq!(log.hook("view"), ["A", "B"]);
    assert_eq!(log.hook("destroy"), ["B", "A"]);
    assert!(editor.view().destroyed());
}

#[test]
fn test_option_change_reaches_extension() {
    let log = HookLog::new();
    let editor = TestEditor::builder().with(RecordingExtension::new("probe", &log)).build();
    log.clear();

    let changed = editor.manager().set_options("probe", serde_json::json!({ "label": "x" })).unwrap();
    assert_eq!(changed, ["label"]);
    assert_eq!(log.entries(), ["probe:options(label)"]);
}
