//! Bold, italic and heading extensions driven through a manager

use pretty_assertions::assert_eq;
use remirror_core::{ManagerSettings, RemirrorManager};
use remirror_extensions::{
    BoldExtension, HeadingExtension, ItalicExtension, UploadExtension, core_preset,
};
use remirror_model::{KeyEvent, Selection};
use rstest::rstest;
use serde_json::{Value, json};

fn hello_world() -> Value {
    json!({
        "type": "doc",
        "content": [{ "type": "paragraph", "content": [{ "type": "text", "text": "hello world" }] }]
    })
}

fn manager_with(settings: ManagerSettings) -> RemirrorManager {
    let mut extensions = core_preset();
    extensions.push(Box::new(HeadingExtension::new()));
    extensions.push(Box::new(BoldExtension::new()));
    extensions.push(Box::new(ItalicExtension::new()));
    RemirrorManager::create(extensions, settings).unwrap()
}

fn manager() -> RemirrorManager {
    let manager = manager_with(ManagerSettings::default());
    manager.initialize_with_content(hello_world()).unwrap();
    manager
}

fn select(manager: &RemirrorManager, from: usize, to: usize) {
    let mut tr = manager.state().unwrap().tr();
    tr.set_selection(Selection::new(from, to)).unwrap();
    manager.dispatch(tr).unwrap();
}

fn first_block(manager: &RemirrorManager) -> Value {
    manager.state().unwrap().doc().to_json()["content"][0].clone()
}

#[test]
fn test_toggle_bold_adds_then_removes() {
    let manager = manager();
    select(&manager, 1, 6);

    assert!(manager.command("toggleBold").run(Value::Null).unwrap());
    assert_eq!(
        first_block(&manager)["content"],
        json!([
            { "type": "text", "text": "hello", "marks": [{ "type": "bold" }] },
            { "type": "text", "text": " world" }
        ])
    );
    assert_eq!(manager.command("toggleBold").active(Value::Null).unwrap(), Some(true));

    assert!(manager.command("toggleBold").run(Value::Null).unwrap());
    assert_eq!(
        first_block(&manager)["content"],
        json!([{ "type": "text", "text": "hello world" }])
    );
    assert_eq!(manager.command("toggleBold").active(Value::Null).unwrap(), Some(false));
}

#[test]
fn test_toggle_on_cursor_is_not_applicable() {
    let manager = manager();
    select(&manager, 3, 3);
    assert!(!manager.command("toggleItalic").enabled(Value::Null).unwrap());
    assert!(!manager.command("toggleItalic").run(Value::Null).unwrap());
}

#[test]
fn test_marks_are_ordered_by_schema_rank() {
    let manager = manager();
    select(&manager, 1, 6);
    manager.run_command("toggleItalic", Value::Null).unwrap();
    manager.run_command("toggleBold", Value::Null).unwrap();
    assert_eq!(
        first_block(&manager)["content"][0]["marks"],
        json!([{ "type": "bold" }, { "type": "italic" }])
    );
}

#[rstest]
#[case(KeyEvent::new("b").ctrl(), "bold")]
#[case(KeyEvent::new("i").ctrl(), "italic")]
fn test_shortcuts_toggle_marks(#[case] event: KeyEvent, #[case] mark: &str) {
    let manager = manager();
    select(&manager, 7, 12);
    assert!(manager.handle_key(&event).unwrap());
    assert_eq!(
        first_block(&manager)["content"][1],
        json!({ "type": "text", "text": "world", "marks": [{ "type": mark }] })
    );
}

#[rstest]
#[case(" **hi*", "*", "bold")]
#[case(" _hi", "_", "italic")]
fn test_input_rules_mark_delimited_text(#[case] typed: &str, #[case] closing: &str, #[case] mark: &str) {
    let manager = manager();
    select(&manager, 12, 12);
    manager.insert_text(typed).unwrap();
    manager.insert_text(closing).unwrap();
    assert_eq!(
        first_block(&manager)["content"],
        json!([
            { "type": "text", "text": "hello world " },
            { "type": "text", "text": "hi", "marks": [{ "type": mark }] }
        ])
    );
}

#[test]
fn test_toggle_heading_switches_with_paragraph() {
    let manager = manager();

    assert!(manager.run_command("toggleHeading", json!({ "level": 2 })).unwrap());
    assert_eq!(first_block(&manager)["type"], "heading");
    assert_eq!(first_block(&manager)["attrs"], json!({ "level": 2 }));
    assert_eq!(manager.command("toggleHeading").active(json!({ "level": 2 })).unwrap(), Some(true));
    assert_eq!(manager.command("toggleHeading").active(json!({ "level": 3 })).unwrap(), Some(false));

    // Same level again goes back to a paragraph
    assert!(manager.run_command("toggleHeading", json!({ "level": 2 })).unwrap());
    assert_eq!(first_block(&manager)["type"], "paragraph");
    assert_eq!(manager.command("convertParagraph").active(Value::Null).unwrap(), Some(true));
}

#[test]
fn test_convert_paragraph_from_heading() {
    let manager = manager();
    manager.run_command("toggleHeading", json!({ "level": 4 })).unwrap();
    assert!(manager.run_command("convertParagraph", Value::Null).unwrap());
    assert_eq!(first_block(&manager)["type"], "paragraph");
    // Already a paragraph
    assert!(!manager.run_command("convertParagraph", Value::Null).unwrap());
}

#[test]
fn test_heading_input_rule_converts_empty_paragraph() {
    let manager = manager_with(ManagerSettings::default());
    manager.initialize().unwrap();

    manager.insert_text("#").unwrap();
    manager.insert_text("#").unwrap();
    manager.insert_text(" ").unwrap();
    manager.insert_text("Title").unwrap();

    assert_eq!(
        first_block(&manager),
        json!({
            "type": "heading",
            "attrs": { "level": 2 },
            "content": [{ "type": "text", "text": "Title" }]
        })
    );
}

#[test]
fn test_configured_levels_limit_headings() {
    let settings = ManagerSettings::from_toml("[extensions.heading]\nlevels = [2, 3]").unwrap();
    let manager = manager_with(settings);
    manager.initialize().unwrap();

    // Level 1 does not exist, so "# " stays text
    manager.insert_text("#").unwrap();
    manager.insert_text(" ").unwrap();
    assert_eq!(first_block(&manager)["type"], "paragraph");
    assert!(!manager.handle_key(&KeyEvent::new("1").ctrl().shift()).unwrap());
    assert!(!manager.run_command("toggleHeading", json!({ "level": 1 })).unwrap());

    // Without a level the first configured one is used
    assert!(manager.run_command("toggleHeading", Value::Null).unwrap());
    assert_eq!(first_block(&manager)["attrs"], json!({ "level": 2 }));
    assert!(manager.handle_key(&KeyEvent::new("3").ctrl().shift()).unwrap());
    assert_eq!(first_block(&manager)["attrs"], json!({ "level": 3 }));
}

fn file_node() -> Value {
    json!({ "type": "file", "attrs": { "name": "cat.png", "url": "https://cdn.test/cat.png" } })
}

/// A paragraph holding `inline`, with the upload extension providing `file`
fn manager_with_inline(inline: Value) -> RemirrorManager {
    let mut extensions = core_preset();
    extensions.push(Box::new(BoldExtension::new()));
    extensions.push(Box::new(UploadExtension::new()));
    let manager = RemirrorManager::create(extensions, ManagerSettings::default()).unwrap();
    manager
        .initialize_with_content(json!({
            "type": "doc",
            "content": [{ "type": "paragraph", "content": inline }]
        }))
        .unwrap();
    manager
}

#[test]
fn test_input_rule_after_inline_leaf_keeps_leaf() {
    let manager = manager_with_inline(json!([
        { "type": "text", "text": "x" },
        file_node(),
        { "type": "text", "text": "**ab*" }
    ]));
    select(&manager, 8, 8);
    manager.insert_text("*").unwrap();

    assert_eq!(
        first_block(&manager)["content"],
        json!([
            { "type": "text", "text": "x" },
            file_node(),
            { "type": "text", "text": "ab", "marks": [{ "type": "bold" }] }
        ])
    );
}

#[test]
fn test_input_rule_never_spans_inline_leaf() {
    let manager = manager_with_inline(json!([
        { "type": "text", "text": "**a" },
        file_node(),
        { "type": "text", "text": "b*" }
    ]));
    select(&manager, 7, 7);
    manager.insert_text("*").unwrap();

    assert_eq!(
        first_block(&manager)["content"],
        json!([
            { "type": "text", "text": "**a" },
            file_node(),
            { "type": "text", "text": "b**" }
        ])
    );
}
