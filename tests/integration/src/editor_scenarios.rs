//! End-to-end editing flows through a fully assembled editor

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use remirror_core::DeferredOutcome;
use remirror_extensions::{
    BoldExtension, HeadingExtension, ItalicExtension, NodeIdExtension, PlaceholderExtension,
    UploadExtension, UploadedFile, upload_file,
};
use remirror_model::{Decoration, KeyEvent};
use remirror_test_utils::TestEditor;
use remirror_test_utils::docs::{doc, heading, marked, p, paragraph_doc, text};
use serde_json::{Value, json};
use tokio::sync::oneshot;

fn formatting_editor() -> TestEditor {
    TestEditor::builder()
        .with(HeadingExtension::new())
        .with(BoldExtension::new())
        .with(ItalicExtension::new())
        .build()
}

/// Character offsets inside the first paragraph that carry `mark`
fn marked_offsets(inline: &Value, mark: &str) -> Vec<usize> {
    let mut offsets = Vec::new();
    let mut offset = 0;
    for node in inline.as_array().into_iter().flatten() {
        let len = node["text"].as_str().map_or(0, |t| t.chars().count());
        let has_mark = node["marks"]
            .as_array()
            .is_some_and(|marks| marks.iter().any(|m| m["type"] == mark));
        if has_mark {
            offsets.extend(offset..offset + len);
        }
        offset += len;
    }
    offsets
}

fn text_and_range() -> impl Strategy<Value = (String, usize, usize)> {
    "[a-z]{1,6}( [a-z]{1,6}){0,3}".prop_flat_map(|content| {
        let len = content.chars().count();
        (Just(content), 1..=len).prop_flat_map(move |(content, from)| {
            (Just(content), Just(from), from + 1..=len + 1)
        })
    })
}

// ============================================================================
// Mark toggling
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_toggle_bold_covers_range_then_restores((content, from, to) in text_and_range()) {
        let editor = TestEditor::formatting(&content);
        editor.select(from, to);

        prop_assert!(editor.manager().run_command("toggleBold", Value::Null).unwrap());
        let expected: Vec<usize> = (from - 1..to - 1).collect();
        prop_assert_eq!(marked_offsets(&editor.inline(0), "bold"), expected);
        prop_assert_eq!(editor.text(), content.clone());

        prop_assert!(editor.manager().run_command("toggleBold", Value::Null).unwrap());
        prop_assert_eq!(editor.doc_json(), paragraph_doc(&content));
    }
}

// ============================================================================
// Typing
// ============================================================================

#[test]
fn test_typing_a_heading_then_a_formatted_paragraph() {
    let _ = remirror_core::logging::init();
    let editor = formatting_editor();
    let manager = editor.manager();

    for typed in ["#", "#", " ", "Title"] {
        manager.insert_text(typed).unwrap();
    }
    // Leave the heading through the gap cursor binding
    assert!(manager.handle_key(&KeyEvent::new("ArrowDown")).unwrap());
    for typed in ["Some ", "**bold*", "*"] {
        manager.insert_text(typed).unwrap();
    }

    editor.assert_doc(&doc([
        heading(2, [text("Title")]),
        p([text("Some "), marked("bold", &["bold"])]),
    ]));
}

#[test]
fn test_shortcut_then_typing_keeps_mark() {
    let editor = formatting_editor();
    let manager = editor.manager();

    manager.insert_text("plain ").unwrap();
    manager.insert_text("x").unwrap();
    editor.select(7, 8);
    assert!(manager.handle_key(&KeyEvent::new("b").ctrl()).unwrap());
    editor.cursor(8);
    manager.insert_text("yz").unwrap();

    assert_eq!(editor.inline(0), json!([text("plain "), marked("xyz", &["bold"])]));
}

// ============================================================================
// Behaviour extensions together
// ============================================================================

fn placeholder(text: &str) -> Decoration {
    Decoration::new(0, 2)
        .attr("class", "remirror-is-empty")
        .attr("data-placeholder", text)
}

#[test]
fn test_placeholder_and_node_ids_on_first_keystroke() {
    let editor = TestEditor::builder()
        .with(NodeIdExtension::new())
        .with(PlaceholderExtension::new())
        .settings_toml("[extensions.placeholder]\nplaceholder = \"Start typing\"")
        .build();

    assert_eq!(editor.view().decorations(), [placeholder("Start typing")]);
    assert_eq!(editor.block(0)["attrs"]["id"], Value::Null);

    editor.manager().insert_text("a").unwrap();

    assert!(editor.view().decorations().is_empty());
    let id = editor.block(0)["attrs"]["id"].clone();
    assert!(id.as_str().is_some_and(|id| !id.is_empty()));

    // Ids are stable across later edits
    editor.manager().insert_text("b").unwrap();
    assert_eq!(editor.block(0)["attrs"]["id"], id);
    assert_eq!(editor.text(), "ab");
}

// ============================================================================
// Deferred uploads
// ============================================================================

#[tokio::test]
async fn test_upload_survives_typing_elsewhere() {
    let editor = TestEditor::builder()
        .with(UploadExtension::new())
        .content(paragraph_doc("hello world"))
        .build();
    editor.cursor(12);
    let manager = editor.manager();
    let (tx, rx) = oneshot::channel::<Result<UploadedFile, String>>();

    let typing = async {
        tokio::task::yield_now().await;
        editor.cursor(1);
        manager.insert_text("Say ").unwrap();
        let _ = tx.send(Ok(UploadedFile {
            url: "https://cdn.test/wave.gif".to_string(),
        }));
    };
    let upload = upload_file(manager, "wave.gif", async {
        rx.await.unwrap_or_else(|_| Err("cancelled".to_string()))
    });
    let (outcome, ()) = tokio::join!(upload, typing);

    assert_eq!(outcome.unwrap(), DeferredOutcome::Applied { pos: 16 });
    assert_eq!(
        editor.inline(0),
        json!([
            text("Say hello world"),
            { "type": "file", "attrs": { "name": "wave.gif", "url": "https://cdn.test/wave.gif" } }
        ])
    );
}
