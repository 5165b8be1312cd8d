//! Command wrapper and chain behaviour against the built-in extensions

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use remirror_core::{ChainMode, ChainOutcome, ManagerEvent, RemirrorManager};
use remirror_test_utils::TestEditor;
use remirror_test_utils::docs::{doc, marked, p, text};
use serde_json::{Value, json};

/// Count dispatched transactions
fn count_dispatches(manager: &RemirrorManager) -> Rc<RefCell<usize>> {
    let count = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&count);
    manager.subscribe(move |event| {
        if matches!(event, ManagerEvent::TransactionApplied { .. }) {
            *sink.borrow_mut() += 1;
        }
    });
    count
}

#[test]
fn test_inapplicable_command_is_disabled_and_dispatches_nothing() {
    let editor = TestEditor::formatting("hello world");
    editor.cursor(3);
    let manager = editor.manager();
    let before = editor.doc_json();
    let updates = editor.view().updates();
    let dispatches = count_dispatches(manager);

    assert!(!manager.command("toggleBold").enabled(Value::Null).unwrap());
    assert!(!manager.command("toggleBold").run(Value::Null).unwrap());

    assert_eq!(editor.doc_json(), before);
    assert_eq!(*dispatches.borrow(), 0);
    assert_eq!(editor.view().updates(), updates);
}

#[test]
fn test_enabled_does_not_dispatch() {
    let editor = TestEditor::formatting("hello world");
    editor.select(1, 6);
    let dispatches = count_dispatches(editor.manager());

    assert!(editor.manager().command("toggleBold").enabled(Value::Null).unwrap());
    assert_eq!(*dispatches.borrow(), 0);
    assert_eq!(editor.inline(0), json!([text("hello world")]));
}

#[test]
fn test_chain_skips_inapplicable_command_and_dispatches_once() {
    let editor = TestEditor::formatting("hello world");
    editor.select(1, 6);
    let manager = editor.manager();
    let dispatches = count_dispatches(manager);

    // Already a paragraph, so the middle command does not apply
    let outcome = manager
        .chain()
        .cmd("toggleBold", Value::Null)
        .cmd("convertParagraph", Value::Null)
        .cmd("toggleItalic", Value::Null)
        .run()
        .unwrap();

    assert_eq!(
        outcome,
        ChainOutcome {
            applied: vec!["toggleBold".into(), "toggleItalic".into()],
            skipped: vec!["convertParagraph".into()],
            aborted: false,
            dispatched: true,
        }
    );
    assert_eq!(*dispatches.borrow(), 1);
    editor.assert_doc(&doc([p([marked("hello", &["bold", "italic"]), text(" world")])]));
}

#[test]
fn test_strict_chain_leaves_document_untouched() {
    let editor = TestEditor::formatting("hello world");
    editor.select(1, 6);
    let manager = editor.manager();
    let before = editor.doc_json();
    let dispatches = count_dispatches(manager);

    let chain = manager
        .chain()
        .cmd("toggleBold", Value::Null)
        .cmd("convertParagraph", Value::Null)
        .cmd("toggleItalic", Value::Null)
        .mode(ChainMode::Strict);
    assert!(!chain.enabled().unwrap());
    let outcome = chain.run().unwrap();

    assert!(outcome.aborted);
    assert!(!outcome.dispatched);
    assert_eq!(*dispatches.borrow(), 0);
    assert_eq!(editor.doc_json(), before);
}

#[test]
fn test_heading_then_bold_in_one_chain() {
    let editor = TestEditor::formatting("hello world");
    editor.select(1, 6);

    let outcome = editor
        .manager()
        .chain()
        .cmd("toggleHeading", json!({ "level": 3 }))
        .cmd("toggleBold", Value::Null)
        .run()
        .unwrap();

    assert!(outcome.success());
    assert_eq!(editor.block(0)["attrs"], json!({ "level": 3 }));
    assert_eq!(editor.inline(0)[0], marked("hello", &["bold"]));
}

#[test]
fn test_commands_and_helpers_form_one_namespace() {
    let editor = TestEditor::formatting("hello");
    let manager = editor.manager();

    assert_eq!(
        manager.command_names(),
        ["convertParagraph", "exitLastBlock", "toggleBold", "toggleHeading", "toggleItalic"]
    );
    assert_eq!(manager.command_owner("toggleHeading").as_deref(), Some("heading"));
    assert_eq!(manager.command_owner("exitLastBlock").as_deref(), Some("gapCursor"));
}
