//! HTML export followed by import reproduces the document

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use remirror_extensions::{BoldExtension, HeadingExtension, ItalicExtension, LinkExtension};
use remirror_model::{DomParser, DomSerializer};
use remirror_test_utils::TestEditor;
use remirror_test_utils::docs::{block, doc, heading, p, text};
use serde_json::{Value, json};

const BOLD: u8 = 1;
const ITALIC: u8 = 2;
const LINK: u8 = 4;

fn editor_for(content: Value) -> TestEditor {
    TestEditor::builder()
        .with(HeadingExtension::new())
        .with(BoldExtension::new())
        .with(ItalicExtension::new())
        .with(LinkExtension::new())
        .content(content)
        .without_view()
        .build()
}

fn run(text: &str, mask: u8) -> Value {
    let mut marks = Vec::new();
    if mask & BOLD != 0 {
        marks.push(json!({ "type": "bold" }));
    }
    if mask & ITALIC != 0 {
        marks.push(json!({ "type": "italic" }));
    }
    if mask & LINK != 0 {
        marks.push(json!({
            "type": "link",
            "attrs": { "href": format!("https://example.com/{text}"), "target": null }
        }));
    }
    if marks.is_empty() {
        json!({ "type": "text", "text": text })
    } else {
        json!({ "type": "text", "text": text, "marks": marks })
    }
}

/// Text runs where neighbours never share a mark set, so nothing merges
fn inline_content() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(("[a-z]{1,8}", 0u8..8), 0..5).prop_map(|runs| {
        let mut merged: Vec<(String, u8)> = Vec::new();
        for (text, mask) in runs {
            match merged.last_mut() {
                Some((last, last_mask)) if *last_mask == mask => last.push_str(&text),
                _ => merged.push((text, mask)),
            }
        }
        merged.iter().map(|(text, mask)| run(text, *mask)).collect()
    })
}

fn block_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        inline_content().prop_map(p),
        (1u64..=6, inline_content()).prop_map(|(level, inline)| heading(level, inline)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_html_round_trip(blocks in prop::collection::vec(block_strategy(), 1..5)) {
        let editor = editor_for(doc(blocks));
        let schema = editor.manager().schema().unwrap();
        let state = editor.manager().state().unwrap();

        let html = DomSerializer::from_schema(&schema).to_html(state.doc()).unwrap();
        let parsed = DomParser::from_schema(&schema).parse(&html).unwrap();
        prop_assert_eq!(parsed.to_json(), state.doc().to_json());
    }
}

#[test]
fn test_attribute_defaults_fill_in_on_import() {
    let editor = editor_for(doc([p([])]));
    let schema = editor.manager().schema().unwrap();
    let parsed = DomParser::from_schema(&schema)
        .parse(r#"<h3>Title</h3><p><a href="https://remirror.io">docs</a></p>"#)
        .unwrap();

    assert_eq!(
        parsed.to_json(),
        doc([
            block("heading", json!({ "level": 3 }), [text("Title")]),
            p([json!({
                "type": "text",
                "text": "docs",
                "marks": [{ "type": "link", "attrs": { "href": "https://remirror.io", "target": null } }]
            })]),
        ])
    );
}
