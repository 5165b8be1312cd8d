//! Links, with automatic linking of pasted URLs.

use remirror_core::commands::is_mark_active;
use remirror_core::{
    CommandSpec, Extension, ExtensionContext, ExtensionDescriptor, HelperSpec, MarkExtension,
    PasteRule, RuleMatch, Tag,
};
use remirror_model::{
    AttrMatch, AttributeDef, Attrs, DomElement, DomOutput, EditorState, MarkSpec, ParseRule,
    render_string_attr,
};
use serde_json::{Value, json};

/// Bare URLs in pasted text. Trailing punctuation stays outside the link.
const URL_PATTERN: &str = r#"https?://[^\s<>"]*[^\s<>".,;:!?)]"#;

/// Contributes the `link` mark.
///
/// Options:
/// - `autoLink` (dynamic, default `true`): mark URLs in pasted text
/// - `defaultTarget` (dynamic, default `null`): `target` given to links
///   created by `updateLink` without an explicit one
pub struct LinkExtension;

impl LinkExtension {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LinkExtension {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_href(element: &DomElement, _name: &str) -> AttrMatch {
    match element.attr("href") {
        Some(href) if !href.is_empty() => AttrMatch::Value(Value::String(href.to_string())),
        _ => AttrMatch::NoMatch,
    }
}

fn url_attrs(m: &RuleMatch) -> Attrs {
    Attrs::from([("href".to_string(), json!(m.text()))])
}

/// Href of the first link inside the selection, or right after a cursor
fn selected_href(state: &EditorState) -> Option<String> {
    let selection = state.selection();
    let doc = state.doc();
    let from = selection.from();
    let to = selection.to().max(from + 1).min(doc.content_size());
    let mut href = None;
    doc.nodes_between(from, to, &mut |node, _| {
        if href.is_none() {
            href = node
                .marks()
                .iter()
                .find(|m| m.kind == "link")
                .and_then(|m| m.attrs.get("href"))
                .and_then(Value::as_str)
                .map(str::to_string);
        }
        href.is_none()
    });
    href
}

impl Extension for LinkExtension {
    fn descriptor(&self) -> ExtensionDescriptor {
        ExtensionDescriptor::new("link")
            .option("autoLink", json!(true))
            .option("defaultTarget", Value::Null)
            .tag(Tag::LinkMark)
    }

    fn as_mark(&self) -> Option<&dyn MarkExtension> {
        Some(self)
    }

    fn commands(&self, cx: &ExtensionContext<'_>) -> Vec<CommandSpec> {
        let default_target = cx.options.get("defaultTarget").cloned().unwrap_or(Value::Null);
        vec![
            CommandSpec::new("updateLink", move |props, args| {
                let selection = props.tr.selection();
                let Some(href) = args.get("href").and_then(Value::as_str).filter(|h| !h.is_empty())
                else {
                    return false;
                };
                if selection.empty() {
                    return false;
                }
                let target = args.get("target").cloned().unwrap_or_else(|| default_target.clone());
                let attrs = Attrs::from([
                    ("href".to_string(), json!(href)),
                    ("target".to_string(), target),
                ]);
                let (from, to) = (selection.from(), selection.to());
                let Ok(mark) = props.tr.schema().mark("link", attrs) else {
                    return false;
                };
                let checkpoint = props.tr.checkpoint();
                let applied = props
                    .tr
                    .remove_mark(from, to, "link")
                    .and_then(|tr| tr.add_mark(from, to, mark));
                if applied.is_err() {
                    props.tr.rollback(checkpoint);
                    return false;
                }
                true
            })
            .with_active(|state, _| is_mark_active(state, "link")),
            CommandSpec::new("removeLink", |props, _| {
                let selection = props.tr.selection();
                let (from, to) = (selection.from(), selection.to());
                if selection.empty() || !props.tr.doc().range_touches_mark(from, to, "link") {
                    return false;
                }
                props.tr.remove_mark(from, to, "link").is_ok()
            }),
        ]
    }

    fn helpers(&self, _cx: &ExtensionContext<'_>) -> Vec<HelperSpec> {
        vec![HelperSpec::new("linkHref", |state, _| {
            selected_href(state).map_or(Value::Null, Value::String)
        })]
    }

    fn paste_rules(&self, cx: &ExtensionContext<'_>) -> Vec<PasteRule> {
        if cx.options.get_bool("autoLink") == Some(false) {
            return Vec::new();
        }
        vec![PasteRule::mark(URL_PATTERN, "link", url_attrs)]
    }
}

impl MarkExtension for LinkExtension {
    fn mark_spec(&self, _cx: &ExtensionContext<'_>) -> MarkSpec {
        MarkSpec::new()
            .attr(
                "href",
                AttributeDef::required().parse_dom(parse_href).to_dom(render_string_attr),
            )
            .attr(
                "target",
                AttributeDef::with_default(Value::Null).string_codec(),
            )
            .parse_rule(ParseRule::tag("a"))
            .to_dom(|_| DomOutput::new("a"))
            .exclusive()
    }
}
