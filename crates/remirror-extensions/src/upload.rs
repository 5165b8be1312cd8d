//! File nodes and uploads that complete asynchronously.
//!
//! [`upload_file`] anchors the upload at the cursor before awaiting it.
//! Edits made while the upload is in flight move the anchor, and the file
//! node lands wherever the anchor ended up. If the surrounding content was
//! deleted the insertion is dropped.

use std::future::Future;

use remirror_core::{
    CommandSpec, DeferredOutcome, Extension, ExtensionContext, ExtensionDescriptor,
    NodeExtension, RemirrorManager, Tag,
};
use remirror_model::{
    AttrMatch, AttributeDef, Attrs, DomElement, DomOutput, NodeSpec, ParseRule, Transaction,
    render_string_attr,
};
use serde_json::{Value, json};

use crate::error::{Error, Result};

/// Handler key called with `{ "name", "error" }` when an upload fails
pub const UPLOAD_FAILED_HANDLER: &str = "onUploadFailed";

/// Node type contributed by [`UploadExtension`]
pub const FILE_NODE: &str = "file";

/// Where a finished upload can be fetched from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub url: String,
}

/// Contributes the inline `file` node and the `insertFile` command.
pub struct UploadExtension;

impl UploadExtension {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UploadExtension {
    fn default() -> Self {
        Self::new()
    }
}

/// Only anchors marked as files carry a file url
fn parse_url(element: &DomElement, _name: &str) -> AttrMatch {
    if element.attr("data-file").is_none() {
        return AttrMatch::NoMatch;
    }
    match element.attr("href") {
        Some(href) => AttrMatch::Value(Value::String(href.to_string())),
        None => AttrMatch::Default,
    }
}

fn render_url(_name: &str, value: &Value) -> Option<(String, String)> {
    render_string_attr("href", value)
}

fn file_attrs(url: &str, name: &str) -> Attrs {
    Attrs::from([
        ("url".to_string(), json!(url)),
        ("name".to_string(), json!(name)),
    ])
}

fn insert_file(tr: &mut Transaction, pos: usize, attrs: Attrs) -> bool {
    let Ok(node) = tr.schema().node(FILE_NODE, attrs, Vec::new()) else {
        return false;
    };
    tr.insert_node(pos, node).is_ok()
}

impl Extension for UploadExtension {
    fn descriptor(&self) -> ExtensionDescriptor {
        ExtensionDescriptor::new("upload")
            .handler(UPLOAD_FAILED_HANDLER)
            .tag(Tag::InlineNode)
            .tag(Tag::Media)
    }

    fn as_node(&self) -> Option<&dyn NodeExtension> {
        Some(self)
    }

    fn commands(&self, _cx: &ExtensionContext<'_>) -> Vec<CommandSpec> {
        vec![CommandSpec::new("insertFile", |props, args| {
            let Some(url) = args.get("url").and_then(Value::as_str) else {
                return false;
            };
            let name = args.get("name").and_then(Value::as_str).unwrap_or_default();
            let pos = props.tr.selection().from();
            insert_file(props.tr, pos, file_attrs(url, name))
        })]
    }
}

impl NodeExtension for UploadExtension {
    fn node_name(&self, _cx: &ExtensionContext<'_>) -> String {
        FILE_NODE.to_string()
    }

    fn node_spec(&self, _cx: &ExtensionContext<'_>) -> NodeSpec {
        NodeSpec::new()
            .inline()
            .attr(
                "url",
                AttributeDef::with_default(Value::Null).parse_dom(parse_url).to_dom(render_url),
            )
            .attr(
                "name",
                AttributeDef::with_default(json!("")).data_codec(),
            )
            .parse_rule(ParseRule::tag("a").with_priority(60))
            .to_dom(|_| DomOutput::new("a").attr("data-file", "true"))
    }
}

/// Insert a file node once `upload` completes.
///
/// The insertion point is the selection start when the upload begins,
/// mapped through every transaction dispatched while it runs. The manager
/// stays usable while the future is pending.
///
/// # Errors
///
/// Returns [`Error::MissingExtension`] without [`UploadExtension`], and
/// [`Error::UploadFailed`] after notifying `onUploadFailed` handlers when
/// the upload reports an error.
pub async fn upload_file<F>(manager: &RemirrorManager, name: &str, upload: F) -> Result<DeferredOutcome>
where
    F: Future<Output = std::result::Result<UploadedFile, String>>,
{
    if manager.extension::<UploadExtension>().is_none() {
        return Err(Error::MissingExtension("upload"));
    }
    let from = manager.state()?.selection().from();
    let anchor = manager.defer(from)?;
    tracing::debug!(name, pos = from, "Upload started");

    match upload.await {
        Ok(file) => {
            let attrs = file_attrs(&file.url, name);
            let outcome = manager.resolve_deferred(anchor, |tr, pos| insert_file(tr, pos, attrs))?;
            tracing::info!(name, ?outcome, "Upload finished");
            Ok(outcome)
        }
        Err(reason) => {
            drop(anchor);
            tracing::warn!(name, %reason, "Upload failed");
            manager.emit_handler("upload", UPLOAD_FAILED_HANDLER, &json!({ "name": name, "error": reason }))?;
            Err(Error::UploadFailed {
                name: name.to_string(),
                reason,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_only_parsed_from_file_links() {
        let file = DomElement::new("a")
            .with_attr("data-file", "true")
            .with_attr("href", "https://cdn.test/cat.png");
        let link = DomElement::new("a").with_attr("href", "https://remirror.io");
        assert_eq!(parse_url(&file, "url"), AttrMatch::Value(json!("https://cdn.test/cat.png")));
        assert_eq!(parse_url(&link, "url"), AttrMatch::NoMatch);
    }

    #[test]
    fn test_url_renders_as_href() {
        assert_eq!(
            render_url("url", &json!("https://cdn.test/a.pdf")),
            Some(("href".to_string(), "https://cdn.test/a.pdf".to_string()))
        );
        assert_eq!(render_url("url", &Value::Null), None);
    }
}
