//! Central table of extension tags.
//!
//! Tags are labels an extension attaches to itself. They feed ordering,
//! group derivation and extra-attribute targeting, never schema identity.
//! Every tag the framework understands is listed here; unrecognised tag
//! strings coming from configuration are ignored.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tag {
    /// Node takes part in the `block` content group
    BlockNode,
    /// Node takes part in the `inline` content group
    InlineNode,
    /// Textblock nodes such as paragraphs and headings
    TextBlock,
    /// Marks that style text (bold, italic)
    FormattingMark,
    /// Nodes that style content (headings)
    FormattingNode,
    /// Marks that carry a target (links)
    LinkMark,
    /// Node may be the last node of the document
    LastNodeCompatible,
    /// Extension changes editing behaviour without schema contributions
    Behavior,
    /// Extension handles files and media
    Media,
}

impl Tag {
    pub const ALL: [Tag; 9] = [
        Tag::BlockNode,
        Tag::InlineNode,
        Tag::TextBlock,
        Tag::FormattingMark,
        Tag::FormattingNode,
        Tag::LinkMark,
        Tag::LastNodeCompatible,
        Tag::Behavior,
        Tag::Media,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Tag::BlockNode => "block-node",
            Tag::InlineNode => "inline-node",
            Tag::TextBlock => "text-block",
            Tag::FormattingMark => "formatting-mark",
            Tag::FormattingNode => "formatting-node",
            Tag::LinkMark => "link-mark",
            Tag::LastNodeCompatible => "last-node-compatible",
            Tag::Behavior => "behavior",
            Tag::Media => "media",
        }
    }

    /// Look up a tag by its string form
    pub fn parse(value: &str) -> Option<Tag> {
        Tag::ALL.into_iter().find(|tag| tag.as_str() == value)
    }

    /// Content group implied by this tag
    pub fn group(self) -> Option<&'static str> {
        match self {
            Tag::BlockNode => Some("block"),
            Tag::InlineNode => Some("inline"),
            _ => None,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a list of tag strings, dropping ones the framework does not know.
pub fn parse_tags<S: AsRef<str>>(values: &[S]) -> Vec<Tag> {
    values
        .iter()
        .filter_map(|value| {
            let parsed = Tag::parse(value.as_ref());
            if parsed.is_none() {
                tracing::debug!(tag = value.as_ref(), "Ignoring unknown tag");
            }
            parsed
        })
        .collect()
}

/// Space separated groups derived from tags
pub fn groups_for(tags: &[Tag]) -> Option<String> {
    let groups: Vec<&str> = tags.iter().filter_map(|t| t.group()).collect();
    if groups.is_empty() {
        None
    } else {
        Some(groups.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_forms_round_trip() {
        for tag in Tag::ALL {
            assert_eq!(Tag::parse(tag.as_str()), Some(tag));
            let json = serde_json::to_value(tag).unwrap();
            assert_eq!(json, serde_json::Value::String(tag.as_str().to_string()));
        }
    }

    #[test]
    fn test_unknown_tags_are_ignored() {
        let tags = parse_tags(&["formatting-mark", "sparkly", "block-node"]);
        assert_eq!(tags, vec![Tag::FormattingMark, Tag::BlockNode]);
    }

    #[test]
    fn test_groups_from_tags() {
        assert_eq!(
            groups_for(&[Tag::BlockNode, Tag::TextBlock]).as_deref(),
            Some("block")
        );
        assert_eq!(groups_for(&[Tag::FormattingMark]), None);
    }
}
