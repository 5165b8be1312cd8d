//! Attribute specifications and DOM hooks shared by node and mark specs.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::dom::DomElement;

/// Attribute values of a node or mark, keyed by attribute name
pub type Attrs = BTreeMap<String, Value>;

/// Outcome of reading one attribute from an external element.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrMatch {
    /// The element carries a value for this attribute.
    Value(Value),
    /// The element does not mention the attribute; use the default.
    Default,
    /// The element does not match the rule that owns this attribute.
    NoMatch,
}

/// Reads an attribute value from an external element. Receives the element
/// and the attribute's name in the schema. Must be pure.
pub type ParseAttrFn = fn(&DomElement, &str) -> AttrMatch;

/// Writes an attribute value as a DOM attribute `(name, value)`. Receives the
/// attribute's name in the schema and its value. Must be pure. Returning
/// `None` omits the attribute from the output.
pub type AttrToDomFn = fn(&str, &Value) -> Option<(String, String)>;

/// Declaration of a single attribute on a node or mark type.
#[derive(Debug, Clone, Default)]
pub struct AttributeDef {
    /// Default value; `None` makes the attribute required.
    pub default: Option<Value>,
    pub parse_dom: Option<ParseAttrFn>,
    pub to_dom: Option<AttrToDomFn>,
    /// Stable name of the parse/serialize pair, set by [`AttributeDef::codec`].
    pub codec: Option<&'static str>,
}

/// Codec key of [`parse_string_attr`] and [`render_string_attr`].
pub const STRING_CODEC: &str = "string";
/// Codec key of [`parse_data_attr`] and [`render_data_attr`].
pub const DATA_CODEC: &str = "data";

impl AttributeDef {
    /// A required attribute with no DOM hooks
    pub fn required() -> Self {
        Self::default()
    }

    /// An optional attribute with the given default
    pub fn with_default(default: Value) -> Self {
        Self {
            default: Some(default),
            ..Self::default()
        }
    }

    /// Sets the parse hook. Clears any codec key, since the pair no longer
    /// matches it.
    pub fn parse_dom(mut self, parse: ParseAttrFn) -> Self {
        self.parse_dom = Some(parse);
        self.codec = None;
        self
    }

    /// Sets the serialize hook. Clears any codec key.
    pub fn to_dom(mut self, to_dom: AttrToDomFn) -> Self {
        self.to_dom = Some(to_dom);
        self.codec = None;
        self
    }

    /// Sets both hooks under a stable key. Definitions sharing a key are
    /// treated as the same codec when merged.
    pub fn codec(mut self, key: &'static str, parse: ParseAttrFn, to_dom: AttrToDomFn) -> Self {
        self.parse_dom = Some(parse);
        self.to_dom = Some(to_dom);
        self.codec = Some(key);
        self
    }

    /// Plain DOM attribute of the same name.
    pub fn string_codec(self) -> Self {
        self.codec(STRING_CODEC, parse_string_attr, render_string_attr)
    }

    /// `data-<name>` DOM attribute.
    pub fn data_codec(self) -> Self {
        self.codec(DATA_CODEC, parse_data_attr, render_data_attr)
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    /// Two definitions are interchangeable when their defaults are equal and
    /// they read and write the DOM the same way.
    ///
    /// Keyed definitions compare by codec key. Unkeyed hooks fall back to
    /// function address equality, which is best effort: the compiler may merge
    /// distinct functions with identical bodies or duplicate one function
    /// across codegen units. Shared attributes should use a codec key.
    pub fn same_definition(&self, other: &AttributeDef) -> bool {
        if self.default != other.default {
            return false;
        }
        match (self.codec, other.codec) {
            (Some(a), Some(b)) => return a == b,
            (None, None) => {}
            _ => return false,
        }
        let same_parse = match (self.parse_dom, other.parse_dom) {
            (None, None) => true,
            (Some(a), Some(b)) => std::ptr::fn_addr_eq(a, b),
            _ => false,
        };
        let same_to_dom = match (self.to_dom, other.to_dom) {
            (None, None) => true,
            (Some(a), Some(b)) => std::ptr::fn_addr_eq(a, b),
            _ => false,
        };
        same_parse && same_to_dom
    }
}

/// The element a node or mark renders as.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DomOutput {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
}

impl DomOutput {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: BTreeMap::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }
}

/// Renders a node or mark to its DOM element
pub type ToDomFn = fn(&Attrs) -> DomOutput;

/// Matches external elements to a node or mark type during import.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParseRule {
    /// Lower-case tag name this rule matches.
    pub tag: String,
    /// Attributes fixed by the rule itself (e.g. `level = 2` for `<h2>`).
    pub attrs: Attrs,
    /// Parse priority; lower values are tried first. Filled in from the
    /// contributing extension's priority when left unset.
    pub priority: Option<i32>,
}

impl ParseRule {
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attrs.insert(name.into(), value);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// Reads a plain string DOM attribute of the same name, mapping absence to
/// the default.
pub fn parse_string_attr(element: &DomElement, name: &str) -> AttrMatch {
    match element.attr(name) {
        Some(value) => AttrMatch::Value(Value::String(value.to_string())),
        None => AttrMatch::Default,
    }
}

/// Writes a value as a DOM attribute of the same name. `null` is omitted,
/// strings are written as-is and other values as JSON.
pub fn render_string_attr(name: &str, value: &Value) -> Option<(String, String)> {
    render_value(value).map(|rendered| (name.to_string(), rendered))
}

/// Reads a `data-<name>` DOM attribute as a string.
pub fn parse_data_attr(element: &DomElement, name: &str) -> AttrMatch {
    match element.attr(&format!("data-{name}")) {
        Some(value) => AttrMatch::Value(Value::String(value.to_string())),
        None => AttrMatch::Default,
    }
}

/// Writes a value as a `data-<name>` DOM attribute, omitting `null`.
pub fn render_data_attr(name: &str, value: &Value) -> Option<(String, String)> {
    render_value(value).map(|rendered| (format!("data-{name}"), rendered))
}

fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse_a(_: &DomElement, _: &str) -> AttrMatch {
        AttrMatch::Default
    }

    fn parse_b(_: &DomElement, _: &str) -> AttrMatch {
        AttrMatch::NoMatch
    }

    #[test]
    fn test_same_definition_requires_same_functions() {
        let a = AttributeDef::with_default(json!(null)).parse_dom(parse_a);
        let same = AttributeDef::with_default(json!(null)).parse_dom(parse_a);
        let other_fn = AttributeDef::with_default(json!(null)).parse_dom(parse_b);
        let other_default = AttributeDef::with_default(json!(1)).parse_dom(parse_a);

        assert!(a.same_definition(&same));
        assert!(!a.same_definition(&other_fn));
        assert!(!a.same_definition(&other_default));
    }

    fn render_a(name: &str, value: &Value) -> Option<(String, String)> {
        render_data_attr(name, value)
    }

    #[test]
    fn test_same_definition_compares_codec_keys() {
        let data = AttributeDef::with_default(json!(null)).data_codec();
        let wrapped = AttributeDef::with_default(json!(null)).codec(DATA_CODEC, parse_a, render_a);
        let string = AttributeDef::with_default(json!(null)).string_codec();
        let unkeyed = AttributeDef::with_default(json!(null))
            .parse_dom(parse_data_attr)
            .to_dom(render_data_attr);

        assert!(data.same_definition(&wrapped));
        assert!(!data.same_definition(&string));
        assert!(!data.same_definition(&unkeyed));
        assert_eq!(data.clone().parse_dom(parse_a).codec, None);
    }

    #[test]
    fn test_required_attribute() {
        assert!(AttributeDef::required().is_required());
        assert!(!AttributeDef::with_default(json!("x")).is_required());
    }

    #[test]
    fn test_parse_string_attr() {
        let el = DomElement::new("a").with_attr("href", "/home");
        assert_eq!(parse_string_attr(&el, "href"), AttrMatch::Value(json!("/home")));
        assert_eq!(parse_string_attr(&el, "title"), AttrMatch::Default);
    }

    #[test]
    fn test_data_attr_codec() {
        assert_eq!(
            render_data_attr("id", &json!("a1")),
            Some(("data-id".to_string(), "a1".to_string()))
        );
        assert_eq!(render_data_attr("id", &json!(null)), None);
        assert_eq!(
            render_string_attr("level", &json!(2)),
            Some(("level".to_string(), "2".to_string()))
        );
        let el = DomElement::new("p").with_attr("data-id", "a1");
        assert_eq!(parse_data_attr(&el, "id"), AttrMatch::Value(json!("a1")));
        assert_eq!(parse_data_attr(&el, "other"), AttrMatch::Default);
    }
}
