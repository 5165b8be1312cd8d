//! Manager settings.
//!
//! Settings can be built in code or loaded from TOML:
//!
//! ```toml
//! strict_chains = false
//! keymap_platform = "mac"
//!
//! [[extra_attributes]]
//! target = "all-nodes"
//! attribute = "align"
//! default = "left"
//! dom_attribute = true
//!
//! [extensions.heading]
//! priority = 250
//! levels = [1, 2]
//! ```

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use remirror_model::{AttributeDef, Node};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::content::ContentError;
use crate::error::Result;
use crate::priority::Priority;
use crate::schema::ExtraAttributesTarget;

/// Called when content does not fit the schema. May return a replacement.
pub type OnErrorFn = Rc<dyn Fn(&ContentError) -> Option<Node>>;

/// How the `Mod` key modifier resolves in key bindings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// `Mod` is the command (meta) key
    Mac,
    /// `Mod` is the control key
    #[default]
    Other,
}

/// An extra attribute declared in settings rather than by an extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraAttributesConfig {
    pub target: ExtraAttributesTarget,
    pub attribute: String,
    #[serde(default)]
    pub default: Value,
    /// Read and write the value as a `data-<attribute>` DOM attribute
    #[serde(default)]
    pub dom_attribute: bool,
}

impl ExtraAttributesConfig {
    pub fn to_definition(&self) -> AttributeDef {
        let def = AttributeDef::with_default(self.default.clone());
        if self.dom_attribute {
            def.data_codec()
        } else {
            def
        }
    }
}

/// Per-extension overrides, one `[extensions.<name>]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtensionSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Option values keyed by option name
    #[serde(default, flatten)]
    pub options: Map<String, Value>,
}

/// Configuration recognised by [`RemirrorManager::create`](crate::RemirrorManager::create).
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerSettings {
    pub extra_attributes: Vec<ExtraAttributesConfig>,
    pub extensions: HashMap<String, ExtensionSettings>,
    /// Default chain mode: abort on the first inapplicable command
    pub strict_chains: bool,
    pub keymap_platform: Platform,
    #[serde(skip)]
    pub on_error: Option<OnErrorFn>,
}

impl fmt::Debug for ManagerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerSettings")
            .field("extra_attributes", &self.extra_attributes)
            .field("extensions", &self.extensions)
            .field("strict_chains", &self.strict_chains)
            .field("keymap_platform", &self.keymap_platform)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl ManagerSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse settings from a TOML document.
    pub fn from_toml(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn with_on_error(mut self, handler: impl Fn(&ContentError) -> Option<Node> + 'static) -> Self {
        self.on_error = Some(Rc::new(handler));
        self
    }

    pub fn with_extra_attribute(mut self, config: ExtraAttributesConfig) -> Self {
        self.extra_attributes.push(config);
        self
    }

    /// Override an option value of one extension
    pub fn with_option(mut self, extension: &str, key: impl Into<String>, value: Value) -> Self {
        self.extensions
            .entry(extension.to_string())
            .or_default()
            .options
            .insert(key.into(), value);
        self
    }

    pub fn with_priority(mut self, extension: &str, priority: Priority) -> Self {
        self.extensions.entry(extension.to_string()).or_default().priority = Some(priority);
        self
    }

    pub fn with_strict_chains(mut self, strict: bool) -> Self {
        self.strict_chains = strict;
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.keymap_platform = platform;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::Tag;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_full_settings() {
        let source = r#"
strict_chains = true
keymap_platform = "mac"

[[extra_attributes]]
target = "all-nodes"
attribute = "align"
default = "left"
dom_attribute = true

[[extra_attributes]]
target = { tags = ["formatting-mark"] }
attribute = "tone"

[extensions.heading]
priority = 250
levels = [1, 2]
"#;
        let settings = ManagerSettings::from_toml(source).unwrap();
        assert!(settings.strict_chains);
        assert_eq!(settings.keymap_platform, Platform::Mac);
        assert_eq!(settings.extra_attributes.len(), 2);
        assert_eq!(settings.extra_attributes[0].target, ExtraAttributesTarget::AllNodes);
        assert_eq!(settings.extra_attributes[0].default, json!("left"));
        assert_eq!(
            settings.extra_attributes[1].target,
            ExtraAttributesTarget::Tags(vec![Tag::FormattingMark])
        );
        assert_eq!(settings.extra_attributes[1].default, Value::Null);

        let heading = &settings.extensions["heading"];
        assert_eq!(heading.priority, Some(Priority(250)));
        assert_eq!(heading.options.get("levels"), Some(&json!([1, 2])));
        assert!(
            !heading.options.contains_key("priority"),
            "priority should not leak into the options map"
        );
    }

    #[test]
    fn test_empty_settings_use_defaults() {
        let settings = ManagerSettings::from_toml("").unwrap();
        assert!(!settings.strict_chains);
        assert_eq!(settings.keymap_platform, Platform::Other);
        assert!(settings.extensions.is_empty());
        assert!(settings.on_error.is_none());
    }

    #[test]
    fn test_invalid_toml() {
        let err = ManagerSettings::from_toml("strict_chains = \"yes\"").unwrap_err();
        assert!(matches!(err, crate::error::Error::TomlDe(_)));
    }

    #[test]
    fn test_builders() {
        let settings = ManagerSettings::new()
            .with_option("placeholder", "text", json!("Write..."))
            .with_priority("placeholder", Priority::LOW)
            .with_on_error(|_| None);
        let placeholder = &settings.extensions["placeholder"];
        assert_eq!(placeholder.priority, Some(Priority::LOW));
        assert_eq!(placeholder.options["text"], json!("Write..."));
        assert!(format!("{settings:?}").contains("on_error: true"));
    }

    #[test]
    fn test_dom_attribute_uses_data_codec() {
        let config = ExtraAttributesConfig {
            target: ExtraAttributesTarget::AllNodes,
            attribute: "align".into(),
            default: json!("left"),
            dom_attribute: true,
        };
        let def = config.to_definition();
        let expected = AttributeDef::with_default(json!("left")).data_codec();
        assert!(def.same_definition(&expected));
    }
}
