//! Extension descriptors and the options store.
//!
//! An [`ExtensionDescriptor`] is the static metadata of an extension: its
//! name, default options, which of those options are static (they shape the
//! schema and can only be set before initialization), which keys are event
//! handlers, and its ordering relations. Descriptors are validated once when
//! the extension is registered.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::priority::Priority;
use crate::tags::Tag;

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9_-]*$").expect("extension name regex is valid")
});

/// Static metadata of an extension.
#[derive(Debug, Clone, Default)]
pub struct ExtensionDescriptor {
    /// Unique name; node and mark extensions use it as their type name.
    pub name: String,
    pub default_options: Map<String, Value>,
    /// Option keys that can only change before the schema is built
    pub static_keys: Vec<String>,
    /// Event handler keys, see [`Options::emit`]
    pub handler_keys: Vec<String>,
    pub default_priority: Priority,
    pub tags: Vec<Tag>,
    /// Extensions that must come before this one
    pub after: Vec<String>,
    /// Extensions that must come after this one
    pub before: Vec<String>,
    /// Extensions that must be present, in any order
    pub requires: Vec<String>,
}

impl ExtensionDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Declare a dynamic option with its default value
    pub fn option(mut self, key: impl Into<String>, default: Value) -> Self {
        self.default_options.insert(key.into(), default);
        self
    }

    /// Declare a static option with its default value
    pub fn static_option(mut self, key: impl Into<String>, default: Value) -> Self {
        let key = key.into();
        self.static_keys.push(key.clone());
        self.default_options.insert(key, default);
        self
    }

    pub fn handler(mut self, key: impl Into<String>) -> Self {
        self.handler_keys.push(key.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.default_priority = priority;
        self
    }

    pub fn tag(mut self, tag: Tag) -> Self {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    pub fn after(mut self, name: impl Into<String>) -> Self {
        self.after.push(name.into());
        self
    }

    pub fn before(mut self, name: impl Into<String>) -> Self {
        self.before.push(name.into());
        self
    }

    pub fn requires(mut self, name: impl Into<String>) -> Self {
        self.requires.push(name.into());
        self
    }

    /// Check the descriptor for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDescriptor`] for a malformed name, a static key
    /// that is not an option, a handler key that collides with an option, or
    /// an extension that orders itself against itself.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Error::InvalidDescriptor {
            extension: self.name.clone(),
            reason,
        };

        if !NAME_PATTERN.is_match(&self.name) {
            return Err(invalid(format!("'{}' is not a valid extension name", self.name)));
        }
        for key in &self.static_keys {
            if !self.default_options.contains_key(key) {
                return Err(invalid(format!("static key '{key}' has no default option")));
            }
        }
        for key in &self.handler_keys {
            if self.default_options.contains_key(key) {
                return Err(invalid(format!("handler key '{key}' is also an option")));
            }
        }
        let related = self.after.iter().chain(&self.before).chain(&self.requires);
        if let Some(own) = related.into_iter().find(|n| **n == self.name) {
            return Err(invalid(format!("extension cannot depend on itself ('{own}')")));
        }
        Ok(())
    }
}

/// Identifies a registered handler so it can be removed again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Callback registered for a handler key
pub type HandlerFn = Rc<dyn Fn(&Value)>;

/// Current option values of one extension and its registered handlers.
#[derive(Clone)]
pub struct Options {
    extension: String,
    values: Map<String, Value>,
    static_keys: Vec<String>,
    handler_keys: Vec<String>,
    handlers: HashMap<String, Vec<(HandlerId, HandlerFn)>>,
    next_handler: u64,
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers: HashMap<&str, usize> = self
            .handlers
            .iter()
            .map(|(k, v)| (k.as_str(), v.len()))
            .collect();
        f.debug_struct("Options")
            .field("extension", &self.extension)
            .field("values", &self.values)
            .field("handlers", &handlers)
            .finish()
    }
}

impl Options {
    /// Options at their declared defaults
    pub fn from_descriptor(descriptor: &ExtensionDescriptor) -> Self {
        Self {
            extension: descriptor.name.clone(),
            values: descriptor.default_options.clone(),
            static_keys: descriptor.static_keys.clone(),
            handler_keys: descriptor.handler_keys.clone(),
            handlers: HashMap::new(),
            next_handler: 0,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(Value::as_u64)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn is_static(&self, key: &str) -> bool {
        self.static_keys.iter().any(|k| k == key)
    }

    /// Keys in `update` whose values differ from the current ones.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownOption`] for a key the descriptor never declared.
    pub fn changed_keys(&self, update: &Map<String, Value>) -> Result<Vec<String>> {
        let mut changed = Vec::new();
        for (key, value) in update {
            let current = self.values.get(key).ok_or_else(|| Error::UnknownOption {
                extension: self.extension.clone(),
                option: key.clone(),
            })?;
            if current != value {
                changed.push(key.clone());
            }
        }
        Ok(changed)
    }

    /// Merge `update` into the current values, returning the keys that changed.
    pub fn update(&mut self, update: &Map<String, Value>) -> Result<Vec<String>> {
        let changed = self.changed_keys(update)?;
        for key in &changed {
            if let Some(value) = update.get(key) {
                self.values.insert(key.clone(), value.clone());
            }
        }
        Ok(changed)
    }

    /// Register a callback for a handler key.
    pub fn add_handler(&mut self, key: &str, handler: HandlerFn) -> Result<HandlerId> {
        self.check_handler_key(key)?;
        let id = HandlerId(self.next_handler);
        self.next_handler += 1;
        self.handlers
            .entry(key.to_string())
            .or_default()
            .push((id, handler));
        Ok(id)
    }

    /// Remove a previously registered callback. Returns whether it existed.
    pub fn remove_handler(&mut self, id: HandlerId) -> bool {
        let mut removed = false;
        for handlers in self.handlers.values_mut() {
            let before = handlers.len();
            handlers.retain(|(h, _)| *h != id);
            removed |= handlers.len() != before;
        }
        removed
    }

    /// Call every handler registered for `key` in registration order and
    /// return how many ran.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownOption`] when `key` is not a declared handler key.
    pub fn emit(&self, key: &str, payload: &Value) -> Result<usize> {
        self.check_handler_key(key)?;
        let handlers: Vec<HandlerFn> = self
            .handlers
            .get(key)
            .map(|hs| hs.iter().map(|(_, h)| Rc::clone(h)).collect())
            .unwrap_or_default();
        for handler in &handlers {
            handler(payload);
        }
        tracing::debug!(extension = %self.extension, key, count = handlers.len(), "Emitted handler event");
        Ok(handlers.len())
    }

    fn check_handler_key(&self, key: &str) -> Result<()> {
        if self.handler_keys.iter().any(|k| k == key) {
            Ok(())
        } else {
            Err(Error::UnknownOption {
                extension: self.extension.clone(),
                option: key.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use std::cell::RefCell;

    fn descriptor() -> ExtensionDescriptor {
        ExtensionDescriptor::new("heading")
            .static_option("levels", json!([1, 2, 3]))
            .option("placeholder", json!(""))
            .handler("onChange")
    }

    #[test]
    fn test_valid_descriptor() {
        descriptor().validate().unwrap();
    }

    #[rstest]
    #[case::bad_name(ExtensionDescriptor::new("1st"))]
    #[case::empty_name(ExtensionDescriptor::new(""))]
    #[case::static_without_default({
        let mut d = ExtensionDescriptor::new("x");
        d.static_keys.push("missing".into());
        d
    })]
    #[case::handler_is_option(ExtensionDescriptor::new("x").option("onClick", json!(null)).handler("onClick"))]
    #[case::self_dependency(ExtensionDescriptor::new("x").after("x"))]
    fn test_invalid_descriptor(#[case] descriptor: ExtensionDescriptor) {
        assert!(matches!(
            descriptor.validate(),
            Err(Error::InvalidDescriptor { .. })
        ));
    }

    #[test]
    fn test_update_reports_changed_keys() {
        let mut options = Options::from_descriptor(&descriptor());
        let mut update = Map::new();
        update.insert("placeholder".into(), json!("Type here"));
        update.insert("levels".into(), json!([1, 2, 3]));

        let changed = options.update(&update).unwrap();
        assert_eq!(changed, vec!["placeholder".to_string()]);
        assert_eq!(options.get_str("placeholder"), Some("Type here"));
        assert!(options.is_static("levels"));
        assert!(!options.is_static("placeholder"));
    }

    #[test]
    fn test_update_rejects_unknown_key() {
        let mut options = Options::from_descriptor(&descriptor());
        let mut update = Map::new();
        update.insert("colour".into(), json!("red"));
        let err = options.update(&update).unwrap_err();
        assert!(matches!(err, Error::UnknownOption { ref option, .. } if option == "colour"));
        assert_eq!(options.get("colour"), None);
    }

    #[test]
    fn test_handlers_emit_and_remove() {
        let mut options = Options::from_descriptor(&descriptor());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = options
            .add_handler("onChange", Rc::new(move |v| sink.borrow_mut().push(v.clone())))
            .unwrap();

        assert_eq!(options.emit("onChange", &json!(1)).unwrap(), 1);
        assert!(options.remove_handler(id));
        assert_eq!(options.emit("onChange", &json!(2)).unwrap(), 0);
        assert_eq!(*seen.borrow(), vec![json!(1)]);

        assert!(options.emit("onSave", &json!(null)).is_err());
        assert!(options.add_handler("placeholder", Rc::new(|_| {})).is_err());
    }
}
