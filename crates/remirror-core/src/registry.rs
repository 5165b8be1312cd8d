//! Registry of the extensions owned by a manager.

use std::any::Any;
use std::sync::Arc;

use remirror_model::Schema;

use crate::error::{Error, Result};
use crate::extension::{Extension, ExtensionContext, ExtensionKind};
use crate::options::{ExtensionDescriptor, Options};
use crate::priority::Priority;
use crate::resolver::{OrderEntry, resolve_order};
use crate::settings::{ExtensionSettings, ManagerSettings};
use crate::tags::Tag;

/// One registered extension with its validated descriptor and live options.
pub struct ExtensionSlot {
    extension: Box<dyn Extension>,
    descriptor: ExtensionDescriptor,
    options: Options,
    priority: Priority,
    /// Declaration sequence number, the tie-break for equal priorities
    declared: usize,
}

impl ExtensionSlot {
    /// Validate an extension's descriptor and apply settings overrides.
    pub fn new(extension: Box<dyn Extension>, overrides: Option<&ExtensionSettings>) -> Result<Self> {
        let descriptor = extension.descriptor();
        descriptor.validate()?;
        let mut options = Options::from_descriptor(&descriptor);
        let mut priority = descriptor.default_priority;
        if let Some(overrides) = overrides {
            options.update(&overrides.options)?;
            priority = overrides.priority.unwrap_or(priority);
        }
        Ok(Self {
            extension,
            descriptor,
            options,
            priority,
            declared: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn extension(&self) -> &dyn Extension {
        self.extension.as_ref()
    }

    pub fn into_extension(self) -> Box<dyn Extension> {
        self.extension
    }

    pub fn descriptor(&self) -> &ExtensionDescriptor {
        &self.descriptor
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn tags(&self) -> &[Tag] {
        &self.descriptor.tags
    }

    pub fn kind(&self) -> ExtensionKind {
        self.extension.kind()
    }

    /// Context handed to the extension's hooks
    pub fn context<'a>(&'a self, schema: Option<&'a Arc<Schema>>) -> ExtensionContext<'a> {
        ExtensionContext::new(
            &self.descriptor.name,
            &self.options,
            self.priority,
            &self.descriptor.tags,
            schema,
        )
    }

    /// Whether this extension orders itself against or requires `name`
    pub fn depends_on(&self, name: &str) -> bool {
        let d = &self.descriptor;
        d.after.iter().chain(&d.before).chain(&d.requires).any(|n| n == name)
    }
}

/// Extensions in resolved order.
///
/// The registry owns every extension it holds. Lookups go by name, or by
/// concrete type through [`ExtensionRegistry::get_typed`].
#[derive(Default)]
pub struct ExtensionRegistry {
    slots: Vec<ExtensionSlot>,
    next_declared: usize,
}

impl ExtensionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `extensions` in declaration order, applying per-extension
    /// settings, and resolve their order.
    ///
    /// # Errors
    ///
    /// Fails on invalid descriptors, overrides naming unknown options or
    /// unknown extensions, and any ordering error.
    pub fn from_extensions(extensions: Vec<Box<dyn Extension>>, settings: &ManagerSettings) -> Result<Self> {
        let mut slots = Vec::with_capacity(extensions.len());
        for (declared, extension) in extensions.into_iter().enumerate() {
            let name = extension.descriptor().name;
            let mut slot = ExtensionSlot::new(extension, settings.extensions.get(&name))?;
            slot.declared = declared;
            slots.push(slot);
        }

        let mut configured: Vec<&String> = settings.extensions.keys().collect();
        configured.sort();
        if let Some(unknown) = configured.into_iter().find(|n| !slots.iter().any(|s| s.name() == n.as_str())) {
            return Err(Error::UnknownExtension(unknown.clone()));
        }

        resolve(&mut slots)?;
        Ok(Self {
            next_declared: slots.len(),
            slots,
        })
    }

    /// Add one extension and re-resolve the order. On error the registry is
    /// left as it was.
    pub fn insert(&mut self, mut slot: ExtensionSlot) -> Result<()> {
        slot.declared = self.next_declared;
        self.slots.push(slot);
        if let Err(err) = resolve(&mut self.slots) {
            // The new slot sorts last by declaration
            self.slots.pop();
            resolve(&mut self.slots)?;
            return Err(err);
        }
        self.next_declared += 1;
        Ok(())
    }

    /// Remove an extension no other extension depends on.
    pub fn remove(&mut self, name: &str) -> Result<ExtensionSlot> {
        let index = self
            .position(name)
            .ok_or_else(|| Error::UnknownExtension(name.to_string()))?;
        if let Some(dependent) = self.slots.iter().find(|s| s.name() != name && s.depends_on(name)) {
            return Err(Error::MissingDependency {
                extension: dependent.name().to_string(),
                dependency: name.to_string(),
            });
        }
        Ok(self.slots.remove(index))
    }

    /// Look up an extension by name.
    pub fn get(&self, name: &str) -> Option<&dyn Extension> {
        self.slot(name).map(ExtensionSlot::extension)
    }

    /// The first extension of concrete type `T`
    pub fn get_typed<T: Extension>(&self) -> Option<&T> {
        self.slots.iter().find_map(|slot| {
            let any: &dyn Any = slot.extension.as_ref();
            any.downcast_ref::<T>()
        })
    }

    pub fn slot(&self, name: &str) -> Option<&ExtensionSlot> {
        self.slots.iter().find(|s| s.name() == name)
    }

    pub fn slot_mut(&mut self, name: &str) -> Option<&mut ExtensionSlot> {
        self.slots.iter_mut().find(|s| s.name() == name)
    }

    /// Slots in resolved order
    pub fn slots(&self) -> &[ExtensionSlot] {
        &self.slots
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.name() == name)
    }

    /// Extension names in resolved order
    pub fn names(&self) -> Vec<String> {
        self.slots.iter().map(|s| s.name().to_string()).collect()
    }

    /// Check if an extension is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Number of registered extensions.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Hand every extension back, in resolved order
    pub fn into_extensions(self) -> Vec<Box<dyn Extension>> {
        self.slots.into_iter().map(ExtensionSlot::into_extension).collect()
    }
}

/// Put slots into declaration order, then into resolved order.
fn resolve(slots: &mut Vec<ExtensionSlot>) -> Result<()> {
    slots.sort_by_key(|s| s.declared);
    let entries: Vec<OrderEntry<'_>> = slots
        .iter()
        .map(|s| OrderEntry {
            name: s.name(),
            priority: s.priority,
            after: &s.descriptor.after,
            before: &s.descriptor.before,
            requires: &s.descriptor.requires,
        })
        .collect();
    let order = resolve_order(&entries)?;
    let mut taken: Vec<Option<ExtensionSlot>> = std::mem::take(slots).into_iter().map(Some).collect();
    *slots = order.iter().filter_map(|&i| taken[i].take()).collect();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Named(&'static str, Priority);

    impl Extension for Named {
        fn descriptor(&self) -> ExtensionDescriptor {
            ExtensionDescriptor::new(self.0).priority(self.1)
        }
    }

    struct Dependent;

    impl Extension for Dependent {
        fn descriptor(&self) -> ExtensionDescriptor {
            ExtensionDescriptor::new("dependent")
                .requires("base")
                .option("label", json!("x"))
        }
    }

    fn registry(extensions: Vec<Box<dyn Extension>>) -> Result<ExtensionRegistry> {
        ExtensionRegistry::from_extensions(extensions, &ManagerSettings::default())
    }

    #[test]
    fn test_new_registry_is_empty() {
        let registry = ExtensionRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_resolved_order_and_lookup() {
        let registry = registry(vec![
            Box::new(Named("late", Priority::LOW)),
            Box::new(Named("early", Priority::HIGH)),
        ])
        .unwrap();
        assert_eq!(registry.names(), vec!["early", "late"]);
        assert!(registry.contains("late"));
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.get_typed::<Named>().map(|n| n.0), Some("early"));
        assert!(registry.get_typed::<Dependent>().is_none());
    }

    #[test]
    fn test_settings_override_priority_and_options() {
        let settings = ManagerSettings::new()
            .with_priority("late", Priority::CRITICAL)
            .with_option("dependent", "label", json!("y"));
        let registry = ExtensionRegistry::from_extensions(
            vec![
                Box::new(Named("base", Priority::DEFAULT)),
                Box::new(Named("late", Priority::LOW)),
                Box::new(Dependent),
            ],
            &settings,
        )
        .unwrap();
        assert_eq!(registry.names(), vec!["late", "base", "dependent"]);
        let options = registry.slot("dependent").unwrap().options();
        assert_eq!(options.get_str("label"), Some("y"));
    }

    #[test]
    fn test_settings_for_unknown_extension() {
        let settings = ManagerSettings::new().with_priority("ghost", Priority::LOW);
        let err = ExtensionRegistry::from_extensions(vec![Box::new(Named("base", Priority::DEFAULT))], &settings)
            .err()
            .unwrap();
        assert!(matches!(err, Error::UnknownExtension(ref n) if n == "ghost"));
    }

    #[test]
    fn test_insert_keeps_registry_on_error() {
        let mut registry = registry(vec![Box::new(Named("base", Priority::DEFAULT))]).unwrap();
        let duplicate = ExtensionSlot::new(Box::new(Named("base", Priority::LOW)), None).unwrap();
        assert!(matches!(
            registry.insert(duplicate),
            Err(Error::DuplicateExtension { .. })
        ));
        assert_eq!(registry.names(), vec!["base"]);

        let extra = ExtensionSlot::new(Box::new(Named("extra", Priority::HIGH)), None).unwrap();
        registry.insert(extra).unwrap();
        assert_eq!(registry.names(), vec!["extra", "base"]);
    }

    #[test]
    fn test_remove_checks_dependents() {
        let mut registry = registry(vec![Box::new(Named("base", Priority::DEFAULT)), Box::new(Dependent)]).unwrap();
        assert!(matches!(
            registry.remove("base"),
            Err(Error::MissingDependency { ref extension, .. }) if extension == "dependent"
        ));
        let removed = registry.remove("dependent").unwrap();
        assert_eq!(removed.name(), "dependent");
        registry.remove("base").unwrap();
        assert!(registry.is_empty());
        assert!(matches!(registry.remove("base"), Err(Error::UnknownExtension(_))));
    }
}
