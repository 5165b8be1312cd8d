//! The extension manager.
//!
//! [`RemirrorManager`] owns a set of extensions and composes them into one
//! editor: it resolves their order, assembles the schema, aggregates
//! commands, helpers, key bindings, rules and plugins, and drives the
//! lifecycle
//!
//! ```text
//! Idle -> SchemaBound -> ViewAttached -> Destroyed
//! ```
//!
//! where `destroy` is allowed from every phase. All operations are
//! synchronous and single threaded. Operations that may dispatch are
//! guarded against re-entrant calls; a nested call fails with
//! [`Error::Reentrant`] instead of being queued.

use std::cell::{Cell, Ref, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use remirror_model::{
    Dispatch, EditorState, EditorView, KeyEvent, Node, Plugin, Schema, Transaction,
};
use serde_json::{Map, Value};

use crate::commands::{Chain, ChainMode, CommandSpec, CommandRegistry, HelperSpec, run_on_state};
use crate::content::{Content, ContentError};
use crate::deferred::{AnchorTable, DeferredAnchor, DeferredOutcome};
use crate::error::{Error, Result};
use crate::events::{EventBus, ManagerEvent, SubscriptionId};
use crate::extension::{Extension, ExtensionKind};
use crate::keymap::{KeyBinding, KeymapPlugin};
use crate::options::{HandlerId, Options};
use crate::registry::{ExtensionRegistry, ExtensionSlot};
use crate::rules::{InputRule, InputRulesPlugin, PasteRule, PasteRulesPlugin};
use crate::schema::{SchemaContribution, assemble_schema};
use crate::settings::ManagerSettings;

/// Lifecycle phase of a manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Constructed; extensions registered but not bound to a schema
    Idle,
    /// Schema, commands and initial state derived; no view yet
    SchemaBound,
    /// A view receives every applied state
    ViewAttached,
    /// Terminal
    Destroyed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::SchemaBound => "schema-bound",
            Phase::ViewAttached => "view-attached",
            Phase::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// Runtime contributions of one extension, derived against the schema
#[derive(Clone, Default)]
struct Contribution {
    commands: Vec<CommandSpec>,
    helpers: Vec<HelperSpec>,
    keymap: Vec<KeyBinding>,
    input_rules: Vec<InputRule>,
    paste_rules: Vec<PasteRule>,
    plugins: Vec<Rc<dyn Plugin>>,
}

impl Contribution {
    fn derive(slot: &ExtensionSlot, schema: &Arc<Schema>) -> Self {
        let cx = slot.context(Some(schema));
        let extension = slot.extension();
        let mut plugins: Vec<Rc<dyn Plugin>> = extension.plugin(&cx).into_iter().collect();
        plugins.extend(extension.external_plugins(&cx));
        tracing::debug!(extension = slot.name(), "Derived runtime contributions");
        Self {
            commands: extension.commands(&cx),
            helpers: extension.helpers(&cx),
            keymap: extension.keymap(&cx),
            input_rules: extension.input_rules(&cx),
            paste_rules: extension.paste_rules(&cx),
            plugins,
        }
    }
}

/// The merged surface handed to the editor state
#[derive(Clone, Default)]
struct Runtime {
    commands: CommandRegistry,
    plugins: Vec<Rc<dyn Plugin>>,
}

/// Merge contributions in extension order. The keymap plugin goes first,
/// then the rule plugins, then each extension's own plugins.
fn merge(
    registry: &ExtensionRegistry,
    contributions: &HashMap<String, Contribution>,
    settings: &ManagerSettings,
) -> Result<Runtime> {
    let mut commands = CommandRegistry::new();
    let mut keymaps = Vec::new();
    let mut input_rules = Vec::new();
    let mut paste_rules = Vec::new();
    let mut extension_plugins = Vec::new();

    for slot in registry.slots() {
        let Some(contribution) = contributions.get(slot.name()) else {
            continue;
        };
        let owner = slot.name().to_string();
        commands.add_commands(&owner, contribution.commands.clone())?;
        commands.add_helpers(&owner, contribution.helpers.clone())?;
        keymaps.push((owner.clone(), contribution.keymap.clone()));
        input_rules.push((owner.clone(), contribution.input_rules.clone()));
        paste_rules.push((owner, contribution.paste_rules.clone()));
        extension_plugins.extend(contribution.plugins.iter().cloned());
    }

    let mut plugins: Vec<Rc<dyn Plugin>> = vec![
        Rc::new(KeymapPlugin::merge(keymaps, settings.keymap_platform)?),
        Rc::new(InputRulesPlugin::new(input_rules)?),
        Rc::new(PasteRulesPlugin::new(paste_rules)?),
    ];
    plugins.extend(extension_plugins);
    tracing::debug!(
        commands = commands.command_names().len(),
        plugins = plugins.len(),
        "Merged runtime surface"
    );
    Ok(Runtime { commands, plugins })
}

/// Whether adding or removing the extension would change the schema
fn shapes_schema(slot: &ExtensionSlot) -> bool {
    slot.kind() != ExtensionKind::Plain
        || !slot.extension().extra_attributes(&slot.context(None)).is_empty()
}

fn build_schema(registry: &ExtensionRegistry, settings: &ManagerSettings) -> Result<Arc<Schema>> {
    let contributions: Vec<SchemaContribution<'_>> = registry
        .slots()
        .iter()
        .map(|slot| {
            let cx = slot.context(None);
            let extension = slot.extension();
            SchemaContribution {
                extension: slot.name(),
                priority: slot.priority(),
                tags: slot.tags(),
                node: extension.as_node().map(|n| (n.node_name(&cx), n.node_spec(&cx))),
                mark: extension.as_mark().map(|m| (m.mark_name(&cx), m.mark_spec(&cx))),
                extra_attributes: extension.extra_attributes(&cx),
            }
        })
        .collect();
    Ok(Arc::new(assemble_schema(contributions, &settings.extra_attributes)?))
}

/// Assemble the schema and derive every extension's runtime contributions
fn bind(
    registry: &ExtensionRegistry,
    settings: &ManagerSettings,
) -> Result<(Arc<Schema>, HashMap<String, Contribution>, Runtime)> {
    let schema = build_schema(registry, settings)?;
    let contributions: HashMap<String, Contribution> = registry
        .slots()
        .iter()
        .map(|slot| (slot.name().to_string(), Contribution::derive(slot, &schema)))
        .collect();
    let runtime = merge(registry, &contributions, settings)?;
    Ok((schema, contributions, runtime))
}

struct Inner {
    phase: Phase,
    registry: ExtensionRegistry,
    schema: Option<Arc<Schema>>,
    contributions: HashMap<String, Contribution>,
    runtime: Runtime,
    state: Option<EditorState>,
    view: Option<Box<dyn EditorView>>,
    /// `on_create` ran for the registered extensions
    created: bool,
}

impl Inner {
    fn expect_phase(&self, expected: Phase, to: Phase) -> Result<()> {
        match self.phase {
            Phase::Destroyed => Err(Error::ManagerDestroyed),
            phase if phase == expected => Ok(()),
            from => Err(Error::InvalidTransition { from, to }),
        }
    }

    /// Re-derive one extension's contributions and install the merged
    /// result. Does nothing before the schema exists.
    fn rederive(&mut self, name: &str, settings: &ManagerSettings) -> Result<()> {
        let Some(schema) = self.schema.clone() else {
            return Ok(());
        };
        let slot = self
            .registry
            .slot(name)
            .ok_or_else(|| Error::UnknownExtension(name.to_string()))?;
        let mut contributions = self.contributions.clone();
        contributions.insert(name.to_string(), Contribution::derive(slot, &schema));
        let runtime = merge(&self.registry, &contributions, settings)?;
        self.install(contributions, runtime);
        Ok(())
    }

    /// Swap in a new runtime. The view is not told; callers follow up with
    /// [`RemirrorManager::refresh_view`] once the borrow is released.
    fn install(&mut self, contributions: HashMap<String, Contribution>, runtime: Runtime) {
        if let Some(state) = self.state.as_mut() {
            *state = state.reconfigure(runtime.plugins.clone());
        }
        self.contributions = contributions;
        self.runtime = runtime;
    }
}

/// Resets the busy flag when the guarded operation ends
pub(crate) struct BusyGuard<'a>(&'a Cell<bool>);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Composes extensions into one editor and exposes its commands, helpers,
/// schema and plugins.
pub struct RemirrorManager {
    inner: RefCell<Inner>,
    busy: Cell<bool>,
    events: EventBus,
    anchors: Rc<RefCell<AnchorTable>>,
    settings: ManagerSettings,
}

impl fmt::Debug for RemirrorManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("RemirrorManager")
            .field("phase", &inner.phase)
            .field("extensions", &inner.registry.names())
            .field("settings", &self.settings)
            .finish()
    }
}

impl RemirrorManager {
    /// Take ownership of `extensions` and resolve their order.
    ///
    /// # Errors
    ///
    /// Fails on invalid descriptors, duplicate names, missing dependencies,
    /// ordering violations and settings that name unknown extensions or
    /// options.
    pub fn create(extensions: Vec<Box<dyn Extension>>, settings: ManagerSettings) -> Result<Self> {
        let registry = ExtensionRegistry::from_extensions(extensions, &settings)?;
        tracing::info!(extensions = registry.len(), "Created manager");
        Ok(Self {
            inner: RefCell::new(Inner {
                phase: Phase::Idle,
                registry,
                schema: None,
                contributions: HashMap::new(),
                runtime: Runtime::default(),
                state: None,
                view: None,
                created: false,
            }),
            busy: Cell::new(false),
            events: EventBus::default(),
            anchors: Rc::new(RefCell::new(AnchorTable::default())),
            settings,
        })
    }

    /// Assemble the schema, bind every extension to it and create the
    /// initial editor state with an empty document.
    ///
    /// # Errors
    ///
    /// Any assembly error destroys the manager. No `on_create` hook runs in
    /// that case.
    pub fn initialize(&self) -> Result<()> {
        self.initialize_inner(None)
    }

    /// [`initialize`](Self::initialize) with initial content. Content that
    /// does not fit the schema goes through the `on_error` handler.
    pub fn initialize_with_content(&self, content: impl Into<Content>) -> Result<()> {
        self.initialize_inner(Some(content.into()))
    }

    fn initialize_inner(&self, content: Option<Content>) -> Result<()> {
        let _busy = self.enter()?;
        let built = {
            let inner = self.inner.borrow();
            inner.expect_phase(Phase::Idle, Phase::SchemaBound)?;
            bind(&inner.registry, &self.settings)
        };
        // Content errors reach `on_error` without the manager borrowed
        let bound = built.and_then(|(schema, contributions, runtime)| {
            let doc = match &content {
                Some(content) => self.resolve_content(content, &schema)?,
                None => schema.empty_doc()?,
            };
            let state = EditorState::create(Arc::clone(&schema), Some(doc), runtime.plugins.clone())?;
            Ok((schema, contributions, runtime, state))
        });

        {
            let mut inner = self.inner.borrow_mut();
            match bound {
                Ok((schema, contributions, runtime, state)) => {
                    inner.schema = Some(schema);
                    inner.contributions = contributions;
                    inner.runtime = runtime;
                    inner.state = Some(state);
                    inner.phase = Phase::SchemaBound;
                    inner.created = true;
                }
                Err(err) => {
                    inner.phase = Phase::Destroyed;
                    tracing::error!(error = %err, "Manager initialization failed");
                    return Err(err);
                }
            }
        }

        {
            let inner = self.inner.borrow();
            for slot in inner.registry.slots() {
                slot.extension().on_create(&slot.context(inner.schema.as_ref()));
            }
        }
        tracing::info!(phase = %Phase::SchemaBound, "Initialized manager");
        self.events.emit(ManagerEvent::SchemaChanged);
        self.events.emit(ManagerEvent::StateCreated);
        Ok(())
    }

    /// Bind a live view. It is shown the current state right away.
    pub fn attach_view(&self, view: Box<dyn EditorView>) -> Result<()> {
        let _busy = self.enter()?;
        {
            let mut inner = self.inner.borrow_mut();
            inner.expect_phase(Phase::SchemaBound, Phase::ViewAttached)?;
            inner.view = Some(view);
            inner.phase = Phase::ViewAttached;
        }
        self.refresh_view();
        {
            let inner = self.inner.borrow();
            if let Some(view) = inner.view.as_deref() {
                for slot in inner.registry.slots() {
                    slot.extension().on_view(&slot.context(inner.schema.as_ref()), view);
                }
            }
        }
        tracing::info!(phase = %Phase::ViewAttached, "Attached view");
        self.events.emit(ManagerEvent::ViewAttached);
        Ok(())
    }

    /// Tear down: `on_destroy` runs in reverse extension order, the view is
    /// destroyed and pending deferred mutations are dropped. Destroying
    /// twice is a no-op.
    pub fn destroy(&self) -> Result<()> {
        if self.phase() == Phase::Destroyed {
            return Ok(());
        }
        let _busy = self.enter()?;
        {
            let inner = self.inner.borrow();
            if inner.created {
                for slot in inner.registry.slots().iter().rev() {
                    slot.extension().on_destroy(&slot.context(inner.schema.as_ref()));
                }
            }
        }
        let view = {
            let mut inner = self.inner.borrow_mut();
            inner.phase = Phase::Destroyed;
            inner.view.take()
        };
        if let Some(mut view) = view {
            view.destroy();
        }
        self.anchors.borrow_mut().clear();
        tracing::info!(phase = %Phase::Destroyed, "Destroyed manager");
        self.events.emit(ManagerEvent::Destroyed);
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.inner.borrow().phase
    }

    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    /// The current editor state
    pub fn state(&self) -> Result<EditorState> {
        self.current_state()
    }

    pub fn schema(&self) -> Result<Arc<Schema>> {
        let inner = self.inner.borrow();
        if inner.phase == Phase::Destroyed {
            return Err(Error::ManagerDestroyed);
        }
        inner.schema.clone().ok_or(Error::NotInitialized)
    }

    /// Plugins in the order the editor state runs them
    pub fn plugins(&self) -> Result<Vec<Rc<dyn Plugin>>> {
        Ok(self.current_state()?.plugins().to_vec())
    }

    /// Extension names in resolved order
    pub fn extension_names(&self) -> Vec<String> {
        self.inner.borrow().registry.names()
    }

    /// Borrow a registered extension by its concrete type
    pub fn extension<T: Extension>(&self) -> Option<Ref<'_, T>> {
        Ref::filter_map(self.inner.borrow(), |inner| inner.registry.get_typed::<T>()).ok()
    }

    /// Current options of an extension
    pub fn options(&self, extension: &str) -> Result<Options> {
        let inner = self.inner.borrow();
        inner
            .registry
            .slot(extension)
            .map(|slot| slot.options().clone())
            .ok_or_else(|| Error::UnknownExtension(extension.to_string()))
    }

    /// Update dynamic options of an extension. Returns the keys whose values
    /// changed. Once the schema exists the extension's runtime
    /// contributions are re-derived and the plugin list reconfigured.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownOption`] for keys the extension does not declare
    /// - [`Error::StaticOptionWhileAttached`] when a static option would
    ///   change after initialization
    /// - [`Error::Json`] when `update` is not an object
    pub fn set_options(&self, extension: &str, update: Value) -> Result<Vec<String>> {
        let _busy = self.enter()?;
        let update: Map<String, Value> = serde_json::from_value(update)?;
        let changed = {
            let mut inner = self.inner.borrow_mut();
            let phase = inner.phase;
            let slot = inner
                .registry
                .slot_mut(extension)
                .ok_or_else(|| Error::UnknownExtension(extension.to_string()))?;
            let changed = slot.options().changed_keys(&update)?;
            if phase != Phase::Idle
                && let Some(key) = changed.iter().find(|k| slot.options().is_static(k))
            {
                return Err(Error::StaticOptionWhileAttached {
                    extension: extension.to_string(),
                    option: key.clone(),
                });
            }
            if changed.is_empty() {
                return Ok(changed);
            }
            let previous = slot.options().clone();
            slot.options_mut().update(&update)?;

            if let Err(err) = inner.rederive(extension, &self.settings) {
                if let Some(slot) = inner.registry.slot_mut(extension) {
                    *slot.options_mut() = previous;
                }
                return Err(err);
            }
            changed
        };
        self.refresh_view();
        tracing::debug!(extension, ?changed, "Updated options");

        let bound = {
            let inner = self.inner.borrow();
            if let Some(slot) = inner.registry.slot(extension) {
                slot.extension()
                    .on_options_changed(&slot.context(inner.schema.as_ref()), &changed);
            }
            inner.schema.is_some()
        };
        if bound {
            self.events.emit(ManagerEvent::PluginsReconfigured);
        }
        Ok(changed)
    }

    /// Register an extension with the manager. After initialization only
    /// extensions that leave the schema alone can be added; they are
    /// created (and shown the view) immediately.
    pub fn add_extension(&self, extension: Box<dyn Extension>) -> Result<()> {
        let _busy = self.enter()?;
        let name = extension.descriptor().name;
        let slot = ExtensionSlot::new(extension, self.settings.extensions.get(&name))?;
        {
            let mut inner = self.inner.borrow_mut();
            if inner.schema.is_none() {
                inner.registry.insert(slot)?;
                tracing::debug!(extension = %name, "Registered extension");
                return Ok(());
            }
            if shapes_schema(&slot) {
                return Err(Error::SchemaReconfiguration { extension: name });
            }
            inner.registry.insert(slot)?;
            if let Err(err) = inner.rederive(&name, &self.settings) {
                if let Err(rollback) = inner.registry.remove(&name) {
                    tracing::error!(
                        extension = %name,
                        error = %err,
                        rollback = %rollback,
                        "Could not unregister extension after a failed add"
                    );
                    return Err(rollback);
                }
                return Err(err);
            }
        }
        self.refresh_view();

        {
            let inner = self.inner.borrow();
            if let Some(slot) = inner.registry.slot(&name) {
                let cx = slot.context(inner.schema.as_ref());
                slot.extension().on_create(&cx);
                if let Some(view) = inner.view.as_deref() {
                    slot.extension().on_view(&cx, view);
                }
            }
        }
        tracing::info!(extension = %name, "Added extension");
        self.events.emit(ManagerEvent::PluginsReconfigured);
        Ok(())
    }

    /// Unregister an extension and hand it back. After initialization only
    /// extensions that leave the schema alone can be removed; they get
    /// `on_destroy` first.
    pub fn remove_extension(&self, name: &str) -> Result<Box<dyn Extension>> {
        let _busy = self.enter()?;
        let removed = {
            let mut inner = self.inner.borrow_mut();
            let slot = inner
                .registry
                .slot(name)
                .ok_or_else(|| Error::UnknownExtension(name.to_string()))?;
            if inner.schema.is_none() {
                return inner.registry.remove(name).map(ExtensionSlot::into_extension);
            }
            if shapes_schema(slot) {
                return Err(Error::SchemaReconfiguration {
                    extension: name.to_string(),
                });
            }
            let removed = inner.registry.remove(name)?;
            let mut contributions = inner.contributions.clone();
            contributions.remove(name);
            let runtime = match merge(&inner.registry, &contributions, &self.settings) {
                Ok(runtime) => runtime,
                Err(err) => {
                    inner.registry.insert(removed)?;
                    return Err(err);
                }
            };
            inner.install(contributions, runtime);
            removed
        };
        self.refresh_view();

        let schema = self.inner.borrow().schema.clone();
        removed.extension().on_destroy(&removed.context(schema.as_ref()));
        tracing::info!(extension = name, "Removed extension");
        self.events.emit(ManagerEvent::PluginsReconfigured);
        Ok(removed.into_extension())
    }

    /// Register a callback for one of an extension's handler keys
    pub fn add_handler(
        &self,
        extension: &str,
        key: &str,
        handler: impl Fn(&Value) + 'static,
    ) -> Result<HandlerId> {
        let mut inner = self.inner.borrow_mut();
        let slot = inner
            .registry
            .slot_mut(extension)
            .ok_or_else(|| Error::UnknownExtension(extension.to_string()))?;
        slot.options_mut().add_handler(key, Rc::new(handler))
    }

    pub fn remove_handler(&self, extension: &str, id: HandlerId) -> Result<bool> {
        let mut inner = self.inner.borrow_mut();
        let slot = inner
            .registry
            .slot_mut(extension)
            .ok_or_else(|| Error::UnknownExtension(extension.to_string()))?;
        Ok(slot.options_mut().remove_handler(id))
    }

    /// Call the handlers registered for an extension's handler key. Returns
    /// how many ran.
    pub fn emit_handler(&self, extension: &str, key: &str, payload: &Value) -> Result<usize> {
        // Handlers run without the manager borrowed
        let options = self.options(extension)?;
        options.emit(key, payload)
    }

    pub fn subscribe(&self, listener: impl FnMut(&ManagerEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Handle onto a named command
    pub fn command(&self, name: &str) -> CommandHandle<'_> {
        CommandHandle {
            manager: self,
            name: name.to_string(),
        }
    }

    /// Run a command and dispatch its transaction if it applied.
    ///
    /// `Ok(false)` means the command was not applicable; nothing was
    /// dispatched and the document is unchanged.
    pub fn run_command(&self, name: &str, args: Value) -> Result<bool> {
        let _busy = self.enter()?;
        let state = self.current_state()?;
        let command = self.command_spec(name)?;
        match run_on_state(&command, &state, &args, true) {
            Some(tr) => self.dispatch_entered(tr),
            None => {
                tracing::debug!(command = name, "Command not applicable");
                Ok(false)
            }
        }
    }

    /// Start a chain in the configured default mode
    pub fn chain(&self) -> Chain<'_> {
        let mode = if self.settings.strict_chains {
            ChainMode::Strict
        } else {
            ChainMode::NonStrict
        };
        Chain::new(self, mode)
    }

    /// Run a read-only helper
    pub fn helper(&self, name: &str, args: Value) -> Result<Value> {
        let state = self.current_state()?;
        let helper = self
            .inner
            .borrow()
            .runtime
            .commands
            .helper(name)
            .cloned()
            .ok_or_else(|| Error::UnknownHelper(name.to_string()))?;
        Ok((helper.run)(&state, &args))
    }

    /// Command names, sorted
    pub fn command_names(&self) -> Vec<String> {
        self.inner.borrow().runtime.commands.command_names()
    }

    /// Helper names, sorted
    pub fn helper_names(&self) -> Vec<String> {
        self.inner.borrow().runtime.commands.helper_names()
    }

    /// Extension that contributed a command
    pub fn command_owner(&self, name: &str) -> Option<String> {
        self.inner
            .borrow()
            .runtime
            .commands
            .command_owner(name)
            .map(str::to_string)
    }

    /// Offer a key press to the plugins. Returns whether one handled it.
    pub fn handle_key(&self, event: &KeyEvent) -> Result<bool> {
        let _busy = self.enter()?;
        let state = self.current_state()?;
        self.run_plugin_handlers(&state, |plugin, state, dispatch| {
            plugin.handle_key_down(state, event, dispatch)
        })
    }

    /// Type text over the selection. Input rules get the first chance;
    /// otherwise the text is inserted as is.
    pub fn insert_text(&self, text: &str) -> Result<()> {
        let _busy = self.enter()?;
        let state = self.current_state()?;
        let selection = state.selection();
        let (from, to) = (selection.from(), selection.to());
        let handled = self.run_plugin_handlers(&state, |plugin, state, dispatch| {
            plugin.handle_text_input(state, from, to, text, dispatch)
        })?;
        if !handled {
            let mut tr = state.tr();
            tr.insert_text(text, from, to)?;
            self.dispatch_entered(tr)?;
        }
        Ok(())
    }

    /// Paste plain text over the selection, running paste rules
    pub fn paste_text(&self, text: &str) -> Result<()> {
        let _busy = self.enter()?;
        let state = self.current_state()?;
        let handled = self.run_plugin_handlers(&state, |plugin, state, dispatch| {
            plugin.handle_paste(state, text, dispatch)
        })?;
        if !handled {
            let mut tr = state.tr();
            tr.replace_selection_with_text(text)?;
            self.dispatch_entered(tr)?;
        }
        Ok(())
    }

    /// Replace the document. Content that does not fit the schema goes
    /// through the `on_error` handler, falling back to an empty document.
    pub fn set_content(&self, content: impl Into<Content>) -> Result<()> {
        let _busy = self.enter()?;
        let state = self.current_state()?;
        let doc = self.resolve_content(&content.into(), state.schema())?;
        let mut tr = state.tr();
        tr.replace_doc(doc)?;
        self.dispatch_entered(tr)?;
        Ok(())
    }

    /// Dispatch a transaction built from the current state
    pub fn dispatch(&self, tr: Transaction) -> Result<bool> {
        let _busy = self.enter()?;
        self.dispatch_entered(tr)
    }

    /// Track `pos` through later transactions for a mutation that completes
    /// asynchronously
    pub fn defer(&self, pos: usize) -> Result<DeferredAnchor> {
        let state = self.current_state()?;
        let size = state.doc().content_size();
        if pos > size {
            return Err(remirror_model::Error::PositionOutOfRange { pos, size }.into());
        }
        Ok(AnchorTable::insert(&self.anchors, pos))
    }

    /// Deferred mutations that are still pending
    pub fn pending_deferred(&self) -> usize {
        self.anchors.borrow().len()
    }

    /// Complete a deferred mutation in a fresh transaction at the anchor's
    /// current position. Nothing is dispatched when the anchor's content
    /// was deleted or `apply` declines.
    pub fn resolve_deferred(
        &self,
        anchor: DeferredAnchor,
        apply: impl FnOnce(&mut Transaction, usize) -> bool,
    ) -> Result<DeferredOutcome> {
        let _busy = self.enter()?;
        let state = self.current_state()?;
        let position = if anchor.belongs_to(&self.anchors) {
            anchor.position()
        } else {
            None
        };
        drop(anchor);

        let Some(pos) = position else {
            tracing::warn!("Dropped deferred mutation: its anchor no longer exists");
            return Ok(DeferredOutcome::Dropped);
        };
        let mut tr = state.tr();
        if !apply(&mut tr, pos) {
            tracing::debug!(pos, "Deferred mutation declined");
            return Ok(DeferredOutcome::Rejected);
        }
        self.dispatch_entered(tr)?;
        Ok(DeferredOutcome::Applied { pos })
    }

    /// Claim the manager for a mutating operation
    pub(crate) fn enter(&self) -> Result<BusyGuard<'_>> {
        if self.busy.get() {
            return Err(Error::Reentrant);
        }
        let phase = self.inner.try_borrow().map_err(|_| Error::Reentrant)?.phase;
        if phase == Phase::Destroyed {
            return Err(Error::ManagerDestroyed);
        }
        self.busy.set(true);
        Ok(BusyGuard(&self.busy))
    }

    /// Show the view the current state. The view is taken out while it
    /// runs, so it may call back into the manager.
    fn refresh_view(&self) {
        let (view, state) = {
            let mut inner = self.inner.borrow_mut();
            (inner.view.take(), inner.state.clone())
        };
        let Some(mut view) = view else {
            return;
        };
        if let Some(state) = &state {
            view.update_state(state);
        }
        self.inner.borrow_mut().view = Some(view);
    }

    pub(crate) fn current_state(&self) -> Result<EditorState> {
        let inner = self.inner.borrow();
        if inner.phase == Phase::Destroyed {
            return Err(Error::ManagerDestroyed);
        }
        inner.state.clone().ok_or(Error::NotInitialized)
    }

    pub(crate) fn command_spec(&self, name: &str) -> Result<CommandSpec> {
        self.inner
            .borrow()
            .runtime
            .commands
            .command(name)
            .cloned()
            .ok_or_else(|| Error::UnknownCommand(name.to_string()))
    }

    /// Apply a transaction through the plugins, map deferred anchors and
    /// update the view. Returns `false` when a plugin filtered it out.
    pub(crate) fn dispatch_entered(&self, tr: Transaction) -> Result<bool> {
        let state = self.current_state()?;
        let applied = state.apply_transaction(tr)?;
        if applied.transactions.is_empty() {
            tracing::debug!("Transaction filtered out");
            return Ok(false);
        }
        let doc_changed = applied.transactions.iter().any(Transaction::doc_changed);
        {
            let mut anchors = self.anchors.borrow_mut();
            for tr in &applied.transactions {
                anchors.map(tr.mapping());
            }
        }
        self.inner.borrow_mut().state = Some(applied.state);
        self.refresh_view();
        tracing::debug!(
            doc_changed,
            transactions = applied.transactions.len(),
            "Dispatched transaction"
        );
        self.events.emit(ManagerEvent::TransactionApplied { doc_changed });
        Ok(true)
    }

    /// Offer an event to each plugin in order and dispatch what the first
    /// one to handle it produced
    fn run_plugin_handlers(
        &self,
        state: &EditorState,
        mut handler: impl FnMut(&dyn Plugin, &EditorState, Dispatch<'_>) -> bool,
    ) -> Result<bool> {
        for plugin in state.plugins() {
            let mut produced = Vec::new();
            if handler(plugin.as_ref(), state, &mut |tr| produced.push(tr)) {
                tracing::debug!(plugin = plugin.key(), "Plugin handled event");
                for tr in produced {
                    self.dispatch_entered(tr)?;
                }
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn resolve_content(&self, content: &Content, schema: &Arc<Schema>) -> Result<Node> {
        let error = match content.to_doc(schema) {
            Ok(doc) => return Ok(doc),
            Err(error) => error,
        };
        tracing::warn!(error = %error, "Content does not fit the schema");
        let report = ContentError {
            error,
            content: content.describe(),
            schema: Arc::clone(schema),
        };
        if let Some(on_error) = &self.settings.on_error
            && let Some(replacement) = on_error(&report)
        {
            match Content::Doc(replacement).to_doc(schema) {
                Ok(doc) => return Ok(doc),
                Err(err) => {
                    tracing::warn!(error = %err, "Replacement content does not fit the schema either");
                }
            }
        }
        Ok(schema.empty_doc()?)
    }
}

/// A named command bound to a manager.
#[derive(Debug, Clone)]
pub struct CommandHandle<'m> {
    manager: &'m RemirrorManager,
    name: String,
}

impl CommandHandle<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run and dispatch; `Ok(false)` when not applicable
    pub fn run(&self, args: Value) -> Result<bool> {
        self.manager.run_command(&self.name, args)
    }

    /// Dry run without dispatching
    pub fn enabled(&self, args: Value) -> Result<bool> {
        let _busy = self.manager.enter()?;
        let state = self.manager.current_state()?;
        let command = self.manager.command_spec(&self.name)?;
        Ok(run_on_state(&command, &state, &args, false).is_some())
    }

    /// Activation state of a toggle-style command; `None` when the command
    /// has no activation query
    pub fn active(&self, args: Value) -> Result<Option<bool>> {
        let state = self.manager.current_state()?;
        let command = self.manager.command_spec(&self.name)?;
        Ok(command.active.map(|active| active(&state, &args)))
    }
}
