//! Record of modules registered at runtime.
//!
//! Each store owns one [`ModuleRegistry`]. It remembers which namespaces
//! were loaded (and with which caller config), the handler table of each
//! dynamic namespace, and the initial state it was seeded with. The reducer
//! falls back to it for namespaces the store was not built with.
//!
//! Handles are cheap clones of one shared record. Passing a clone to a second
//! store's builder makes the two stores share registrations.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::module::{ActionHandler, HandlerMap};


/// Caller-supplied registration config.
///
/// Serialized as `{"isLoaded": bool, ...}`. The registrar records
/// `{"isLoaded": true}` overlaid with whatever the caller passed. A store
/// never registers a namespace it already lists, whatever `is_loaded` says.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicModuleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_loaded: Option<bool>,
    /// Any other fields, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DynamicModuleConfig {
    pub fn new() -> Self {
        DynamicModuleConfig::default()
    }

    /// Add an extra field, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.is_loaded.unwrap_or(false)
    }

    /// The config recorded for a registration: loaded, unless the caller
    /// said otherwise.
    fn recorded(self) -> Self {
        DynamicModuleConfig {
            is_loaded: self.is_loaded.or(Some(true)),
            extra: self.extra,
        }
    }
}


/// What the registry held for one namespace before a registration touched it.
#[derive(Default)]
pub(crate) struct RegistryEntry {
    config: Option<DynamicModuleConfig>,
    actions: Option<HandlerMap>,
    state: Option<Value>,
}


#[derive(Default)]
struct RegistryInner {
    config: BTreeMap<String, DynamicModuleConfig>,
    actions: BTreeMap<String, HandlerMap>,
    state: BTreeMap<String, Value>,
}


/// Shared handle on a store's dynamic module record.
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    inner: Rc<RefCell<RegistryInner>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        ModuleRegistry::default()
    }

    /// True if `namespace` was registered and is marked loaded.
    pub fn is_loaded(&self, namespace: &str) -> bool {
        self.inner
            .borrow()
            .config
            .get(namespace)
            .is_some_and(DynamicModuleConfig::is_loaded)
    }

    /// Recorded config of `namespace`.
    pub fn config(&self, namespace: &str) -> Option<DynamicModuleConfig> {
        self.inner.borrow().config.get(namespace).cloned()
    }

    /// State `namespace` was seeded with.
    pub fn initial_state(&self, namespace: &str) -> Option<Value> {
        self.inner.borrow().state.get(namespace).cloned()
    }

    /// Namespaces with a recorded config, in name order.
    pub fn namespaces(&self) -> Vec<String> {
        self.inner.borrow().config.keys().cloned().collect()
    }

    /// Handler table of `namespace`, if one is installed.
    ///
    /// `None` means the namespace is unknown here; `Some(None)` means it is
    /// known but has no handler named `target`.
    pub fn handler(&self, namespace: &str, target: &str) -> Option<Option<ActionHandler>> {
        self.inner
            .borrow()
            .actions
            .get(namespace)
            .map(|handlers| handlers.get(target).cloned())
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().config.is_empty()
    }

    /// Forget every registration.
    pub fn clear(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.config.clear();
        inner.actions.clear();
        inner.state.clear();
    }

    pub(crate) fn mark_loaded(&self, namespace: &str, config: DynamicModuleConfig) {
        self.inner
            .borrow_mut()
            .config
            .insert(namespace.to_string(), config.recorded());
    }

    pub(crate) fn install(&self, namespace: &str, actions: HandlerMap, state: Value) {
        let mut inner = self.inner.borrow_mut();
        inner.actions.insert(namespace.to_string(), actions);
        inner.state.insert(namespace.to_string(), state);
    }

    /// Copy of everything recorded for `namespace`.
    pub(crate) fn entry(&self, namespace: &str) -> RegistryEntry {
        let inner = self.inner.borrow();
        RegistryEntry {
            config: inner.config.get(namespace).cloned(),
            actions: inner.actions.get(namespace).cloned(),
            state: inner.state.get(namespace).cloned(),
        }
    }

    /// Put `namespace` back the way `entry` recorded it.
    pub(crate) fn restore(&self, namespace: &str, entry: RegistryEntry) {
        let mut inner = self.inner.borrow_mut();
        restore_key(&mut inner.config, namespace, entry.config);
        restore_key(&mut inner.actions, namespace, entry.actions);
        restore_key(&mut inner.state, namespace, entry.state);
    }
}

fn restore_key<T>(map: &mut BTreeMap<String, T>, key: &str, value: Option<T>) {
    match value {
        Some(value) => {
            map.insert(key.to_string(), value);
        }
        None => {
            map.remove(key);
        }
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ModuleRegistry")
            .field("config", &inner.config)
            .field("actions", &inner.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}
