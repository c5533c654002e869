//! Folding module declarations into merged handler, getter and state tables.

use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::{Map, Value};
use tracing::warn;

use super::{ActionHandler, HandlerMap, Module};
use crate::error::StoreError;
use crate::getters::{memoize, GetterSet};


/// Handler tables of a store: root handlers plus one table per namespace.
#[derive(Clone, Default)]
pub struct ActionSet {
    pub root: HandlerMap,
    pub namespaces: BTreeMap<String, HandlerMap>,
}

impl ActionSet {
    /// Handler table of `namespace`.
    pub fn namespace(&self, namespace: &str) -> Option<&HandlerMap> {
        self.namespaces.get(namespace)
    }

    /// Root handler named `target`.
    pub fn root_handler(&self, target: &str) -> Option<ActionHandler> {
        self.root.get(target).cloned()
    }
}


/// The merged result of a list of modules.
#[derive(Default)]
pub struct NormalizedModuleSet {
    /// Namespaced namespaces in declaration order, without duplicates.
    pub namespaces: Vec<String>,
    /// Initial state tree.
    pub state: Map<String, Value>,
    pub actions: ActionSet,
    pub getters: GetterSet,
    /// Indices of declarations that were dropped.
    pub discarded: Vec<usize>,
}

impl NormalizedModuleSet {
    /// Merge the root module underneath the modules: module entries win on
    /// collision, as if the modules were spread over the root.
    pub fn merge_root(&mut self, root: &Module) -> Result<(), StoreError> {
        match &root.state {
            Value::Object(fields) => {
                for (key, value) in fields {
                    self.state.entry(key.clone()).or_insert_with(|| value.clone());
                }
            }
            Value::Null => {}
            other => return Err(StoreError::InvalidRootState(value_kind(other))),
        }
        for (name, handler) in &root.actions {
            self.actions
                .root
                .entry(name.clone())
                .or_insert_with(|| Rc::clone(handler));
        }
        for (name, getter) in memoize(&root.getters) {
            self.getters.root.entry(name).or_insert(getter);
        }
        Ok(())
    }

    fn absorb(&mut self, index: usize, module: &Module) {
        let namespace = module.namespace_name();

        if module.namespaced {
            let Some(ns) = namespace else {
                warn!(index, "namespaced module does not declare a namespace; discarding it");
                self.discarded.push(index);
                return;
            };
            self.actions
                .namespaces
                .insert(ns.to_string(), module.actions.clone());
            self.getters.install(ns, memoize(&module.getters));
            self.state.insert(ns.to_string(), module.state.clone());
            if !self.namespaces.iter().any(|existing| existing == ns) {
                self.namespaces.push(ns.to_string());
            }
            return;
        }

        for (name, handler) in &module.actions {
            self.actions.root.insert(name.clone(), Rc::clone(handler));
        }
        self.getters.root.extend(memoize(&module.getters));

        match (namespace, &module.state) {
            (Some(ns), state) => {
                self.state.insert(ns.to_string(), state.clone());
            }
            (None, Value::Object(fields)) => {
                self.state
                    .extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            (None, Value::Null) => {}
            (None, other) => warn!(
                index,
                kind = value_kind(other),
                "un-namespaced module state is not an object; ignoring it"
            ),
        }
    }
}


/// Fold `modules` into one [`NormalizedModuleSet`].
///
/// Namespaced modules without a namespace are dropped with a warning.
/// Un-namespaced handlers and getters merge last-write-wins.
pub fn normalize_modules(modules: &[Module]) -> NormalizedModuleSet {
    let mut set = NormalizedModuleSet::default();
    for (index, module) in modules.iter().enumerate() {
        set.absorb(index, module);
    }
    set
}


pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
