//! Getters: derived values computed from the state tree.
//!
//! Every getter is wrapped in a [`MemoGetter`] that remembers its last result
//! per state reference. Consumers read getters through a [`GetterView`]: a
//! read-only handle exposing root getters directly and each namespace's
//! getters through a lazily created, cached, revocable sub-view.

use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::Value;

pub mod memo;
pub mod view;

pub use memo::MemoGetter;
pub use view::{GetterView, Read, StateSource, ViewCache};

/// Signature of a getter: `(state or slice, getter view) -> value`.
pub type GetterFn = dyn Fn(&Value, &GetterView) -> Value;

/// A shared getter function.
pub type Getter = Rc<GetterFn>;

/// Memoized getters of one scope, keyed by name.
pub type GetterMap = BTreeMap<String, Rc<MemoGetter>>;


/// The live getter tables of a store.
#[derive(Clone, Default)]
pub struct GetterSet {
    /// Getters readable directly on the root view.
    pub root: GetterMap,
    /// Getters of each namespace, readable through its sub-view.
    pub namespaces: BTreeMap<String, Rc<GetterMap>>,
}

impl GetterSet {
    /// Getter table of `namespace`, if one is installed.
    pub fn namespace(&self, namespace: &str) -> Option<&Rc<GetterMap>> {
        self.namespaces.get(namespace)
    }

    /// Replace the getter table of `namespace`.
    pub fn install(&mut self, namespace: &str, getters: GetterMap) {
        self.namespaces.insert(namespace.to_string(), Rc::new(getters));
    }

    /// Drop the getter table of `namespace`.
    pub fn remove(&mut self, namespace: &str) -> Option<Rc<GetterMap>> {
        self.namespaces.remove(namespace)
    }

    /// Drop every cached result, releasing the state trees they pin.
    pub fn reset(&self) {
        let tables = std::iter::once(&self.root).chain(self.namespaces.values().map(|t| &**t));
        for getter in tables.flat_map(|table| table.values()) {
            getter.reset();
        }
    }
}


/// Wrap each getter in its own memoizer.
pub fn memoize(getters: &BTreeMap<String, Getter>) -> GetterMap {
    getters
        .iter()
        .map(|(name, getter)| (name.clone(), Rc::new(MemoGetter::new(Rc::clone(getter)))))
        .collect()
}
