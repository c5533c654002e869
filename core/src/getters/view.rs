//! Getter views: the read-only surface consumers read derived values from.
//!
//! The root view exposes root getters by name and every registered namespace
//! as a nested view. Nested views are created on first read, cached per
//! namespace in a [`ViewCache`], and hand the root view to their getters so
//! a namespaced getter can reach root getters and sibling namespaces.
//!
//! Views hold only weak references to the state source and to their root, so
//! they never keep a store alive. Revoked views answer every read with
//! [`Read::Revoked`] rather than stale data.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;
use tracing::trace;

use super::{GetterMap, GetterSet};
use crate::namespace::ActionTarget;
use crate::state::StateRef;

static NULL: Value = Value::Null;


/// Something that can hand out the current state reference.
pub trait StateSource {
    fn current_state(&self) -> StateRef;
}

impl StateSource for RefCell<StateRef> {
    fn current_state(&self) -> StateRef {
        Rc::clone(&self.borrow())
    }
}


/// Outcome of reading a key on a view.
#[derive(Debug, Clone)]
pub enum Read {
    /// The key named a getter; this is its value for the current state.
    Value(Value),
    /// The key named a namespace; this is its view.
    Namespace(GetterView),
    /// Neither a getter nor a namespace of this view.
    Absent,
    /// The view was revoked or its store is gone.
    Revoked,
}

impl Read {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Read::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_view(self) -> Option<GetterView> {
        match self {
            Read::Namespace(view) => Some(view),
            _ => None,
        }
    }
}


/// A handle on the root view or on one namespace's view.
///
/// Cloning is cheap and yields a handle on the same view.
#[derive(Clone)]
pub struct GetterView {
    node: Rc<ViewNode>,
}

struct ViewNode {
    source: Weak<dyn StateSource>,
    scope: Scope,
    revoked: Cell<bool>,
}

enum Scope {
    Root {
        getters: GetterSet,
        namespaces: Vec<String>,
        cache: Rc<ViewCache>,
    },
    Namespace {
        namespace: String,
        getters: Rc<GetterMap>,
        root: Weak<ViewNode>,
    },
}

impl GetterView {
    /// Build a root view over a snapshot of `getters` and `namespaces`.
    ///
    /// Nested views created through it are stored in `cache`.
    pub fn root(
        source: Weak<dyn StateSource>,
        getters: GetterSet,
        namespaces: Vec<String>,
        cache: Rc<ViewCache>,
    ) -> Self {
        GetterView {
            node: Rc::new(ViewNode {
                source,
                scope: Scope::Root {
                    getters,
                    namespaces,
                    cache,
                },
                revoked: Cell::new(false),
            }),
        }
    }

    /// Read `key` on this view.
    pub fn read(&self, key: &str) -> Read {
        if self.node.revoked.get() {
            return Read::Revoked;
        }
        let Some(source) = self.node.source.upgrade() else {
            return Read::Revoked;
        };

        match &self.node.scope {
            Scope::Root {
                getters,
                namespaces,
                cache,
            } => {
                if namespaces.iter().any(|ns| ns == key) {
                    return Read::Namespace(self.namespace_view(key, getters, cache));
                }
                match getters.root.get(key) {
                    Some(getter) => {
                        let state = source.current_state();
                        Read::Value(getter.call(&state, &state, self))
                    }
                    None => Read::Absent,
                }
            }
            Scope::Namespace {
                namespace,
                getters,
                root,
            } => {
                let Some(getter) = getters.get(key) else {
                    return Read::Absent;
                };
                let Some(root) = root.upgrade() else {
                    return Read::Revoked;
                };
                let root = GetterView { node: root };
                let state = source.current_state();
                let slice = state.get(namespace.as_str()).unwrap_or(&NULL);
                Read::Value(getter.call(&state, slice, &root))
            }
        }
    }

    /// Value of getter `key`, if it is one.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.read(key).into_value()
    }

    /// View of `namespace`, if this is a root view that lists it.
    pub fn namespace(&self, namespace: &str) -> Option<GetterView> {
        self.read(namespace).into_view()
    }

    /// Read a `namespace/getter` or bare `getter` path.
    pub fn get_path(&self, path: &str) -> Option<Value> {
        let target = ActionTarget::parse(path);
        match target.routed_namespace() {
            Some(ns) => self.namespace(ns)?.get(target.target),
            None => self.get(target.target),
        }
    }

    /// Getter and namespace names readable on this view.
    pub fn keys(&self) -> Vec<String> {
        match &self.node.scope {
            Scope::Root {
                getters,
                namespaces,
                ..
            } => getters
                .root
                .keys()
                .cloned()
                .chain(namespaces.iter().cloned())
                .collect(),
            Scope::Namespace { getters, .. } => getters.keys().cloned().collect(),
        }
    }

    /// Namespace this view serves, `None` for the root view.
    pub fn namespace_name(&self) -> Option<&str> {
        match &self.node.scope {
            Scope::Root { .. } => None,
            Scope::Namespace { namespace, .. } => Some(namespace.as_str()),
        }
    }

    /// Make every future read on this view return [`Read::Revoked`].
    pub fn revoke(&self) {
        self.node.revoked.set(true);
    }

    pub fn is_revoked(&self) -> bool {
        self.node.revoked.get()
    }

    /// True if both handles point at the same view.
    pub fn same_view(&self, other: &GetterView) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    fn namespace_view(
        &self,
        namespace: &str,
        getters: &GetterSet,
        cache: &ViewCache,
    ) -> GetterView {
        if let Some(view) = cache.get(namespace) {
            return view;
        }
        let view = GetterView {
            node: Rc::new(ViewNode {
                source: self.node.source.clone(),
                scope: Scope::Namespace {
                    namespace: namespace.to_string(),
                    getters: getters.namespace(namespace).cloned().unwrap_or_default(),
                    root: Rc::downgrade(&self.node),
                },
                revoked: Cell::new(false),
            }),
        };
        trace!(namespace, "namespace view created");
        cache.insert(namespace, view.clone());
        view
    }
}

impl fmt::Debug for GetterView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GetterView")
            .field("namespace", &self.namespace_name())
            .field("keys", &self.keys())
            .field("revoked", &self.is_revoked())
            .finish()
    }
}


/// Namespace views handed out by root views, at most one per namespace.
#[derive(Default)]
pub struct ViewCache {
    views: RefCell<BTreeMap<String, GetterView>>,
}

impl ViewCache {
    pub fn new() -> Self {
        ViewCache::default()
    }

    pub fn get(&self, namespace: &str) -> Option<GetterView> {
        self.views.borrow().get(namespace).cloned()
    }

    fn insert(&self, namespace: &str, view: GetterView) {
        self.views.borrow_mut().insert(namespace.to_string(), view);
    }

    pub fn len(&self) -> usize {
        self.views.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.borrow().is_empty()
    }

    /// Revoke every cached view and empty the cache.
    pub fn revoke_all(&self) {
        let views = std::mem::take(&mut *self.views.borrow_mut());
        for view in views.values() {
            view.revoke();
        }
    }
}

impl fmt::Debug for ViewCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.views.borrow().keys()).finish()
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
