//! Single-slot getter memoization keyed on state identity.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use super::{Getter, GetterView};
use crate::state::StateRef;


/// A getter plus the result of its most recent evaluation.
///
/// The cache key is the identity of the state reference, not its contents:
/// the engine hands out a new reference on every accepted mutation and the
/// same one otherwise. Changes visible only through the getter view argument
/// are not tracked.
pub struct MemoGetter {
    getter: Getter,
    cache: RefCell<Option<(StateRef, Value)>>,
    invocations: Cell<usize>,
}

impl MemoGetter {
    pub fn new(getter: Getter) -> Self {
        MemoGetter {
            getter,
            cache: RefCell::new(None),
            invocations: Cell::new(0),
        }
    }

    /// Evaluate against `state`, reusing the cached result when `state` is
    /// the same reference as last time.
    ///
    /// `input` is what the getter actually sees: the whole tree for root
    /// getters, the namespace's slice of it for namespaced ones.
    pub fn call(&self, state: &StateRef, input: &Value, getters: &GetterView) -> Value {
        let cached = self
            .cache
            .borrow()
            .as_ref()
            .filter(|(key, _)| Rc::ptr_eq(key, state))
            .map(|(_, value)| value.clone());
        if let Some(value) = cached {
            return value;
        }

        let value = (self.getter)(input, getters);
        self.invocations.set(self.invocations.get() + 1);
        *self.cache.borrow_mut() = Some((Rc::clone(state), value.clone()));
        value
    }

    /// How many times the wrapped getter actually ran.
    pub fn invocations(&self) -> usize {
        self.invocations.get()
    }

    /// Drop the cached result.
    pub fn reset(&self) {
        self.cache.borrow_mut().take();
    }
}

impl fmt::Debug for MemoGetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoGetter")
            .field("cached", &self.cache.borrow().is_some())
            .field("invocations", &self.invocations.get())
            .finish()
    }
}
