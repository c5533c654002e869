//! Copy-on-write draft application.
//!
//! A recipe mutates a private copy of the base state. The result shares the
//! base reference when the copy compares equal afterwards, so "new reference"
//! always means "state changed".

use std::rc::Rc;

use serde_json::Value;

use super::StateRef;


/// Apply `recipe` to a draft of `base` and return the resulting state.
///
/// Returns `base` itself (same `Rc`) when the recipe left the draft equal to
/// the base, and a fresh reference otherwise.
///
/// Copies and compares the whole tree, so the cost grows with total state
/// size. Prefer [`produce_slice`] when the recipe only touches one key.
pub fn produce<F>(base: &StateRef, recipe: F) -> StateRef
where
    F: FnOnce(&mut Value),
{
    let mut draft = Value::clone(base);
    recipe(&mut draft);
    if draft == **base {
        Rc::clone(base)
    } else {
        Rc::new(draft)
    }
}

/// Apply `recipe` to a draft of the `key` slice of `base`.
///
/// Only the slice is copied and compared. The rest of the tree is copied
/// once, and only when the slice changed. A missing key returns `base`
/// without running the recipe.
pub fn produce_slice<F>(base: &StateRef, key: &str, recipe: F) -> StateRef
where
    F: FnOnce(&mut Value),
{
    let Some(slice) = base.get(key) else {
        return Rc::clone(base);
    };
    let mut draft = slice.clone();
    recipe(&mut draft);
    if draft == *slice {
        return Rc::clone(base);
    }
    let mut next = Value::clone(base);
    if let Some(fields) = next.as_object_mut() {
        fields.insert(key.to_string(), draft);
    }
    Rc::new(next)
}
