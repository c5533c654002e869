//! Module declarations.
//!
//! A module owns one slice of state, the handlers that mutate it and the
//! getters derived from it. Modules are declared with a small builder:
//!
//! ```ignore
//! let cart = Module::namespaced("cart")
//!     .state(json!({"items": []}))
//!     .action("add", |slice, action| { /* mutate slice */ })
//!     .getter("count", |slice, _| json!(slice["items"].as_array().map_or(0, Vec::len)));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::{json, Value};

use crate::action::Action;
use crate::getters::{Getter, GetterView};

pub mod normalize;

pub use normalize::{normalize_modules, ActionSet, NormalizedModuleSet};

/// Signature of an action handler: mutate the draft in place.
pub type ActionFn = dyn Fn(&mut Value, &Action);

/// A shared action handler.
pub type ActionHandler = Rc<ActionFn>;

/// Handlers of one scope, keyed by action target.
pub type HandlerMap = BTreeMap<String, ActionHandler>;


/// A module declaration.
#[derive(Clone, Default)]
pub struct Module {
    /// Key of the module's slice in the state tree.
    pub namespace: Option<String>,
    /// Whether actions and getters are scoped under the namespace.
    pub namespaced: bool,
    /// Initial state of the slice.
    pub state: Value,
    pub actions: HandlerMap,
    pub getters: BTreeMap<String, Getter>,
}

impl Module {
    /// The root module: un-namespaced, state is an empty object.
    pub fn root() -> Self {
        Module {
            state: json!({}),
            ..Module::default()
        }
    }

    /// A module whose state lives under `namespace` but whose actions and
    /// getters merge into the root tables.
    pub fn new(namespace: impl Into<String>) -> Self {
        Module {
            namespace: Some(namespace.into()),
            ..Module::default()
        }
    }

    /// A module whose state, actions and getters all live under `namespace`.
    pub fn namespaced(namespace: impl Into<String>) -> Self {
        Module {
            namespace: Some(namespace.into()),
            namespaced: true,
            ..Module::default()
        }
    }

    /// Set the initial state.
    pub fn state(mut self, state: Value) -> Self {
        self.state = state;
        self
    }

    /// Add an action handler.
    pub fn action<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Value, &Action) + 'static,
    {
        self.actions.insert(name.into(), Rc::new(handler));
        self
    }

    /// Add a getter.
    pub fn getter<F>(mut self, name: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&Value, &GetterView) -> Value + 'static,
    {
        self.getters.insert(name.into(), Rc::new(getter));
        self
    }

    /// The namespace, treating an empty string as absent.
    pub fn namespace_name(&self) -> Option<&str> {
        self.namespace.as_deref().filter(|ns| !ns.is_empty())
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("namespace", &self.namespace)
            .field("namespaced", &self.namespaced)
            .field("state", &self.state)
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("getters", &self.getters.keys().collect::<Vec<_>>())
            .finish()
    }
}


/// A module as handed to the registrar by a loader.
///
/// Loaders that bundle a module as the `default` entry of a package can pass
/// the wrapper straight through; the registrar unwraps it.
#[derive(Debug, Clone)]
pub enum ModuleSource {
    Module(Module),
    Wrapped { default: Module },
}

impl ModuleSource {
    pub fn into_module(self) -> Module {
        match self {
            ModuleSource::Module(module) => module,
            ModuleSource::Wrapped { default } => default,
        }
    }
}

impl From<Module> for ModuleSource {
    fn from(module: Module) -> Self {
        ModuleSource::Module(module)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_parts() {
        let module = Module::namespaced("cart")
            .state(json!({"items": []}))
            .action("add", |_, _| {})
            .action("clear", |_, _| {})
            .getter("count", |_, _| json!(0));
        assert_eq!(module.namespace_name(), Some("cart"));
        assert!(module.namespaced);
        assert_eq!(module.actions.len(), 2);
        assert_eq!(module.getters.len(), 1);
        assert_eq!(module.state, json!({"items": []}));
    }

    #[test]
    fn empty_namespace_counts_as_missing() {
        assert_eq!(Module::namespaced("").namespace_name(), None);
        assert_eq!(Module::root().namespace_name(), None);
        assert_eq!(Module::new("user").namespace_name(), Some("user"));
        assert!(!Module::new("user").namespaced);
    }

    #[test]
    fn wrapped_source_unwraps_default() {
        let source = ModuleSource::Wrapped {
            default: Module::namespaced("lazy"),
        };
        assert_eq!(source.into_module().namespace_name(), Some("lazy"));

        let plain: ModuleSource = Module::namespaced("plain").into();
        assert_eq!(plain.into_module().namespace_name(), Some("plain"));
    }

    #[test]
    fn debug_lists_names() {
        let module = Module::namespaced("cart").action("add", |_, _| {});
        let out = format!("{:?}", module);
        assert!(out.contains("cart"));
        assert!(out.contains("add"));
    }
}
