//! The composed reducer: routes each action to the handler that owns it.
//!
//! Routing order for a namespaced type `ns/target`: the handler table the
//! store was built with for `ns`, then the dynamic registry's table for `ns`.
//! Namespaced handlers mutate a draft of their slice; root handlers mutate a
//! draft of the whole tree.
//!
//! Only an untyped action is an error. Actions nobody handles leave the state
//! reference untouched, so consumers may dispatch to modules that have not
//! been registered yet.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::action::Action;
use crate::error::StoreError;
use crate::module::{ActionHandler, ActionSet};
use crate::namespace::ActionTarget;
use crate::registry::ModuleRegistry;
use crate::state::{produce, produce_slice, Reducer, StateRef};

/// Diagnostic callback for actions no handler claimed.
///
/// Runs inside the reducer: dispatching from it is rejected.
pub type UnhandledHook = Rc<dyn Fn(&Action)>;


pub struct ComposedReducer {
    actions: ActionSet,
    registry: ModuleRegistry,
    report_unhandled: bool,
    on_unhandled: Option<UnhandledHook>,
}

impl ComposedReducer {
    pub fn new(actions: ActionSet, registry: ModuleRegistry) -> Self {
        ComposedReducer {
            actions,
            registry,
            report_unhandled: false,
            on_unhandled: None,
        }
    }

    /// Log unhandled actions at debug level instead of trace.
    pub fn report_unhandled(mut self, report: bool) -> Self {
        self.report_unhandled = report;
        self
    }

    pub fn on_unhandled(mut self, hook: Option<UnhandledHook>) -> Self {
        self.on_unhandled = hook;
        self
    }

    fn namespaced_handler(&self, namespace: &str, target: &str) -> Option<ActionHandler> {
        match self.actions.namespace(namespace) {
            Some(handlers) => handlers.get(target).cloned(),
            None => self.registry.handler(namespace, target).flatten(),
        }
    }

    fn init_module(&self, state: &StateRef, action: &Action) -> StateRef {
        let Some(namespace) = action.get("namespace").and_then(Value::as_str) else {
            warn!("init-module action without a namespace; ignoring it");
            return Rc::clone(state);
        };
        let init_state = action.get("initState").cloned().unwrap_or(Value::Null);
        trace!(namespace, "seeding module state");
        if state.get(namespace) == Some(&init_state) {
            return Rc::clone(state);
        }
        let mut next = Value::clone(state);
        if let Some(fields) = next.as_object_mut() {
            fields.insert(namespace.to_string(), init_state);
        }
        Rc::new(next)
    }

    fn unhandled(&self, state: &StateRef, action: &Action) -> StateRef {
        if self.report_unhandled {
            debug!(action = %action.kind, "no handler for action");
        } else {
            trace!(action = %action.kind, "no handler for action");
        }
        if let Some(hook) = &self.on_unhandled {
            hook(action);
        }
        Rc::clone(state)
    }
}

impl Reducer for ComposedReducer {
    fn reduce(&self, state: &StateRef, action: &Action) -> Result<StateRef, StoreError> {
        if !action.has_type() {
            return Err(StoreError::InvalidAction);
        }
        if action.is_init_module() {
            return Ok(self.init_module(state, action));
        }

        let target = ActionTarget::parse(&action.kind);
        let Some(namespace) = target.routed_namespace() else {
            return Ok(match self.actions.root_handler(target.target) {
                Some(handler) => produce(state, |draft| handler(draft, action)),
                None => self.unhandled(state, action),
            });
        };

        let Some(handler) = self.namespaced_handler(namespace, target.target) else {
            return Ok(self.unhandled(state, action));
        };
        if state.get(namespace).is_none() {
            return Ok(self.unhandled(state, action));
        }
        Ok(produce_slice(state, namespace, |slice| handler(slice, action)))
    }
}

impl fmt::Debug for ComposedReducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposedReducer")
            .field("root", &self.actions.root.keys().collect::<Vec<_>>())
            .field("namespaces", &self.actions.namespaces.keys().collect::<Vec<_>>())
            .field("registry", &self.registry)
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{normalize_modules, HandlerMap, Module};
    use crate::registry::DynamicModuleConfig;
    use serde_json::json;
    use std::cell::RefCell;

    fn push_item(slice: &mut Value, action: &Action) {
        if let (Some(items), Some(item)) = (slice["items"].as_array_mut(), action.get("item")) {
            items.push(item.clone());
        }
    }

    fn fixture(registry: ModuleRegistry) -> (ComposedReducer, StateRef) {
        let mut set = normalize_modules(&[Module::namespaced("cart")
            .state(json!({"items": []}))
            .action("add", push_item)]);
        set.merge_root(&Module::root().state(json!({"count": 0})).action(
            "increment",
            |s, _| {
                let n = s["count"].as_i64().unwrap_or(0);
                s["count"] = json!(n + 1);
            },
        ))
        .unwrap();
        let state = Rc::new(Value::Object(set.state));
        (ComposedReducer::new(set.actions, registry), state)
    }

    #[test]
    fn untyped_action_fails() {
        let (reducer, state) = fixture(ModuleRegistry::new());
        let err = reducer.reduce(&state, &Action::new("")).unwrap_err();
        assert!(matches!(err, StoreError::InvalidAction));
    }

    #[test]
    fn root_handler_sees_whole_tree() {
        let (reducer, state) = fixture(ModuleRegistry::new());
        let next = reducer.reduce(&state, &Action::new("increment")).unwrap();
        assert_eq!(next["count"], json!(1));
        let next = reducer.reduce(&next, &Action::new("increment")).unwrap();
        assert_eq!(next["count"], json!(2));
    }

    #[test]
    fn namespaced_handler_sees_slice() {
        let (reducer, state) = fixture(ModuleRegistry::new());
        let next = reducer
            .reduce(&state, &Action::new("cart/add").with("item", "x"))
            .unwrap();
        assert_eq!(next["cart"], json!({"items": ["x"]}));
        assert_eq!(next["count"], json!(0));
    }

    #[test]
    fn unhandled_actions_keep_reference() {
        let (reducer, state) = fixture(ModuleRegistry::new());
        for kind in ["nope", "cart/nope", "ghost/add", "/increment-not"] {
            let next = reducer.reduce(&state, &Action::new(kind)).unwrap();
            assert!(Rc::ptr_eq(&state, &next), "{kind} changed state");
        }
    }

    #[test]
    fn no_op_namespaced_handler_keeps_reference() {
        let (reducer, state) = fixture(ModuleRegistry::new());
        let next = reducer.reduce(&state, &Action::new("cart/add")).unwrap();
        assert!(Rc::ptr_eq(&state, &next));
        let seeded = reducer
            .reduce(&state, &Action::init_module("cart", json!({"items": []})))
            .unwrap();
        assert!(Rc::ptr_eq(&state, &seeded));
    }

    #[test]
    fn empty_namespace_routes_to_root() {
        let (reducer, state) = fixture(ModuleRegistry::new());
        let next = reducer.reduce(&state, &Action::new("/increment")).unwrap();
        assert_eq!(next["count"], json!(1));
    }

    #[test]
    fn dynamic_registry_is_the_fallback() {
        let registry = ModuleRegistry::new();
        let (reducer, state) = fixture(registry.clone());
        let state = reducer
            .reduce(&state, &Action::init_module("counter", json!({"n": 0})))
            .unwrap();

        let mut actions = HandlerMap::new();
        let increment: ActionHandler = Rc::new(|slice: &mut Value, _: &Action| {
            let n = slice["n"].as_i64().unwrap_or(0);
            slice["n"] = json!(n + 1);
        });
        actions.insert("increment".into(), increment);
        registry.mark_loaded("counter", DynamicModuleConfig::new());
        registry.install("counter", actions, json!({"n": 0}));

        let next = reducer
            .reduce(&state, &Action::new("counter/increment"))
            .unwrap();
        assert_eq!(next["counter"], json!({"n": 1}));
    }

    #[test]
    fn static_table_shadows_registry() {
        let registry = ModuleRegistry::new();
        let mut actions = HandlerMap::new();
        let clear: ActionHandler = Rc::new(|slice: &mut Value, _: &Action| {
            *slice = json!({"items": ["dynamic"]});
        });
        actions.insert("clear".into(), clear);
        registry.install("cart", actions, json!({}));

        let (reducer, state) = fixture(registry);
        let next = reducer.reduce(&state, &Action::new("cart/clear")).unwrap();
        assert!(Rc::ptr_eq(&state, &next));
    }

    #[test]
    fn init_module_replaces_slice() {
        let (reducer, state) = fixture(ModuleRegistry::new());
        let state = reducer
            .reduce(&state, &Action::new("cart/add").with("item", "x"))
            .unwrap();
        let next = reducer
            .reduce(&state, &Action::init_module("cart", json!({"fresh": true})))
            .unwrap();
        assert_eq!(next["cart"], json!({"fresh": true}));
    }

    #[test]
    fn init_module_without_namespace_is_ignored() {
        let (reducer, state) = fixture(ModuleRegistry::new());
        let next = reducer.reduce(&state, &Action::new(crate::INIT_MODULE)).unwrap();
        assert!(Rc::ptr_eq(&state, &next));
    }

    #[test]
    fn hook_sees_unhandled_actions() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let (reducer, state) = fixture(ModuleRegistry::new());
        let reducer = reducer
            .report_unhandled(true)
            .on_unhandled(Some(Rc::new(move |a: &Action| log.borrow_mut().push(a.kind.clone()))));

        reducer.reduce(&state, &Action::new("ghost/add")).unwrap();
        reducer.reduce(&state, &Action::new("increment")).unwrap();
        assert_eq!(*seen.borrow(), vec!["ghost/add"]);
    }
}
