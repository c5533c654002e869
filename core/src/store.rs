//! The store facade.
//!
//! [`StoreBuilder`] normalizes the declared modules, builds the composed
//! reducer and the engine, and creates the first getter view. [`Store`]
//! passes dispatch, subscribe and state reads through to the engine and adds
//! the getter view lifecycle and runtime module registration.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;
use tracing::{debug, warn};

use crate::action::Action;
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::getters::{memoize, GetterSet, GetterView, StateSource, ViewCache};
use crate::module::{normalize_modules, Module, ModuleSource};
use crate::reducer::{ComposedReducer, UnhandledHook};
use crate::registry::{DynamicModuleConfig, ModuleRegistry};
use crate::state::{Engine, Middleware, StateRef, Subscription, TraceMiddleware};


/// Outcome of [`Store::register_module`]. Only `Registered` changed anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Registered,
    /// The module declares no namespace.
    MissingNamespace,
    /// The store already lists that namespace, built in or registered.
    NamespaceExists,
    /// The shared registry marks the namespace loaded by another store.
    AlreadyLoaded,
    /// Seeding the module's state failed; the registration was undone.
    SeedFailed,
}


/// Builder for [`Store`].
#[derive(Default)]
pub struct StoreBuilder {
    root: Module,
    modules: Vec<Module>,
    middleware: Vec<Rc<dyn Middleware>>,
    registry: Option<ModuleRegistry>,
    config: StoreConfig,
    on_unhandled: Option<UnhandledHook>,
}

impl StoreBuilder {
    pub fn new() -> Self {
        StoreBuilder {
            root: Module::root(),
            ..StoreBuilder::default()
        }
    }

    /// Replace the root module. Its namespace settings are ignored.
    pub fn root(mut self, root: Module) -> Self {
        self.root = root;
        self
    }

    /// Set the root state.
    pub fn state(mut self, state: Value) -> Self {
        self.root.state = state;
        self
    }

    /// Add a root action handler.
    pub fn action<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Value, &Action) + 'static,
    {
        self.root = self.root.action(name, handler);
        self
    }

    /// Add a root getter.
    pub fn getter<F>(mut self, name: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&Value, &GetterView) -> Value + 'static,
    {
        self.root = self.root.getter(name, getter);
        self
    }

    pub fn module(mut self, module: Module) -> Self {
        self.modules.push(module);
        self
    }

    pub fn modules(mut self, modules: impl IntoIterator<Item = Module>) -> Self {
        self.modules.extend(modules);
        self
    }

    /// Append a middleware. Middleware run in the order they were added.
    pub fn middleware<M>(mut self, middleware: M) -> Self
    where
        M: Middleware + 'static,
    {
        self.middleware.push(Rc::new(middleware));
        self
    }

    /// Record runtime registrations in `registry` instead of a private one.
    pub fn registry(mut self, registry: ModuleRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Call `hook` for every action no handler claimed.
    pub fn on_unhandled<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Action) + 'static,
    {
        self.on_unhandled = Some(Rc::new(hook));
        self
    }

    pub fn build(self) -> Result<Store, StoreError> {
        let mut normalized = normalize_modules(&self.modules);
        normalized.merge_root(&self.root)?;

        let registry = self.registry.unwrap_or_default();
        let mut middleware: Vec<Rc<dyn Middleware>> = Vec::new();
        if self.config.trace_actions {
            middleware.push(Rc::new(TraceMiddleware));
        }
        middleware.extend(self.middleware);

        let reducer = ComposedReducer::new(normalized.actions, registry.clone())
            .report_unhandled(self.config.report_unhandled)
            .on_unhandled(self.on_unhandled);
        let engine = Rc::new(Engine::new(
            reducer,
            Value::Object(normalized.state),
            middleware,
        ));

        debug!(
            namespaces = ?normalized.namespaces,
            discarded = normalized.discarded.len(),
            "store created"
        );

        let store = Store {
            shared: Rc::new(Shared {
                engine,
                namespaces: RefCell::new(normalized.namespaces),
                getters: RefCell::new(normalized.getters),
                registry,
                views: Rc::new(ViewCache::new()),
                view: RefCell::new(None),
            }),
        };
        store.rebuild_view();
        Ok(store)
    }
}


struct Shared {
    engine: Rc<Engine>,
    /// Static plus registered namespaces, in order of appearance.
    namespaces: RefCell<Vec<String>>,
    getters: RefCell<GetterSet>,
    registry: ModuleRegistry,
    views: Rc<ViewCache>,
    view: RefCell<Option<GetterView>>,
}


/// A namespaced store. Clones are handles on the same store.
#[derive(Clone)]
pub struct Store {
    shared: Rc<Shared>,
}

impl Store {
    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    /// The current state reference.
    pub fn state(&self) -> StateRef {
        self.shared.engine.state()
    }

    /// Dispatch an action.
    ///
    /// Fails only for an untyped action, a dispatch from inside a handler, or
    /// a middleware rejection. Actions no module handles succeed without
    /// changing the state.
    pub fn dispatch(&self, action: Action) -> Result<Action, StoreError> {
        self.shared.engine.dispatch(action)
    }

    /// Register a listener called after every successful dispatch.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + 'static,
    {
        self.shared.engine.subscribe(listener)
    }

    pub fn engine(&self) -> &Rc<Engine> {
        &self.shared.engine
    }

    /// The current root getter view, `None` after [`Store::destroy_getters`]
    /// until the next registration rebuilds it.
    pub fn getter_view(&self) -> Option<GetterView> {
        self.shared.view.borrow().clone()
    }

    /// Revoke the root view and every namespace view handed out so far.
    pub fn destroy_getters(&self) {
        if let Some(view) = self.shared.view.take() {
            view.revoke();
        }
        self.shared.views.revoke_all();
        self.shared.getters.borrow().reset();
        debug!("getter views destroyed");
    }

    /// Static and registered namespaces, in order of appearance.
    pub fn namespaces(&self) -> Vec<String> {
        self.shared.namespaces.borrow().clone()
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.shared.registry
    }

    /// Merge `module` into the running store.
    ///
    /// Rejected registrations are logged and leave the store untouched. A
    /// namespace is registered at most once per store. On success the
    /// module's slice is seeded through a regular dispatch and the getter view
    /// is rebuilt; views obtained earlier are revoked, so fetch a fresh one
    /// with [`Store::getter_view`]. If the seeding dispatch fails (a
    /// middleware rejects it, or the call comes from inside a handler) every
    /// step is undone and [`Registration::SeedFailed`] is returned.
    pub fn register_module(
        &self,
        module: impl Into<ModuleSource>,
        config: DynamicModuleConfig,
    ) -> Registration {
        let module = module.into().into_module();
        let Some(namespace) = module.namespace_name().map(str::to_string) else {
            warn!("dynamic module must declare a namespace; ignoring it");
            return Registration::MissingNamespace;
        };
        if self.shared.namespaces.borrow().contains(&namespace) {
            warn!(namespace = %namespace, "module {} exists", namespace);
            return Registration::NamespaceExists;
        }
        if self.shared.registry.is_loaded(&namespace) {
            debug!(namespace = %namespace, "module already loaded");
            return Registration::AlreadyLoaded;
        }

        let previous = self.shared.registry.entry(&namespace);
        self.shared.registry.mark_loaded(&namespace, config);
        self.shared.namespaces.borrow_mut().push(namespace.clone());
        self.shared
            .getters
            .borrow_mut()
            .install(&namespace, memoize(&module.getters));
        self.shared
            .registry
            .install(&namespace, module.actions, module.state.clone());

        if let Err(err) = self.dispatch(Action::init_module(&namespace, module.state)) {
            warn!(
                namespace = %namespace,
                error = %err,
                "failed to seed module state; rolling back"
            );
            self.shared.registry.restore(&namespace, previous);
            self.shared.namespaces.borrow_mut().retain(|ns| ns != &namespace);
            self.shared.getters.borrow_mut().remove(&namespace);
            return Registration::SeedFailed;
        }

        self.rebuild_view();
        debug!(namespace = %namespace, "module registered");
        Registration::Registered
    }

    fn rebuild_view(&self) {
        self.shared.views.revoke_all();
        let engine: Weak<Engine> = Rc::downgrade(&self.shared.engine);
        let source: Weak<dyn StateSource> = engine;
        let view = GetterView::root(
            source,
            self.shared.getters.borrow().clone(),
            self.shared.namespaces.borrow().clone(),
            Rc::clone(&self.shared.views),
        );
        if let Some(previous) = self.shared.view.replace(Some(view)) {
            previous.revoke();
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state())
            .field("namespaces", &self.namespaces())
            .field("registry", &self.shared.registry)
            .field("views", &self.shared.views)
            .finish()
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
