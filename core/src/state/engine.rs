//! Single-store reducer engine.
//!
//! Owns the current state reference, runs each dispatched action through the
//! middleware chain and then the reducer, and notifies listeners once the new
//! state is in place. Everything is synchronous: `dispatch` returns only
//! after every listener has run.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;
use tracing::{debug, trace};

use super::StateRef;
use crate::action::Action;
use crate::error::StoreError;
use crate::getters::StateSource;


/// Computes the next state for an action.
///
/// Implementations must return the same reference when nothing changed.
pub trait Reducer {
    fn reduce(&self, state: &StateRef, action: &Action) -> Result<StateRef, StoreError>;
}

/// Intercepts actions on their way to the reducer.
///
/// A middleware may inspect the engine, rewrite or swallow the action, or
/// call `next.run` to continue the chain. Dispatching through `engine` from
/// here restarts the full chain.
pub trait Middleware {
    fn handle(&self, engine: &Engine, action: Action, next: Next<'_>) -> Result<Action, StoreError>;
}

/// The remainder of the middleware chain.
pub struct Next<'a> {
    engine: &'a Engine,
    rest: &'a [Rc<dyn Middleware>],
}

impl Next<'_> {
    /// Hand the action to the next middleware, or to the reducer at the end.
    pub fn run(self, action: Action) -> Result<Action, StoreError> {
        match self.rest.split_first() {
            Some((middleware, rest)) => middleware.handle(
                self.engine,
                action,
                Next {
                    engine: self.engine,
                    rest,
                },
            ),
            None => self.engine.reduce(action),
        }
    }
}

/// State-change callback. Reads the new state through the engine or store.
pub type Listener = Rc<dyn Fn()>;

type ListenerList = Rc<RefCell<Vec<(u64, Listener)>>>;


/// The engine behind a store.
pub struct Engine {
    reducer: Box<dyn Reducer>,
    state: RefCell<StateRef>,
    middleware: Vec<Rc<dyn Middleware>>,
    listeners: ListenerList,
    next_listener: Cell<u64>,
    reducing: Cell<bool>,
}

impl Engine {
    /// Create an engine over `initial` state.
    pub fn new<R>(reducer: R, initial: Value, middleware: Vec<Rc<dyn Middleware>>) -> Self
    where
        R: Reducer + 'static,
    {
        Engine {
            reducer: Box::new(reducer),
            state: RefCell::new(Rc::new(initial)),
            middleware,
            listeners: Rc::new(RefCell::new(Vec::new())),
            next_listener: Cell::new(0),
            reducing: Cell::new(false),
        }
    }

    /// The current state reference.
    pub fn state(&self) -> StateRef {
        Rc::clone(&self.state.borrow())
    }

    /// Dispatch an action through the middleware chain and the reducer.
    ///
    /// Returns the action as it reached the reducer. On error the state is
    /// unchanged and no listener runs.
    pub fn dispatch(&self, action: Action) -> Result<Action, StoreError> {
        Next {
            engine: self,
            rest: &self.middleware,
        }
        .run(action)
    }

    /// Register a listener called after every successful dispatch.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + 'static,
    {
        let id = self.next_listener.get();
        self.next_listener.set(id + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        Subscription {
            id,
            listeners: Rc::downgrade(&self.listeners),
        }
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// True while the reducer is running.
    pub fn is_reducing(&self) -> bool {
        self.reducing.get()
    }

    fn reduce(&self, action: Action) -> Result<Action, StoreError> {
        if self.reducing.get() {
            return Err(StoreError::ReentrantDispatch(action.kind));
        }
        let current = self.state();
        let next = {
            let _guard = ReducingGuard::enter(&self.reducing);
            self.reducer.reduce(&current, &action)?
        };
        trace!(action = %action.kind, changed = !Rc::ptr_eq(&current, &next), "action reduced");
        *self.state.borrow_mut() = next;
        self.notify();
        Ok(action)
    }

    fn notify(&self) {
        // Snapshot so listeners may subscribe or unsubscribe while running.
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener();
        }
    }
}

impl StateSource for Engine {
    fn current_state(&self) -> StateRef {
        self.state()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state.borrow())
            .field("middleware", &self.middleware.len())
            .field("listeners", &self.listener_count())
            .finish()
    }
}


/// Clears the reducing flag even when the reducer bails out early.
struct ReducingGuard<'a>(&'a Cell<bool>);

impl<'a> ReducingGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        ReducingGuard(flag)
    }
}

impl Drop for ReducingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}


/// Handle returned by [`Engine::subscribe`].
///
/// Dropping it leaves the listener registered; call [`Subscription::unsubscribe`].
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    listeners: Weak<RefCell<Vec<(u64, Listener)>>>,
}

impl Subscription {
    /// Remove the listener. A no-op once the engine is gone.
    pub fn unsubscribe(self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}


/// Logs every dispatched action at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceMiddleware;

impl Middleware for TraceMiddleware {
    fn handle(
        &self,
        engine: &Engine,
        action: Action,
        next: Next<'_>,
    ) -> Result<Action, StoreError> {
        let before = engine.state();
        let kind = action.kind.clone();
        let result = next.run(action);
        match &result {
            Ok(_) => debug!(
                action = %kind,
                changed = !Rc::ptr_eq(&before, &engine.state()),
                "action dispatched"
            ),
            Err(err) => debug!(action = %kind, error = %err, "action rejected"),
        }
        result
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
