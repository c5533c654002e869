//! Context provider for consumers that follow a store.
//!
//! A mounted [`StateProvider`] subscribes to its store and keeps a snapshot
//! of the latest state. Consumers ask it for a [`ContextValue`] whenever they
//! render. Unmounting destroys the store's getter views and unsubscribes.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::action::Action;
use crate::error::StoreError;
use crate::getters::GetterView;
use crate::state::{Engine, StateRef, Subscription};
use crate::store::Store;


/// Dispatch handle handed to consumers.
#[derive(Clone)]
pub struct Dispatcher {
    store: Store,
}

impl Dispatcher {
    pub fn dispatch(&self, action: Action) -> Result<Action, StoreError> {
        self.store.dispatch(action)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Dispatcher")
    }
}


/// What a consumer sees: `(state, dispatch, getters, state_ref)`.
#[derive(Debug, Clone)]
pub struct ContextValue {
    pub state: StateRef,
    pub dispatch: Dispatcher,
    /// `None` once the store's getter views were destroyed.
    pub getters: Option<GetterView>,
    /// Always holds the latest state, even inside a stale context value.
    pub state_ref: Rc<RefCell<StateRef>>,
}

impl ContextValue {
    pub fn into_parts(
        self,
    ) -> (
        StateRef,
        Dispatcher,
        Option<GetterView>,
        Rc<RefCell<StateRef>>,
    ) {
        (self.state, self.dispatch, self.getters, self.state_ref)
    }
}


pub struct StateProvider {
    store: Store,
    latest: Rc<RefCell<StateRef>>,
    version: Rc<Cell<u64>>,
    subscription: RefCell<Option<Subscription>>,
}

impl StateProvider {
    /// Subscribe to `store` and start tracking its state.
    pub fn mount(store: &Store) -> Self {
        let latest = Rc::new(RefCell::new(store.state()));
        let version = Rc::new(Cell::new(0));

        // The engine owns the listener, so it must not own the engine back.
        let engine: Weak<Engine> = Rc::downgrade(store.engine());
        let cell = Rc::clone(&latest);
        let counter = Rc::clone(&version);
        let subscription = store.subscribe(move || {
            let Some(engine) = engine.upgrade() else {
                return;
            };
            let next = engine.state();
            if Rc::ptr_eq(&cell.borrow(), &next) {
                return;
            }
            *cell.borrow_mut() = next;
            counter.set(counter.get() + 1);
        });

        debug!("state provider mounted");
        StateProvider {
            store: store.clone(),
            latest,
            version,
            subscription: RefCell::new(Some(subscription)),
        }
    }

    /// The value consumers read: the latest state, a dispatcher, the current
    /// getter view and the shared latest-state cell.
    pub fn context(&self) -> ContextValue {
        ContextValue {
            state: Rc::clone(&self.latest.borrow()),
            dispatch: Dispatcher {
                store: self.store.clone(),
            },
            getters: self.store.getter_view(),
            state_ref: Rc::clone(&self.latest),
        }
    }

    /// Number of state changes seen since mounting.
    pub fn version(&self) -> u64 {
        self.version.get()
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.borrow().is_some()
    }

    /// Destroy the store's getter views and stop following it. Idempotent.
    pub fn unmount(&self) {
        let Some(subscription) = self.subscription.take() else {
            return;
        };
        self.store.destroy_getters();
        subscription.unsubscribe();
        debug!("state provider unmounted");
    }
}

impl Drop for StateProvider {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl fmt::Debug for StateProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateProvider")
            .field("version", &self.version())
            .field("mounted", &self.is_mounted())
            .finish()
    }
}
