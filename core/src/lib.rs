//! bystate: namespaced, dynamically extensible state container.
//!
//! Independently authored modules each own a slice of the state tree, a set
//! of mutation handlers and a set of getters. Modules are composed when the
//! store is built or registered later at runtime; consumers read derived
//! values through a lazily evaluated, memoized getter view.
//!
//! # Modules
//!
//! - [`action`]: Action records and the reserved init-module type
//! - [`namespace`]: `namespace/target` resolution for action types
//! - [`state`]: State references, copy-on-write drafts, the reducer engine
//! - [`module`]: Module declarations and normalization into handler tables
//! - [`getters`]: Memoized getters and the revocable getter view tree
//! - [`reducer`]: The composed reducer routing actions to module handlers
//! - [`registry`]: Per-store record of dynamically registered modules
//! - [`store`]: The store facade and its builder
//! - [`binding`]: Context provider for consumers that follow state changes
//! - [`config`]: YAML-loadable store configuration
//! - [`error`]: Error type shared by the crate

pub mod action;
pub mod binding;
pub mod config;
pub mod error;
pub mod getters;
pub mod module;
pub mod namespace;
pub mod reducer;
pub mod registry;
pub mod state;
pub mod store;

pub use action::{Action, INIT_MODULE};
pub use binding::{ContextValue, Dispatcher, StateProvider};
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use getters::{GetterView, Read};
pub use module::{Module, ModuleSource};
pub use registry::{DynamicModuleConfig, ModuleRegistry};
pub use state::{Engine, Middleware, StateRef, Subscription};
pub use store::{Registration, Store, StoreBuilder};
