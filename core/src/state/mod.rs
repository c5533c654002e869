//! State tree, copy-on-write drafts and the single-store reducer engine.
//!
//! The state tree is one JSON object behind an `Rc`. The engine replaces the
//! whole reference on every accepted mutation and keeps it otherwise, which
//! is what lets getters memoize on pointer identity.

use std::rc::Rc;

use serde_json::Value;

pub mod draft;
pub mod engine;

pub use draft::{produce, produce_slice};
pub use engine::{Engine, Listener, Middleware, Next, Reducer, Subscription, TraceMiddleware};

/// Shared, immutable reference to a state tree (or any value derived from it).
pub type StateRef = Rc<Value>;
