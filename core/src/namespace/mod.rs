//! Namespace addressing for action types.
//!
//! Provides `namespace/target` parsing so the reducer can route an action to
//! the handler table of the module that owns it.

pub mod path;

pub use path::{resolve, ActionTarget, SEPARATOR};
