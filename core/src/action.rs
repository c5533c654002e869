//! Actions: the `{ "type": ..., ...payload }` records routed by the reducer.
//!
//! The `type` field encodes routing: `cart/add` targets the `add` handler of
//! the `cart` namespace, a bare `increment` targets a root handler. Every
//! other field is payload and is handed to the handler untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved type of the action the registrar dispatches to seed a freshly
/// registered module's slice. Consumer actions must never use it.
pub const INIT_MODULE: &str = "$$INIT_MODULE";

/// A dispatched action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Routing type. Empty means "no type" and is rejected at dispatch.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Every field other than `type`.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Action {
    /// Create an action with the given type and an empty payload.
    pub fn new(kind: impl Into<String>) -> Self {
        Action {
            kind: kind.into(),
            payload: Map::new(),
        }
    }

    /// Add a payload field, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// Look up a payload field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// True if the action declares a non-empty type.
    pub fn has_type(&self) -> bool {
        !self.kind.is_empty()
    }

    /// The internal action that replaces `namespace`'s slice with `init_state`.
    pub fn init_module(namespace: &str, init_state: Value) -> Self {
        Action::new(INIT_MODULE)
            .with("namespace", namespace)
            .with("initState", init_state)
    }

    pub fn is_init_module(&self) -> bool {
        self.kind == INIT_MODULE
    }

    /// Build an action from a JSON object such as `{"type": "cart/add", "item": "x"}`.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

impl From<&str> for Action {
    fn from(kind: &str) -> Self {
        Action::new(kind)
    }
}
