//! Error type for store construction, configuration and dispatch.
//!
//! Only a handful of conditions are fatal. Malformed modules and rejected
//! registrations are reported through `tracing` and absorbed by the caller;
//! they never surface here.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The dispatched action carried an empty `type`.
    #[error("action must declare a type")]
    InvalidAction,

    /// An action was dispatched while the reducer was still running.
    #[error("reducers may not dispatch actions (re-entrant dispatch of '{0}')")]
    ReentrantDispatch(String),

    /// The root state handed to the builder was not a JSON object.
    #[error("root state must be a JSON object, got {0}")]
    InvalidRootState(&'static str),

    /// A middleware refused to forward an action.
    #[error("middleware rejected action '{action}': {reason}")]
    Middleware { action: String, reason: String },

    /// The config file could not be read.
    #[error("cannot read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config document is not valid YAML for `StoreConfig`.
    #[error("invalid config: {0}")]
    ConfigParse(#[from] serde_yaml::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
