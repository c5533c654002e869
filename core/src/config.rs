//! Store configuration, loadable from YAML.
//!
//! ```yaml
//! trace_actions: true
//! report_unhandled: false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;


#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Install [`TraceMiddleware`](crate::state::TraceMiddleware) ahead of
    /// any caller middleware.
    pub trace_actions: bool,
    /// Log actions no handler claimed at debug level instead of trace.
    pub report_unhandled: bool,
}

impl StoreConfig {
    /// Parse a YAML document. An empty document yields the defaults.
    pub fn from_yaml_str(content: &str) -> Result<Self, StoreError> {
        if content.trim().is_empty() {
            return Ok(StoreConfig::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load and parse a YAML file.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path).map_err(|source| StoreError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        StoreConfig::from_yaml_str(&content)
    }
}
