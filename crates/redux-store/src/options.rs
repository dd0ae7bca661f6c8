//! Store options
//!
//! Options are plain serde data so a host application can keep them in its
//! own TOML configuration file.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Which execution context is allowed to drain the dispatch queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ownership {
    /// Only the thread that constructed the store drains.
    ///
    /// Dispatches from other threads are queued and picked up by the next
    /// drain on the owning thread.
    #[default]
    Thread,
    /// Any caller drains, as long as no drain is already in progress.
    Any,
}

/// Options for a store instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOptions {
    /// Label used in log lines
    #[serde(default = "default_name")]
    pub name: String,

    /// Emit a trace line for every action taken off the queue
    #[serde(default)]
    pub trace_actions: bool,

    /// Drain ownership policy (the reactive store always uses `Any`)
    #[serde(default)]
    pub ownership: Ownership,
}

fn default_name() -> String {
    "store".to_string()
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            name: default_name(),
            trace_actions: false,
            ownership: Ownership::default(),
        }
    }
}

impl StoreOptions {
    /// Default options with a custom log label
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parse options from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let options = toml::from_str(content)?;
        Ok(options)
    }
}
