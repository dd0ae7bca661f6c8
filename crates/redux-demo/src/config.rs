//! Demo configuration
//!
//! Loaded from redux-demo.toml in the current working directory.

use redux_store::StoreOptions;
use serde::Deserialize;

const CONFIG_FILE: &str = "redux-demo.toml";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DemoConfig {
    /// Options for the synchronous store
    #[serde(default = "default_store")]
    pub store: StoreOptions,

    /// Delay the reactive bottomware adds to every action, in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_store() -> StoreOptions {
    StoreOptions::named("counter")
}

fn default_delay_ms() -> u64 {
    100
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            store: default_store(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl DemoConfig {
    /// Load config from CWD, or use defaults
    pub fn load() -> Self {
        if let Ok(content) = std::fs::read_to_string(CONFIG_FILE) {
            match toml::from_str(&content) {
                Ok(config) => {
                    log::info!("Loaded demo config from {}", CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    log::warn!("Failed to parse {}: {}", CONFIG_FILE, e);
                }
            }
        }

        log::debug!("Using default demo config");
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redux_store::Ownership;

    #[test]
    fn test_default_config() {
        let config = DemoConfig::default();
        assert_eq!(config.store.name, "counter");
        assert_eq!(config.delay_ms, 100);
    }

    #[test]
    fn test_config_deserialize() {
        let toml = r#"
            delay_ms = 5

            [store]
            name = "walkthrough"
            trace_actions = true
        "#;
        let config: DemoConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.delay_ms, 5);
        assert_eq!(config.store.name, "walkthrough");
        assert!(config.store.trace_actions);
        assert_eq!(config.store.ownership, Ownership::Thread);
    }

    #[test]
    fn test_config_deserialize_partial() {
        let config: DemoConfig = toml::from_str("delay_ms = 1").unwrap();
        assert_eq!(config.store, StoreOptions::named("counter"));
    }
}
