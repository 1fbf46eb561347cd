//! Tracing / logging initialisation helpers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter,
};

/// Log level per component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Global default level: "trace" | "debug" | "info" | "warn" | "error"
    #[serde(default = "default_level")]
    pub level: String,
    /// Override per component: component_name → level
    #[serde(default)]
    pub components: BTreeMap<String, String>,
    /// Emit JSON structured logs (true) or human-readable text (false)
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            components: BTreeMap::new(),
            json: false,
        }
    }
}

impl LogConfig {
    /// `EnvFilter` directives, e.g. `"info,chainledger_evm=debug"`.
    pub fn directives(&self) -> String {
        let mut directives = self.level.clone();
        for (component, level) in &self.components {
            directives.push_str(&format!(",{}={}", component.replace('-', "_"), level));
        }
        directives
    }
}

/// Install the global subscriber. Call once at application startup; a
/// second call returns an error and leaves the first subscriber in place.
pub fn init_tracing(config: &LogConfig) -> Result<(), TryInitError> {
    let directives = config.directives();
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .try_init()?;
    }
    tracing::debug!(%directives, json = config.json, "tracing initialised");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_include_component_overrides() {
        let config: LogConfig = serde_json::from_str(
            r#"{"level": "warn", "components": {"chainledger-evm": "debug", "chainledger-core": "trace"}}"#,
        )
        .unwrap();
        assert_eq!(
            config.directives(),
            "warn,chainledger_core=trace,chainledger_evm=debug"
        );
        assert!(!config.json);
    }

    #[test]
    fn empty_config_defaults_to_info() {
        let config: LogConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, LogConfig::default());
        assert_eq!(config.directives(), "info");
    }

    #[test]
    fn second_init_is_an_error() {
        let config = LogConfig::default();
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }
}
