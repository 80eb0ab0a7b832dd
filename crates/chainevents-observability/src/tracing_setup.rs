//! Tracing / logging initialisation helpers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
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
    pub components: HashMap<String, String>,
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
            components: HashMap::new(),
            json: false,
        }
    }
}

impl LogConfig {
    /// Filter directives, e.g. `"info,chainevents_watch=debug"`.
    ///
    /// Components are sorted so the string is stable.
    pub fn directives(&self) -> String {
        let mut components: Vec<_> = self.components.iter().collect();
        components.sort();

        let mut directives = self.level.clone();
        for (component, level) in components {
            directives.push_str(&format!(",{}={}", component.replace('-', "_"), level));
        }
        directives
    }
}

/// Initialise tracing with the given log config.
///
/// Should be called once at application startup; later calls fail with
/// `TryInitError` and leave the first subscriber in place. An invalid
/// directive string falls back to `info`.
pub fn init_tracing(config: &LogConfig) -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_new(config.directives()).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .try_init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_include_component_overrides() {
        let mut config = LogConfig::default();
        config.components.insert("chainevents-watch".into(), "debug".into());
        config.components.insert("chainevents-abi".into(), "warn".into());
        assert_eq!(
            config.directives(),
            "info,chainevents_abi=warn,chainevents_watch=debug"
        );
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: LogConfig = serde_json::from_str(r#"{"json": true}"#).unwrap();
        assert_eq!(config.level, "info");
        assert!(config.json);
    }

    #[test]
    fn second_init_is_rejected() {
        let config = LogConfig {
            level: "not a level ===".into(),
            ..LogConfig::default()
        };
        // Whichever call wins, the other must fail instead of panicking
        let first = init_tracing(&config);
        let second = init_tracing(&LogConfig::default());
        assert!(first.is_err() || second.is_err());
    }
}
