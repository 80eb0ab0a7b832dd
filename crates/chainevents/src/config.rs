//! Aggregate configuration, loadable from YAML or JSON.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use chainevents_abi::EventRegistry;
use chainevents_core::DecodeError;
use chainevents_observability::LogConfig;
use chainevents_query::QueryConfig;
use chainevents_sources::SourcesConfig;
use chainevents_watch::WatchConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("ABI error in {path}: {source}")]
    Abi {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
}

/// Everything an `EventClient` needs, in one document.
///
/// ```yaml
/// sources:
///   full_node_url: https://api.trongrid.io
///   event_server_url: https://api.trongrid.io
/// watch:
///   poll_interval_ms: 3000
/// abi_files: [abi/token.json]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventsConfig {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub log: LogConfig,
    /// ABI JSON files whose events make up the registry.
    /// Relative paths resolve against the config file's directory.
    #[serde(default)]
    pub abi_files: Vec<PathBuf>,
    /// Record OpenTelemetry metrics through the global meter provider
    #[serde(default)]
    pub metrics: bool,
}

impl EventsConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_yaml::from_str(yaml)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from a `.json` file, or YAML for any other extension.
    ///
    /// Relative `abi_files` are rebased onto the file's directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = read(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let mut cfg = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::from_yaml_str(&content)?
        };

        if let Some(dir) = path.parent() {
            for abi in &mut cfg.abi_files {
                if abi.is_relative() {
                    *abi = dir.join(&*abi);
                }
            }
        }
        Ok(cfg)
    }

    /// Reject settings no backend could work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.sources;
        if s.full_node_url.is_none() && s.solidity_node_url.is_none() && s.event_server_url.is_none()
        {
            return Err(ConfigError::Invalid("no backend URL configured".into()));
        }
        if s.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid("sources.request_timeout_ms must be positive".into()));
        }
        if self.query.page_size == 0 {
            return Err(ConfigError::Invalid("query.page_size must be positive".into()));
        }
        if self.query.max_pages == 0 {
            return Err(ConfigError::Invalid("query.max_pages must be positive".into()));
        }
        if self.watch.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("watch.poll_interval_ms must be positive".into()));
        }
        Ok(())
    }

    /// Build a registry from every file in `abi_files`.
    pub fn load_registry(&self) -> Result<EventRegistry, ConfigError> {
        let mut registry = EventRegistry::default();
        for path in &self.abi_files {
            let content = read(path)?;
            let loaded = EventRegistry::from_abi_json(&content).map_err(|source| ConfigError::Abi {
                path: path.clone(),
                source,
            })?;
            tracing::debug!(path = %path.display(), events = loaded.len(), "loaded ABI file");
            registry.extend(loaded);
        }
        Ok(registry)
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_fills_defaults() {
        let cfg = EventsConfig::from_yaml_str(
            "sources:\n  event_server_url: http://127.0.0.1:8090\nwatch:\n  poll_interval_ms: 500\n",
        )
        .unwrap();
        assert_eq!(cfg.watch.poll_interval_ms, 500);
        assert_eq!(cfg.query, QueryConfig::default());
        assert_eq!(cfg.log.level, "info");
        assert!(!cfg.metrics);
    }

    #[test]
    fn json_is_accepted() {
        let cfg = EventsConfig::from_json_str(
            r#"{"sources":{"full_node_url":"http://127.0.0.1:8090"},"query":{"max_pages":3}}"#,
        )
        .unwrap();
        assert_eq!(cfg.query.max_pages, 3);
        assert_eq!(cfg.query.page_size, 200);
    }

    #[test]
    fn rejects_config_without_backends() {
        let err = EventsConfig::from_yaml_str("watch:\n  poll_interval_ms: 100\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let err = EventsConfig::from_yaml_str(
            "sources:\n  full_node_url: http://x\nwatch:\n  poll_interval_ms: 0\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("poll_interval_ms"));
    }

    #[test]
    fn rejects_zero_request_timeout() {
        let err = EventsConfig::from_yaml_str(
            "sources:\n  full_node_url: http://x\n  request_timeout_ms: 0\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("request_timeout_ms"));
    }

    #[test]
    fn programmatic_config_keeps_http_defaults() {
        let cfg = EventsConfig {
            sources: SourcesConfig {
                full_node_url: Some("http://127.0.0.1:8090".into()),
                ..SourcesConfig::default()
            },
            ..EventsConfig::default()
        };
        cfg.validate().unwrap();
        assert_eq!(cfg.sources.request_timeout_ms, 30_000);
        assert_eq!(cfg.sources.max_retries, 3);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = EventsConfig::from_file("/nonexistent/chainevents.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
