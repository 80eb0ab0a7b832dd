//! Backend endpoint configuration.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use chainevents_core::EventSource;

use crate::error::TransportError;
use crate::indexed::IndexedSource;
use crate::node::{ConfirmedSource, UnconfirmedSource};
use crate::retry::RetryConfig;
use crate::transport::{ReqwestTransport, TransportConfig};

/// Endpoints and HTTP settings for the three backends.
///
/// A backend without a URL is simply not configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Full node, e.g. "https://api.trongrid.io"
    #[serde(default)]
    pub full_node_url: Option<String>,
    /// Solidity node serving confirmed state
    #[serde(default)]
    pub solidity_node_url: Option<String>,
    /// Event server serving indexed history
    #[serde(default)]
    pub event_server_url: Option<String>,
    /// Sent as `TRON-PRO-API-KEY` on every request
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Retries for transient HTTP failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Initial retry backoff in milliseconds
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_request_timeout_ms() -> u64 { 30_000 }
fn default_max_retries() -> u32 { 3 }
fn default_backoff_ms() -> u64 { 100 }

impl Default for SourcesConfig {
    /// No backends, with the same HTTP settings a config file gets when
    /// it leaves them out.
    fn default() -> Self {
        Self {
            full_node_url: None,
            solidity_node_url: None,
            event_server_url: None,
            api_key: None,
            request_timeout_ms: default_request_timeout_ms(),
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl SourcesConfig {
    /// One host serving all three backends (the common hosted setup).
    pub fn single_host(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            full_node_url: Some(url.clone()),
            solidity_node_url: Some(url.clone()),
            event_server_url: Some(url),
            ..Self::default()
        }
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            retry: RetryConfig {
                max_retries: self.max_retries,
                initial_backoff: Duration::from_millis(self.backoff_ms),
                ..RetryConfig::default()
            },
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            api_key: self.api_key.clone(),
        }
    }

    fn transport(&self, url: &str) -> Result<Arc<ReqwestTransport>, TransportError> {
        Ok(Arc::new(ReqwestTransport::new(url, self.transport_config())?))
    }

    pub fn unconfirmed(&self) -> Result<Option<UnconfirmedSource>, TransportError> {
        match self.full_node_url.as_deref() {
            Some(url) => Ok(Some(UnconfirmedSource::new(self.transport(url)?))),
            None => Ok(None),
        }
    }

    pub fn confirmed(&self) -> Result<Option<ConfirmedSource>, TransportError> {
        match self.solidity_node_url.as_deref() {
            Some(url) => Ok(Some(ConfirmedSource::new(self.transport(url)?))),
            None => Ok(None),
        }
    }

    pub fn indexed(&self, page_size: usize) -> Result<Option<IndexedSource>, TransportError> {
        match self.event_server_url.as_deref() {
            Some(url) => {
                let source = IndexedSource::new(self.transport(url)?).with_page_size(page_size);
                Ok(Some(source))
            }
            None => Ok(None),
        }
    }

    /// Unconfirmed then confirmed: the default by-transaction tier order.
    pub fn transaction_tiers(&self) -> Result<Vec<Arc<dyn EventSource>>, TransportError> {
        let mut tiers: Vec<Arc<dyn EventSource>> = Vec::new();
        if let Some(src) = self.unconfirmed()? {
            tiers.push(Arc::new(src));
        }
        if let Some(src) = self.confirmed()? {
            tiers.push(Arc::new(src));
        }
        Ok(tiers)
    }
}
