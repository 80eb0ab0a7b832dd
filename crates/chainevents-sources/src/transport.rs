//! The `HttpTransport` trait and its `reqwest` implementation.
//!
//! Source adapters only speak JSON over this trait, so a scripted mock can
//! stand in for a live node in tests.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::error::TransportError;
use crate::retry::{RetryConfig, RetryPolicy};

/// Header carrying the API key accepted by hosted TRON endpoints
/// (`TRON-PRO-API-KEY`; header names are case-insensitive).
pub const API_KEY_HEADER: &str = "tron-pro-api-key";

/// JSON-over-HTTP access to one backend.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` for use across Tokio tasks.
#[async_trait]
pub trait HttpTransport: Send + Sync + 'static {
    /// `GET {base}{path}?{query}` and parse the body as JSON.
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value, TransportError>;

    /// `POST {base}{path}` with a JSON body and parse the response as JSON.
    async fn post(&self, path: &str, body: &Value) -> Result<Value, TransportError>;

    /// Return the transport's base URL.
    fn base_url(&self) -> &str;
}

/// Configuration for `ReqwestTransport`.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub retry: RetryConfig,
    pub request_timeout: Duration,
    /// Sent as `TRON-PRO-API-KEY` when set
    pub api_key: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            request_timeout: Duration::from_secs(30),
            api_key: None,
        }
    }
}

enum Method<'a> {
    Get(&'a [(String, String)]),
    Post(&'a Value),
}

/// HTTP transport with a request timeout and retry for transient errors.
pub struct ReqwestTransport {
    base_url: String,
    http: reqwest::Client,
    retry: RetryPolicy,
    request_timeout: Duration,
}

impl ReqwestTransport {
    /// Create a transport for the given base URL.
    pub fn new(base_url: impl Into<String>, config: TransportConfig) -> Result<Self, TransportError> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(key) = &config.api_key {
            let value = reqwest::header::HeaderValue::from_str(key)
                .map_err(|e| TransportError::Http(format!("invalid API key header: {e}")))?;
            headers.insert(API_KEY_HEADER, value);
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            retry: RetryPolicy::new(config.retry),
            request_timeout: config.request_timeout,
        })
    }

    /// Create with default configuration.
    pub fn default_for(base_url: impl Into<String>) -> Result<Self, TransportError> {
        Self::new(base_url, TransportConfig::default())
    }

    fn map_reqwest(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout {
                ms: self.request_timeout.as_millis() as u64,
            }
        } else {
            TransportError::Http(e.to_string())
        }
    }

    async fn send_once(&self, path: &str, method: &Method<'_>) -> Result<Value, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        let req = match method {
            Method::Get(query) => self.http.get(&url).query(query),
            Method::Post(body) => self.http.post(&url).json(body),
        };

        let resp = req.send().await.map_err(|e| self.map_reqwest(e))?;

        if !resp.status().is_success() {
            let code = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Status { code, body });
        }

        let bytes = resp.bytes().await.map_err(|e| self.map_reqwest(e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn send(&self, path: &str, method: Method<'_>) -> Result<Value, TransportError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.send_once(path, &method).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() => match self.retry.next_delay(attempt) {
                    Some(delay) => {
                        tracing::warn!(
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            url = %self.base_url,
                            path,
                            "retrying request"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        tracing::error!(
                            attempt,
                            error = %e,
                            url = %self.base_url,
                            path,
                            "max retries exceeded"
                        );
                        return Err(e);
                    }
                },
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value, TransportError> {
        self.send(path, Method::Get(query)).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, TransportError> {
        self.send(path, Method::Post(body)).await
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
