//! Indexed-historical source backed by an event server.
//!
//! The only source that lists events by contract. Results lag the chain
//! head by the server's indexing delay and are paginated with an opaque
//! `fingerprint` token.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use chainevents_core::{ContractQuery, EventError, EventSource, LogPage, RawLog, ResourceNode};

use crate::transport::HttpTransport;
use crate::wire::EventServerPage;

const NODE: ResourceNode = ResourceNode::EventServer;

/// Upper bound on pages followed for one transaction lookup.
const MAX_TRANSACTION_PAGES: usize = 20;

/// Event-server source.
#[derive(Clone)]
pub struct IndexedSource {
    transport: Arc<dyn HttpTransport>,
    page_size: usize,
}

impl IndexedSource {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            page_size: 200,
        }
    }

    /// Records requested per page (`limit` on the wire).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Ids spliced into a request path: transaction hashes and hex or
    /// base58 addresses, never anything that changes the path.
    fn path_segment<'a>(value: &'a str, what: &str) -> Result<&'a str, EventError> {
        if !value.is_empty() && value.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Ok(value);
        }
        tracing::debug!(%value, "refusing non-alphanumeric path segment");
        Err(EventError::not_found(NODE, format!("{what} (not a valid id)")))
    }

    async fn fetch_page(
        &self,
        path: &str,
        params: &[(String, String)],
        what: &str,
    ) -> Result<EventServerPage, EventError> {
        let resp: Value = self
            .transport
            .get(path, params)
            .await
            .map_err(|e| e.into_event_error(NODE, what))?;

        let page: EventServerPage = serde_json::from_value(resp)
            .map_err(|e| EventError::unavailable(NODE, format!("malformed event page: {e}")))?;
        if let Some(reason) = page.failure() {
            return Err(EventError::unavailable(NODE, reason));
        }
        Ok(page)
    }

    /// Wire parameters for a by-contract page request.
    pub fn contract_params(&self, query: &ContractQuery, page_token: Option<&str>) -> Vec<(String, String)> {
        let opts = &query.options;
        let limit = opts.limit.map_or(self.page_size, |l| l.min(self.page_size));

        let mut params = vec![
            ("order_by".to_string(), query.ordering().to_string()),
            ("limit".to_string(), limit.to_string()),
        ];
        if let Some(name) = &opts.event_name {
            params.push(("event_name".to_string(), name.clone()));
        }
        if let Some(ts) = opts.since_timestamp {
            params.push(("min_block_timestamp".to_string(), ts.to_string()));
        }
        if let Some(block) = opts.since_block {
            params.push(("block_number".to_string(), block.to_string()));
        }
        if let Some(token) = page_token {
            params.push(("fingerprint".to_string(), token.to_string()));
        }
        params
    }
}

#[async_trait]
impl EventSource for IndexedSource {
    fn kind(&self) -> ResourceNode {
        NODE
    }

    async fn fetch_by_transaction(&self, tx_id: &str) -> Result<Vec<RawLog>, EventError> {
        let what = format!("transaction {tx_id}");
        let path = format!("/v1/transactions/{}/events", Self::path_segment(tx_id, &what)?);

        let mut logs = Vec::new();
        let mut token: Option<String> = None;
        for _ in 0..MAX_TRANSACTION_PAGES {
            let mut params = vec![("limit".to_string(), self.page_size.to_string())];
            if let Some(t) = &token {
                params.push(("fingerprint".to_string(), t.clone()));
            }
            let page = self.fetch_page(&path, &params, &what).await?;
            token = page.next_page();
            logs.extend(page.into_raw_logs()?);
            if token.is_none() {
                break;
            }
        }

        if logs.is_empty() {
            return Err(EventError::not_found(NODE, what));
        }
        Ok(logs)
    }

    async fn fetch_by_contract(
        &self,
        query: &ContractQuery,
        page_token: Option<&str>,
    ) -> Result<LogPage, EventError> {
        let what = format!("contract {}", query.address);
        let path = format!(
            "/v1/contracts/{}/events",
            Self::path_segment(&query.address, &what)?
        );
        let params = self.contract_params(query, page_token);

        let page = self.fetch_page(&path, &params, &what).await?;
        let next_page = page.next_page();
        let logs: Vec<RawLog> = page
            .into_raw_logs()?
            .into_iter()
            .filter(|log| query.admits(log))
            .collect();

        tracing::debug!(
            contract = %query.address,
            logs = logs.len(),
            has_next = next_page.is_some(),
            "fetched event page"
        );
        Ok(LogPage { logs, next_page })
    }

    fn supports_contract_queries(&self) -> bool {
        true
    }
}
