//! In-memory `EventSource` implementation.
//!
//! Suitable for testing and embedded deployments. Logs are pushed in by the
//! caller; `set_available(false)` makes every fetch fail as `Unavailable`.
//! Thread-safe via `Arc<RwLock<Inner>>`.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use chainevents_core::{ContractQuery, EventError, EventSource, LogPage, RawLog, ResourceNode};

struct Inner {
    logs: Vec<RawLog>,
    /// Transactions known to the store, including ones without logs
    known_txs: HashSet<String>,
    available: bool,
}

/// Thread-safe in-memory log store.
#[derive(Clone)]
pub struct MemorySource {
    kind: ResourceNode,
    page_size: usize,
    inner: Arc<RwLock<Inner>>,
}

impl MemorySource {
    /// Create an empty store reporting itself as `kind`.
    pub fn new(kind: ResourceNode) -> Self {
        Self {
            kind,
            page_size: 200,
            inner: Arc::new(RwLock::new(Inner {
                logs: Vec::new(),
                known_txs: HashSet::new(),
                available: true,
            })),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Add a log; its transaction becomes known.
    pub fn push(&self, log: RawLog) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.known_txs.insert(log.transaction_id.clone());
        inner.logs.push(log);
    }

    pub fn extend(&self, logs: impl IntoIterator<Item = RawLog>) {
        for log in logs {
            self.push(log);
        }
    }

    /// Mark a transaction as known even if it emitted nothing.
    pub fn add_transaction(&self, tx_id: impl Into<String>) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.known_txs.insert(tx_id.into());
    }

    /// Simulate an outage (`false`) or recovery (`true`).
    pub fn set_available(&self, available: bool) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .available = available;
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.logs.clear();
        inner.known_txs.clear();
    }

    fn check_available(&self, inner: &Inner) -> Result<(), EventError> {
        if inner.available {
            Ok(())
        } else {
            Err(EventError::unavailable(self.kind, "memory source marked unavailable"))
        }
    }
}

#[async_trait]
impl EventSource for MemorySource {
    fn kind(&self) -> ResourceNode {
        self.kind
    }

    async fn fetch_by_transaction(&self, tx_id: &str) -> Result<Vec<RawLog>, EventError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        self.check_available(&inner)?;
        if !inner.known_txs.contains(tx_id) {
            return Err(EventError::not_found(self.kind, format!("transaction {tx_id}")));
        }
        Ok(inner
            .logs
            .iter()
            .filter(|l| l.transaction_id == tx_id)
            .cloned()
            .collect())
    }

    /// Pages are offsets into the matching logs ordered by
    /// `(block_timestamp, log_index)`; the token is the next offset.
    async fn fetch_by_contract(
        &self,
        query: &ContractQuery,
        page_token: Option<&str>,
    ) -> Result<LogPage, EventError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        self.check_available(&inner)?;

        let offset = match page_token {
            Some(t) => t.parse::<usize>().map_err(|_| {
                EventError::unavailable(self.kind, format!("invalid page token '{t}'"))
            })?,
            None => 0,
        };

        let mut matching: Vec<&RawLog> = inner
            .logs
            .iter()
            .filter(|l| l.address.eq_ignore_ascii_case(&query.address) && query.admits(l))
            .collect();
        matching.sort_by_key(|l| (l.block_timestamp, l.log_index));

        let end = (offset + self.page_size).min(matching.len());
        let logs = matching
            .get(offset..end)
            .unwrap_or_default()
            .iter()
            .map(|l| (*l).clone())
            .collect();
        let next_page = (end < matching.len()).then(|| end.to_string());
        Ok(LogPage { logs, next_page })
    }

    fn supports_contract_queries(&self) -> bool {
        true
    }
}
