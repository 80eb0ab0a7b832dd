//! The event query service.
//!
//! By-transaction lookups walk an ordered list of tiers (unconfirmed, then
//! confirmed, optionally indexed) once per call. By-contract listings go to
//! the indexed tier only, following its pages.

use std::sync::Arc;
use std::time::Instant;

use chainevents_abi::{EventDecoder, EventRegistry};
use chainevents_core::{
    ContractQuery, DecodedEvent, EventError, EventQueryOptions, EventResult, EventSource, RawLog,
    ResourceNode,
};
use chainevents_observability::EventMetrics;

use crate::config::QueryConfig;

/// Answers one-shot event queries against the configured backends.
///
/// Holds no per-query state; clones share the same sources and registry.
#[derive(Clone)]
pub struct EventQueryService {
    transaction_tiers: Vec<Arc<dyn EventSource>>,
    indexed: Option<Arc<dyn EventSource>>,
    registry: Arc<EventRegistry>,
    decoder: EventDecoder,
    config: QueryConfig,
    metrics: Option<EventMetrics>,
}

impl EventQueryService {
    pub fn new(registry: impl Into<Arc<EventRegistry>>) -> Self {
        Self {
            transaction_tiers: Vec::new(),
            indexed: None,
            registry: registry.into(),
            decoder: EventDecoder::new(),
            config: QueryConfig::default(),
            metrics: None,
        }
    }

    /// Append a tier to the by-transaction lookup order.
    pub fn with_transaction_tier(mut self, source: Arc<dyn EventSource>) -> Self {
        self.transaction_tiers.push(source);
        self
    }

    /// Set the source serving by-contract listings.
    pub fn with_indexed(mut self, source: Arc<dyn EventSource>) -> Self {
        self.indexed = Some(source);
        self
    }

    pub fn with_config(mut self, config: QueryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_metrics(mut self, metrics: EventMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn has_indexed(&self) -> bool {
        self.indexed.is_some()
    }

    /// Tiers consulted by `get_events_by_transaction_id`, in order.
    pub fn tiers(&self) -> Vec<ResourceNode> {
        self.transaction_lookup_order().map(|s| s.kind()).collect()
    }

    fn transaction_lookup_order(&self) -> impl Iterator<Item = &Arc<dyn EventSource>> {
        let indexed = self
            .indexed
            .iter()
            .filter(|_| self.config.include_indexed_in_transaction_lookup);
        self.transaction_tiers.iter().chain(indexed)
    }

    // ─── By transaction ──────────────────────────────────────────────────────

    /// Events emitted by one transaction.
    ///
    /// The first tier with a non-empty answer wins. A transaction unknown to
    /// every tier yields an empty result. `Unavailable` is returned only when
    /// no tier gave an authoritative answer.
    pub async fn get_events_by_transaction_id(
        &self,
        tx_id: &str,
    ) -> Result<EventResult, EventError> {
        let start = Instant::now();
        let mut last_unavailable: Option<EventError> = None;
        let mut answered = false;

        for tier in self.transaction_lookup_order() {
            let node = tier.kind();
            match tier.fetch_by_transaction(tx_id).await {
                Ok(logs) if logs.is_empty() => {
                    answered = true;
                    tracing::debug!(%node, tx_id, "no logs, trying next tier");
                }
                Ok(logs) => {
                    let data = self.decode_all(node, logs, None)?;
                    self.record_latency(start, "by_transaction");
                    return Ok(EventResult::new(data));
                }
                Err(e) if e.is_not_found() => {
                    answered = true;
                    tracing::debug!(%node, tx_id, "transaction not found, trying next tier");
                }
                Err(e @ EventError::Unavailable { .. }) => {
                    tracing::warn!(%node, tx_id, error = %e, "tier unavailable, trying next tier");
                    self.record_source_error(node, "unavailable");
                    last_unavailable = Some(e);
                }
                Err(e) => {
                    self.record_source_error(node, error_kind(&e));
                    return Err(e);
                }
            }
        }

        self.record_latency(start, "by_transaction");
        match last_unavailable {
            Some(e) if !answered => Err(e),
            _ => Ok(EventResult::default()),
        }
    }

    /// Events emitted by one transaction, asking only the tier of kind `node`.
    pub async fn get_events_by_transaction_id_from(
        &self,
        node: ResourceNode,
        tx_id: &str,
    ) -> Result<EventResult, EventError> {
        let tier = self
            .transaction_tiers
            .iter()
            .chain(self.indexed.iter())
            .find(|s| s.kind() == node)
            .ok_or(EventError::UnsupportedQuery {
                node,
                query: "by-transaction",
            })?;

        match tier.fetch_by_transaction(tx_id).await {
            Ok(logs) => Ok(EventResult::new(self.decode_all(node, logs, None)?)),
            Err(e) if e.is_not_found() => Ok(EventResult::default()),
            Err(e) => {
                self.record_source_error(node, error_kind(&e));
                Err(e)
            }
        }
    }

    // ─── By contract ─────────────────────────────────────────────────────────

    /// Events emitted by a contract, as listed by the indexed tier.
    pub async fn get_events_by_contract_address(
        &self,
        address: &str,
        options: EventQueryOptions,
    ) -> Result<EventResult, EventError> {
        self.get_events(&ContractQuery::with_options(address, options))
            .await
    }

    /// Run a by-contract query: paginate, decode, sort, filter, truncate.
    pub async fn get_events(&self, query: &ContractQuery) -> Result<EventResult, EventError> {
        let start = Instant::now();
        let source = self.indexed.as_ref().ok_or(EventError::UnsupportedQuery {
            node: ResourceNode::EventServer,
            query: "by-contract",
        })?;
        let node = source.kind();
        let opts = &query.options;

        if let Some(name) = &opts.event_name {
            if self.registry.all_by_name(name).is_empty() {
                tracing::warn!(
                    event = %name,
                    contract = %query.address,
                    "event name not in ABI, returning no events"
                );
                return Ok(EventResult::default());
            }
        }

        let mut data: Vec<DecodedEvent> = Vec::new();
        let mut token: Option<String> = None;
        let mut pages = 0usize;
        loop {
            let page = match source.fetch_by_contract(query, token.as_deref()).await {
                Ok(page) => page,
                Err(e) => {
                    self.record_source_error(node, error_kind(&e));
                    return Err(e);
                }
            };
            pages += 1;

            let decoded = self.decode_all(node, page.logs, opts.event_name.as_deref())?;
            data.extend(
                decoded
                    .into_iter()
                    .filter(|e| e.matches_filters(&opts.filters)),
            );

            token = page.next_page;
            if token.is_none() {
                break;
            }
            if opts.limit.is_some_and(|limit| data.len() >= limit) {
                break;
            }
            if pages >= self.config.max_pages {
                tracing::warn!(
                    contract = %query.address,
                    pages,
                    "page limit reached, result truncated"
                );
                break;
            }
        }

        query.ordering().sort(&mut data);
        if let Some(limit) = opts.limit {
            data.truncate(limit);
        }

        tracing::debug!(
            contract = %query.address,
            pages,
            events = data.len(),
            "contract query complete"
        );
        self.record_latency(start, "by_contract");
        Ok(EventResult::new(data))
    }

    // ─── Decoding ────────────────────────────────────────────────────────────

    /// Decode every log that resolves to a registry entry; when `event_name`
    /// is set only entries of that name are kept. Unresolved logs are dropped.
    fn decode_all(
        &self,
        node: ResourceNode,
        logs: Vec<RawLog>,
        event_name: Option<&str>,
    ) -> Result<Vec<DecodedEvent>, EventError> {
        let mut out = Vec::with_capacity(logs.len());
        for log in logs {
            let Some(entry) = self.registry.resolve(&log) else {
                tracing::debug!(
                    %node,
                    tx_id = %log.transaction_id,
                    log_index = log.log_index,
                    "no ABI entry for log, dropping"
                );
                if let Some(m) = &self.metrics {
                    m.record_dropped(node, "no_abi_entry");
                }
                continue;
            };
            if event_name.is_some_and(|name| entry.name != name) {
                continue;
            }

            match self.decoder.decode_log(entry, &log, node) {
                Ok(event) => {
                    if let Some(m) = &self.metrics {
                        m.record_decoded(node, &event.event_name);
                    }
                    out.push(event);
                }
                Err(e) => {
                    tracing::warn!(
                        %node,
                        event = %entry.name,
                        tx_id = %log.transaction_id,
                        error = %e,
                        "log does not match its ABI entry"
                    );
                    if let Some(m) = &self.metrics {
                        m.record_decode_error(node, &entry.name);
                    }
                    return Err(e.into());
                }
            }
        }
        Ok(out)
    }

    fn record_source_error(&self, node: ResourceNode, kind: &'static str) {
        if let Some(m) = &self.metrics {
            m.record_source_error(node, kind);
        }
    }

    fn record_latency(&self, start: Instant, operation: &'static str) {
        if let Some(m) = &self.metrics {
            m.record_latency(start.elapsed().as_secs_f64() * 1_000.0, operation);
        }
    }
}

fn error_kind(e: &EventError) -> &'static str {
    match e {
        EventError::Unavailable { .. } => "unavailable",
        EventError::NotFound { .. } => "not_found",
        EventError::Decoding(_) => "decoding",
        EventError::UnsupportedQuery { .. } => "unsupported_query",
    }
}

impl std::fmt::Debug for EventQueryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventQueryService")
            .field("tiers", &self.tiers())
            .field("indexed", &self.indexed.as_ref().map(|s| s.kind()))
            .field("events", &self.registry.len())
            .field("config", &self.config)
            .finish()
    }
}
