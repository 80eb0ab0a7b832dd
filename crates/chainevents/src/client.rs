//! `EventClient`: the query service and watch controller behind one handle.

use std::sync::Arc;

use chainevents_abi::EventRegistry;
use chainevents_core::{
    ContractQuery, DecodedEvent, EventError, EventQuery, EventQueryOptions, EventResult,
    ResourceNode,
};
use chainevents_observability::EventMetrics;
use chainevents_query::EventQueryService;
use chainevents_watch::{WatchController, WatchHandle, WatchOptions};

use crate::config::{ConfigError, EventsConfig};

/// Entry point for applications.
#[derive(Debug, Clone)]
pub struct EventClient {
    service: EventQueryService,
    watcher: WatchController,
}

impl EventClient {
    /// Wrap an already assembled query service with default watch settings.
    pub fn new(service: EventQueryService) -> Self {
        let watcher = WatchController::new(service.clone());
        Self { service, watcher }
    }

    /// Build HTTP-backed sources for every configured backend.
    ///
    /// Does not initialise logging; call `init_tracing(&config.log)` first
    /// if wanted.
    pub fn from_config(
        config: &EventsConfig,
        registry: impl Into<Arc<EventRegistry>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let sources = &config.sources;
        let invalid = |e: chainevents_sources::TransportError| ConfigError::Invalid(e.to_string());

        let mut service = EventQueryService::new(registry).with_config(config.query.clone());
        for tier in sources.transaction_tiers().map_err(invalid)? {
            service = service.with_transaction_tier(tier);
        }
        if let Some(indexed) = sources.indexed(config.query.page_size).map_err(invalid)? {
            service = service.with_indexed(Arc::new(indexed));
        }

        let metrics = config.metrics.then(EventMetrics::global);
        if let Some(m) = &metrics {
            service = service.with_metrics(m.clone());
        }
        let mut watcher = WatchController::new(service.clone()).with_config(config.watch.clone());
        if let Some(m) = metrics {
            watcher = watcher.with_metrics(m);
        }

        tracing::info!(
            tiers = ?service.tiers(),
            indexed = service.has_indexed(),
            events = service.registry().len(),
            "event client ready"
        );
        Ok(Self { service, watcher })
    }

    /// `from_config` with the registry built from `config.abi_files`.
    pub fn from_config_files(config: &EventsConfig) -> Result<Self, ConfigError> {
        let registry = config.load_registry()?;
        Self::from_config(config, registry)
    }

    pub fn with_watch_config(mut self, config: chainevents_watch::WatchConfig) -> Self {
        self.watcher = self.watcher.with_config(config);
        self
    }

    pub fn service(&self) -> &EventQueryService {
        &self.service
    }

    pub fn watcher(&self) -> &WatchController {
        &self.watcher
    }

    pub fn registry(&self) -> &EventRegistry {
        self.service.registry()
    }

    pub async fn get_events_by_transaction_id(
        &self,
        tx_id: &str,
    ) -> Result<EventResult, EventError> {
        self.service.get_events_by_transaction_id(tx_id).await
    }

    /// Ask a single backend only.
    pub async fn get_events_by_transaction_id_from(
        &self,
        node: ResourceNode,
        tx_id: &str,
    ) -> Result<EventResult, EventError> {
        self.service
            .get_events_by_transaction_id_from(node, tx_id)
            .await
    }

    pub async fn get_events_by_contract_address(
        &self,
        address: &str,
        options: EventQueryOptions,
    ) -> Result<EventResult, EventError> {
        self.service
            .get_events_by_contract_address(address, options)
            .await
    }

    pub async fn get_events(&self, query: &ContractQuery) -> Result<EventResult, EventError> {
        self.service.get_events(query).await
    }

    /// Start a watch from now with the configured poll interval.
    pub fn watch<F>(&self, query: EventQuery, callback: F) -> WatchHandle
    where
        F: FnMut(&WatchHandle, Result<DecodedEvent, EventError>) + Send + 'static,
    {
        self.watcher.watch(query, callback)
    }

    pub fn watch_with<F>(&self, query: EventQuery, options: WatchOptions, callback: F) -> WatchHandle
    where
        F: FnMut(&WatchHandle, Result<DecodedEvent, EventError>) + Send + 'static,
    {
        self.watcher.watch_with(query, options, callback)
    }
}
