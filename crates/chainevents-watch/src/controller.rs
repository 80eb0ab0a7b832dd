//! `WatchController`: polling subscriptions over the query service.
//!
//! Each watch owns one Tokio task that polls, filters against its cursor,
//! and invokes the callback for every new record in ascending order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chainevents_core::{
    ContractQuery, DecodedEvent, EventError, EventQuery, EventResult, OrderBy, OrderField,
};
use chainevents_observability::EventMetrics;
use chainevents_query::EventQueryService;
use tracing::{debug, info, warn};

use crate::config::{WatchConfig, WatchOptions, WatchStart};
use crate::cursor::EventCursor;
use crate::handle::WatchHandle;

static NEXT_WATCH_ID: AtomicU64 = AtomicU64::new(1);

/// Starts and drives watches.
#[derive(Debug, Clone)]
pub struct WatchController {
    service: EventQueryService,
    config: WatchConfig,
    metrics: Option<EventMetrics>,
}

impl WatchController {
    pub fn new(service: EventQueryService) -> Self {
        Self {
            service,
            config: WatchConfig::default(),
            metrics: None,
        }
    }

    pub fn with_config(mut self, config: WatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_metrics(mut self, metrics: EventMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    pub fn service(&self) -> &EventQueryService {
        &self.service
    }

    /// Start a watch with default options. Returns immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn watch<F>(&self, query: EventQuery, callback: F) -> WatchHandle
    where
        F: FnMut(&WatchHandle, Result<DecodedEvent, EventError>) + Send + 'static,
    {
        self.watch_with(query, WatchOptions::default(), callback)
    }

    /// Start a watch with explicit start position and poll interval.
    pub fn watch_with<F>(&self, query: EventQuery, options: WatchOptions, callback: F) -> WatchHandle
    where
        F: FnMut(&WatchHandle, Result<DecodedEvent, EventError>) + Send + 'static,
    {
        let id = NEXT_WATCH_ID.fetch_add(1, Ordering::Relaxed);
        let interval = options
            .poll_interval
            .unwrap_or_else(|| self.config.poll_interval());
        let cursor = initial_cursor(&query, options.start);

        let handle = WatchHandle::new(id, query, interval, cursor.clone());
        info!(
            watch_id = id,
            query = ?handle.query(),
            poll_interval_ms = interval.as_millis() as u64,
            from_timestamp = cursor.block_timestamp,
            "watch started"
        );

        let worker = WatchWorker {
            service: self.service.clone(),
            metrics: self.metrics.clone(),
            handle: handle.clone(),
            cursor,
        };
        handle.attach(tokio::spawn(worker.run(callback)));
        handle
    }
}

fn initial_cursor(query: &EventQuery, start: WatchStart) -> EventCursor {
    match (start, query) {
        (WatchStart::FromTimestamp(ts), _) => EventCursor::at(ts),
        (WatchStart::Now, EventQuery::Transaction { .. }) => EventCursor::at(i64::MIN),
        (WatchStart::Now, EventQuery::Contract(_)) => EventCursor::at(now_ms()),
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as i64)
}

struct WatchWorker {
    service: EventQueryService,
    metrics: Option<EventMetrics>,
    handle: WatchHandle,
    cursor: EventCursor,
}

impl WatchWorker {
    async fn run<F>(mut self, mut callback: F)
    where
        F: FnMut(&WatchHandle, Result<DecodedEvent, EventError>),
    {
        let id = self.handle.id();
        let interval = self.handle.poll_interval();
        let query = self.handle.query().clone();

        while self.handle.is_active() {
            if let Some(m) = &self.metrics {
                m.record_watch_tick(query_kind(&query));
            }

            let outcome = self.poll(&query).await;
            if !self.handle.is_active() {
                debug!(watch_id = id, "stopped during poll, discarding results");
                break;
            }

            match outcome {
                Ok(result) => self.deliver(result, &mut callback),
                Err(e) => {
                    warn!(watch_id = id, error = %e, "watch poll failed");
                    callback(&self.handle, Err(e));
                }
            }

            if !self.sleep(interval).await {
                break;
            }
        }

        info!(
            watch_id = id,
            cursor = self.cursor.block_timestamp,
            "watch stopped"
        );
    }

    async fn poll(&self, query: &EventQuery) -> Result<EventResult, EventError> {
        match query {
            EventQuery::Transaction { transaction_id } => {
                self.service
                    .get_events_by_transaction_id(transaction_id)
                    .await
            }
            EventQuery::Contract(q) => self.service.get_events(&self.tick_query(q)).await,
        }
    }

    /// The caller's query, narrowed to records at or after the cursor and
    /// forced into ascending timestamp order.
    ///
    /// A caller limit is widened by the records already delivered at the
    /// cursor timestamp, so a tick always has room for at least `limit`
    /// new records even when more than `limit` records share a timestamp.
    fn tick_query(&self, query: &ContractQuery) -> ContractQuery {
        let mut q = query.clone();
        let since = q
            .options
            .since_timestamp
            .map_or(self.cursor.block_timestamp, |ts| ts.max(self.cursor.block_timestamp));
        q.options.since_timestamp = Some(since);
        q.options.order_by = Some(OrderBy::asc(OrderField::BlockTimestamp));
        q.options.limit = q
            .options
            .limit
            .map(|limit| limit.saturating_add(self.cursor.delivered_at_cursor()));
        q
    }

    fn deliver<F>(&mut self, result: EventResult, callback: &mut F)
    where
        F: FnMut(&WatchHandle, Result<DecodedEvent, EventError>),
    {
        let mut fresh: Vec<DecodedEvent> = result
            .data
            .into_iter()
            .filter(|e| self.cursor.is_new(e))
            .collect();
        fresh.sort_by_key(DecodedEvent::sort_key);

        for event in fresh {
            if !self.handle.is_active() {
                return;
            }
            self.cursor.advance(&event);
            self.handle.publish_cursor(&self.cursor);
            callback(&self.handle, Ok(event));
        }
    }

    /// `false` if woken by `stop()`.
    async fn sleep(&self, interval: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(interval) => self.handle.is_active(),
            _ = self.handle.stopped() => false,
        }
    }
}

fn query_kind(query: &EventQuery) -> &'static str {
    match query {
        EventQuery::Transaction { .. } => "transaction",
        EventQuery::Contract(_) => "contract",
    }
}
