//! ChainEvents metrics definitions.
//!
//! All metrics use OpenTelemetry conventions.
//! They can be exported via OTLP to Prometheus, Grafana, Datadog, etc.

use chainevents_core::ResourceNode;
use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};

/// Central metrics handle for ChainEvents.
#[derive(Clone)]
pub struct EventMetrics {
    pub events_decoded: Counter<u64>,
    pub events_dropped: Counter<u64>,
    pub decode_errors: Counter<u64>,
    pub source_errors: Counter<u64>,
    pub watch_ticks: Counter<u64>,
    pub query_latency_ms: Histogram<f64>,
}

impl EventMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            events_decoded: meter
                .u64_counter("chainevents.events_decoded")
                .with_description("Total number of successfully decoded events")
                .build(),
            events_dropped: meter
                .u64_counter("chainevents.events_dropped")
                .with_description("Logs dropped for lack of a matching ABI entry")
                .build(),
            decode_errors: meter
                .u64_counter("chainevents.decode_errors")
                .with_description("Logs that disagreed with their ABI entry")
                .build(),
            source_errors: meter
                .u64_counter("chainevents.source_errors")
                .with_description("Backend requests that failed")
                .build(),
            watch_ticks: meter
                .u64_counter("chainevents.watch_ticks")
                .with_description("Poll iterations run by watch subscriptions")
                .build(),
            query_latency_ms: meter
                .f64_histogram("chainevents.query_latency_ms")
                .with_description("Time to answer a one-shot query in milliseconds")
                .build(),
        }
    }

    /// Metrics on the globally installed meter provider.
    pub fn global() -> Self {
        Self::new(&global::meter("chainevents"))
    }

    pub fn record_decoded(&self, node: ResourceNode, event: &str) {
        self.events_decoded.add(
            1,
            &[
                KeyValue::new("node", node.to_string()),
                KeyValue::new("event", event.to_string()),
            ],
        );
    }

    pub fn record_dropped(&self, node: ResourceNode, reason: &'static str) {
        self.events_dropped.add(
            1,
            &[
                KeyValue::new("node", node.to_string()),
                KeyValue::new("reason", reason),
            ],
        );
    }

    pub fn record_decode_error(&self, node: ResourceNode, event: &str) {
        self.decode_errors.add(
            1,
            &[
                KeyValue::new("node", node.to_string()),
                KeyValue::new("event", event.to_string()),
            ],
        );
    }

    pub fn record_source_error(&self, node: ResourceNode, error_type: &'static str) {
        self.source_errors.add(
            1,
            &[
                KeyValue::new("node", node.to_string()),
                KeyValue::new("error_type", error_type),
            ],
        );
    }

    pub fn record_watch_tick(&self, query_kind: &'static str) {
        self.watch_ticks
            .add(1, &[KeyValue::new("query", query_kind)]);
    }

    pub fn record_latency(&self, ms: f64, operation: &'static str) {
        self.query_latency_ms
            .record(ms, &[KeyValue::new("operation", operation)]);
    }
}

impl std::fmt::Debug for EventMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventMetrics").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_on_noop_meter_is_harmless() {
        // No provider installed: the global meter is a no-op
        let metrics = EventMetrics::global();
        metrics.record_decoded(ResourceNode::FullNode, "SomeEvent");
        metrics.record_dropped(ResourceNode::EventServer, "no_abi_entry");
        metrics.record_decode_error(ResourceNode::SolidityNode, "SomeEvent");
        metrics.record_source_error(ResourceNode::FullNode, "unavailable");
        metrics.record_watch_tick("contract");
        metrics.record_latency(1.5, "by_transaction");
    }
}
