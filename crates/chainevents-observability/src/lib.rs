//! # chainevents-observability
//!
//! OpenTelemetry-based observability for ChainEvents.
//!
//! ## Built-in metrics
//! - `chainevents.events_decoded`   : counter, tagged with node + event
//! - `chainevents.events_dropped`   : counter, tagged with node + reason
//! - `chainevents.decode_errors`    : counter, tagged with node + event
//! - `chainevents.source_errors`    : counter, tagged with node + error_type
//! - `chainevents.watch_ticks`      : counter, tagged with query kind
//! - `chainevents.query_latency_ms` : histogram, tagged with operation
//!
//! ## Structured logging
//! JSON-structured or human-readable logs; levels configurable per component.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::EventMetrics;
pub use tracing_setup::{init_tracing, LogConfig};
