//! # chainevents-query
//!
//! One-shot event queries over the configured backends.
//!
//! - `get_events_by_transaction_id` walks the tier list (unconfirmed,
//!   confirmed, optionally indexed) once and returns the first non-empty
//!   answer.
//! - `get_events_by_contract_address` pages through the indexed tier, then
//!   sorts, filters and truncates client-side.

pub mod config;
pub mod service;

pub use config::QueryConfig;
pub use service::EventQueryService;
