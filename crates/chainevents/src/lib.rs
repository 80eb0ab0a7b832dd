//! # chainevents
//!
//! Retrieve and subscribe to TRON smart-contract events.
//!
//! - One-shot queries by transaction id (unconfirmed node, then confirmed
//!   node) or by contract address (event server).
//! - Polling watches delivering each new record once, oldest first.
//! - Logs decoded against the contract ABI into named, typed fields.
//!
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use chainevents::{EventClient, EventQueryOptions, EventRegistry, EventsConfig};
//!
//! let config = EventsConfig::from_file("chainevents.yaml")?;
//! let registry = EventRegistry::from_abi_json(&std::fs::read_to_string("token.abi.json")?)?;
//! let client = EventClient::from_config(&config, registry)?;
//!
//! let opts = EventQueryOptions {
//!     event_name: Some("Transfer".into()),
//!     limit: Some(20),
//!     ..Default::default()
//! };
//! for ev in client.get_events_by_contract_address("TXYZ", opts).await?.data {
//!     println!("{} {:?}", ev.event_name, ev.result);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;

pub use client::EventClient;
pub use config::{ConfigError, EventsConfig};

pub use chainevents_abi::{selector_for, EventDecoder, EventRegistry};
pub use chainevents_core::{
    ContractQuery, DecodeError, DecodedEvent, EventError, EventQuery, EventQueryOptions,
    EventResult, EventSource, FieldValue, OrderBy, OrderField, RawLog, ResourceNode, ResultType,
    ServerResult,
};
pub use chainevents_observability::{init_tracing, EventMetrics, LogConfig};
pub use chainevents_query::{EventQueryService, QueryConfig};
pub use chainevents_sources::{MemorySource, SourcesConfig};
pub use chainevents_watch::{
    EventCursor, WatchConfig, WatchController, WatchHandle, WatchOptions, WatchStart,
};
