//! # chainevents-sources
//!
//! Event source adapters. Each adapter implements
//! `chainevents_core::EventSource` for one backend:
//!
//! | Adapter | Backend | By transaction | By contract |
//! |---|---|---|---|
//! | `UnconfirmedSource` | full node | yes | no |
//! | `ConfirmedSource` | solidity node | yes | no |
//! | `IndexedSource` | event server | yes | yes (paginated) |
//! | `MemorySource` | in-process store | yes | yes |
//!
//! HTTP goes through the `HttpTransport` trait; `ReqwestTransport` is the
//! default implementation with timeout and retry.

pub mod config;
pub mod error;
pub mod indexed;
pub mod memory;
pub mod node;
pub mod retry;
pub mod transport;
pub mod wire;

pub use config::SourcesConfig;
pub use error::TransportError;
pub use indexed::IndexedSource;
pub use memory::MemorySource;
pub use node::{ConfirmedSource, UnconfirmedSource};
pub use retry::{RetryConfig, RetryPolicy};
pub use transport::{HttpTransport, ReqwestTransport, TransportConfig};
