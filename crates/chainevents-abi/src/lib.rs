//! # chainevents-abi
//!
//! Event ABI codec: turns raw logs into named, typed fields.
//!
//! ## Implementation notes
//! - Uses `alloy-core` dyn-abi for topic and data decoding
//! - topics[0] → event selector (keccak256 of the canonical signature)
//! - topics[1..] → indexed parameters (each 32 bytes, ABI-encoded or hashed)
//! - `data` → non-indexed parameters (ABI-encoded parameter tuple)
//! - `trcToken` is accepted as an alias of `uint256`
//! - Records an event server already decoded are converted from JSON values

pub mod decoder;
pub mod normalizer;
pub mod registry;
pub mod selector;
pub mod server;
pub mod types;

pub use decoder::{decode, EventDecoder};
pub use registry::EventRegistry;
pub use selector::{keccak256, selector_for, to_hex};
pub use types::parse_param_type;
