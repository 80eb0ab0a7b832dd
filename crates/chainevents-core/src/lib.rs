//! # chainevents-core
//!
//! Core types, the error taxonomy, and the source trait shared across all
//! ChainEvents crates. Codec, sources, query service and watch controller
//! are all built on top of the interfaces defined here.

pub mod abi;
pub mod error;
pub mod event;
pub mod query;
pub mod source;
pub mod value;

pub use abi::{AbiParam, EventAbiEntry, ParamType, WORD_SIZE};
pub use error::{DecodeError, EventError};
pub use event::{
    parse_hex, parse_word, DecodedEvent, RawLog, ResourceNode, ResultType, ServerResult, Word,
};
pub use query::{
    ContractQuery, Direction, EventQuery, EventQueryOptions, EventResult, LogPage, OrderBy,
    OrderField,
};
pub use source::EventSource;
pub use value::FieldValue;
