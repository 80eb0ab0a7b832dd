//! Query values: what a caller asks for, and what comes back.

use crate::event::{DecodedEvent, RawLog};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Field an event listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderField {
    #[default]
    BlockTimestamp,
    BlockNumber,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// Ordering of a by-contract listing, wire form `"block_timestamp,asc"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrderBy {
    pub field: OrderField,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid order_by '{0}', expected '<block_timestamp|block_number>,<asc|desc>'")]
pub struct InvalidOrderBy(pub String);

impl OrderBy {
    pub fn asc(field: OrderField) -> Self {
        Self {
            field,
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: OrderField) -> Self {
        Self {
            field,
            direction: Direction::Desc,
        }
    }

    pub fn is_ascending(&self) -> bool {
        self.direction == Direction::Asc
    }

    /// Compare two events; `log_index` breaks ties.
    pub fn compare(&self, a: &DecodedEvent, b: &DecodedEvent) -> Ordering {
        let ord = match self.field {
            OrderField::BlockTimestamp => a.sort_key().cmp(&b.sort_key()),
            OrderField::BlockNumber => {
                (a.block_number, a.log_index).cmp(&(b.block_number, b.log_index))
            }
        };
        match self.direction {
            Direction::Asc => ord,
            Direction::Desc => ord.reverse(),
        }
    }

    /// Stable in-place sort.
    pub fn sort(&self, events: &mut [DecodedEvent]) {
        events.sort_by(|a, b| self.compare(a, b));
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match self.field {
            OrderField::BlockTimestamp => "block_timestamp",
            OrderField::BlockNumber => "block_number",
        };
        let dir = match self.direction {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        };
        write!(f, "{field},{dir}")
    }
}

impl FromStr for OrderBy {
    type Err = InvalidOrderBy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidOrderBy(s.to_string());
        let mut parts = s.split(',').map(str::trim);
        let field = match parts.next().ok_or_else(invalid)? {
            "block_timestamp" => OrderField::BlockTimestamp,
            "block_number" => OrderField::BlockNumber,
            _ => return Err(invalid()),
        };
        let direction = match parts.next() {
            None | Some("asc") => Direction::Asc,
            Some("desc") => Direction::Desc,
            Some(_) => return Err(invalid()),
        };
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self { field, direction })
    }
}

impl Serialize for OrderBy {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for OrderBy {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Caller-facing options of a by-contract query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventQueryOptions {
    /// Restrict to one event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderBy>,
    /// Parameter name → expected string value
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub filters: IndexMap<String, String>,
    /// Lowest block number to include
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since_block: Option<u64>,
    /// Lowest block timestamp (ms) to include
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since_timestamp: Option<i64>,
    /// Maximum number of events returned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// "Events emitted by contract Y", with optional constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractQuery {
    pub address: String,
    #[serde(flatten)]
    pub options: EventQueryOptions,
}

impl ContractQuery {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            options: EventQueryOptions::default(),
        }
    }

    pub fn with_options(address: impl Into<String>, options: EventQueryOptions) -> Self {
        Self {
            address: address.into(),
            options,
        }
    }

    pub fn event_name(mut self, name: impl Into<String>) -> Self {
        self.options.event_name = Some(name.into());
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.options.order_by = Some(order);
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.filters.insert(key.into(), value.into());
        self
    }

    pub fn since_block(mut self, block: u64) -> Self {
        self.options.since_block = Some(block);
        self
    }

    pub fn since_timestamp(mut self, ts: i64) -> Self {
        self.options.since_timestamp = Some(ts);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.options.limit = Some(limit);
        self
    }

    /// Effective ordering (default: ascending by block timestamp).
    pub fn ordering(&self) -> OrderBy {
        self.options.order_by.unwrap_or_default()
    }

    /// `true` if the raw log satisfies the block / timestamp lower bounds.
    pub fn admits(&self, log: &RawLog) -> bool {
        let block_ok = self
            .options
            .since_block
            .map_or(true, |b| log.block_number >= b);
        let ts_ok = self
            .options
            .since_timestamp
            .map_or(true, |t| log.block_timestamp >= t);
        block_ok && ts_ok
    }
}

/// A logical event query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventQuery {
    Transaction { transaction_id: String },
    Contract(ContractQuery),
}

impl EventQuery {
    pub fn transaction(tx_id: impl Into<String>) -> Self {
        Self::Transaction {
            transaction_id: tx_id.into(),
        }
    }

    pub fn contract(query: ContractQuery) -> Self {
        Self::Contract(query)
    }

    /// Client-side filters carried by the query (none for by-transaction).
    pub fn filters(&self) -> Option<&IndexMap<String, String>> {
        match self {
            EventQuery::Transaction { .. } => None,
            EventQuery::Contract(q) => Some(&q.options.filters),
        }
    }
}

/// One page of raw logs from a paginating source.
#[derive(Debug, Clone, Default)]
pub struct LogPage {
    pub logs: Vec<RawLog>,
    /// Opaque token for the following page; `None` on the last page
    pub next_page: Option<String>,
}

/// The answer to a one-shot query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventResult {
    pub data: Vec<DecodedEvent>,
}

impl EventResult {
    pub fn new(data: Vec<DecodedEvent>) -> Self {
        Self { data }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }
}
