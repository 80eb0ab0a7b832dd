//! Raw and decoded event types.

use crate::error::DecodeError;
use crate::value::FieldValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte topic word.
pub type Word = [u8; 32];

/// The backend that produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceNode {
    /// Unconfirmed-state node
    FullNode,
    /// Confirmed-state node
    SolidityNode,
    /// Indexed-historical service
    EventServer,
    /// In-process log store
    Memory,
}

impl fmt::Display for ResourceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceNode::FullNode => "fullNode",
            ResourceNode::SolidityNode => "solidityNode",
            ResourceNode::EventServer => "eventServer",
            ResourceNode::Memory => "memory",
        };
        write!(f, "{s}")
    }
}

/// One on-chain log emission as reported by one backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLog {
    /// Emitting contract address, as reported by the backend
    pub address: String,
    /// topics[0] is the selector for non-anonymous events
    #[serde(with = "hex_words")]
    pub topics: Vec<Word>,
    /// ABI-encoded non-indexed parameters
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    pub block_number: u64,
    /// Block timestamp in milliseconds; 0 when the backend does not report it
    #[serde(default)]
    pub block_timestamp: i64,
    pub transaction_id: String,
    /// Position of the log within its transaction
    pub log_index: u32,
    /// Values the backend decoded itself, for records served without
    /// topics and data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_result: Option<ServerResult>,
}

impl RawLog {
    /// topics[0], if present.
    pub fn selector_topic(&self) -> Option<&Word> {
        self.topics.first()
    }
}

/// An event an indexed backend has already decoded: its name and the
/// parameter values as JSON, keyed by parameter name (or position).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerResult {
    pub event_name: String,
    pub values: IndexMap<String, serde_json::Value>,
}

/// How the `result` of a [`DecodedEvent`] was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    /// Record served by the indexed-historical backend
    Indexed,
    /// Record decoded from a node's transaction info
    Decoded,
}

impl ResultType {
    pub fn for_node(node: ResourceNode) -> Self {
        match node {
            ResourceNode::EventServer => ResultType::Indexed,
            ResourceNode::FullNode | ResourceNode::SolidityNode | ResourceNode::Memory => {
                ResultType::Decoded
            }
        }
    }
}

/// A fully decoded event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedEvent {
    pub event_name: String,
    pub contract_address: String,
    pub transaction_id: String,
    pub block_number: u64,
    pub block_timestamp: i64,
    pub log_index: u32,
    pub result_type: ResultType,
    /// Parameter name → value, in ABI declaration order
    pub result: IndexMap<String, FieldValue>,
    /// Parameter name → canonical ABI type
    pub result_types: IndexMap<String, String>,
    pub resource_node: ResourceNode,
}

impl DecodedEvent {
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.result.get(name)
    }

    /// Ordering key: `(block_timestamp, log_index)`.
    pub fn sort_key(&self) -> (i64, u32) {
        (self.block_timestamp, self.log_index)
    }

    /// `true` iff `result[key]` string-equals `value` for every filter entry.
    /// A key that the event does not declare never matches.
    pub fn matches_filters(&self, filters: &IndexMap<String, String>) -> bool {
        filters.iter().all(|(key, expected)| {
            self.result
                .get(key)
                .map(|v| v.matches_str(expected))
                .unwrap_or(false)
        })
    }
}

/// Parse a `0x`-optional hex string into a 32-byte word.
pub fn parse_word(s: &str) -> Result<Word, DecodeError> {
    let bytes = parse_hex(s)?;
    bytes.try_into().map_err(|b: Vec<u8>| DecodeError::InvalidHex {
        reason: format!("expected 32-byte word, got {} bytes", b.len()),
    })
}

/// Parse a `0x`-optional hex string into bytes.
pub fn parse_hex(s: &str) -> Result<Vec<u8>, DecodeError> {
    let hex = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(hex).map_err(|e| DecodeError::InvalidHex {
        reason: format!("'{s}': {e}"),
    })
}

mod hex_words {
    use super::Word;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(words: &[Word], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(words.iter().map(|w| format!("0x{}", hex::encode(w))))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Word>, D::Error> {
        let raw = Vec::<String>::deserialize(d)?;
        raw.iter()
            .map(|s| super::parse_word(s).map_err(D::Error::custom))
            .collect()
    }
}

mod hex_bytes {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_hex(&raw).map_err(D::Error::custom)
    }
}
