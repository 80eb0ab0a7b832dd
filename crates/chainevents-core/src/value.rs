//! Decoded field values.
//!
//! Every decoded parameter is represented as a [`FieldValue`]. Its `Display`
//! form is the string representation callers see and filters compare
//! against: integers in decimal, addresses and byte strings as `0x` hex.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A decoded event parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Uint(u128),
    /// Large uints (> u128) stored as decimal string
    BigUint(String),
    Int(i128),
    /// Large ints (> i128) stored as decimal string
    BigInt(String),
    Bool(bool),
    /// `0x` followed by 40 lowercase hex characters
    Address(String),
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    Str(String),
    /// Topic hash standing in for an indexed dynamic value
    Hash(String),
    Array(Vec<FieldValue>),
    Tuple(Vec<FieldValue>),
}

impl FieldValue {
    pub fn as_address(&self) -> Option<&str> {
        match self {
            FieldValue::Address(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Coerce to a u128 if this is a small Uint.
    pub fn as_u128(&self) -> Option<u128> {
        match self {
            FieldValue::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// String-equality match used by event filters.
    pub fn matches_str(&self, expected: &str) -> bool {
        self.to_string() == expected
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Uint(v) => write!(f, "{v}"),
            FieldValue::BigUint(v) => write!(f, "{v}"),
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::BigInt(v) => write!(f, "{v}"),
            FieldValue::Bool(v) => write!(f, "{v}"),
            FieldValue::Address(a) => write!(f, "{a}"),
            FieldValue::FixedBytes(b) | FieldValue::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            FieldValue::Str(s) => write!(f, "{s}"),
            FieldValue::Hash(h) => write!(f, "{h}"),
            FieldValue::Array(v) | FieldValue::Tuple(v) => {
                let parts: Vec<_> = v.iter().map(|x| x.to_string()).collect();
                write!(f, "[{}]", parts.join(","))
            }
        }
    }
}
