//! Event ABI entries and the closed set of ABI parameter types.
//!
//! Each parameter type determines both the canonical signature fragment and
//! the decoding rule. Everything is an exhaustive `match` on [`ParamType`];
//! there is no runtime type inspection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of one ABI slot / topic in bytes.
pub const WORD_SIZE: usize = 32;

/// An ABI parameter type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    /// `uint<bits>`
    Uint(u16),
    /// `int<bits>`
    Int(u16),
    /// 20-byte account address
    Address,
    Bool,
    /// `bytes<len>` (1..=32)
    FixedBytes(u8),
    /// Variable-length `bytes`
    Bytes,
    String,
    /// `T[]`
    Array(Box<ParamType>),
    /// `T[N]`
    FixedArray(Box<ParamType>, usize),
    /// `(T1,T2,...)`
    Tuple(Vec<ParamType>),
}

impl ParamType {
    /// Returns `true` if the type uses the offset + length (tail) encoding.
    pub fn is_dynamic(&self) -> bool {
        match self {
            ParamType::Bytes | ParamType::String | ParamType::Array(_) => true,
            ParamType::FixedArray(elem, _) => elem.is_dynamic(),
            ParamType::Tuple(fields) => fields.iter().any(ParamType::is_dynamic),
            ParamType::Uint(_)
            | ParamType::Int(_)
            | ParamType::Address
            | ParamType::Bool
            | ParamType::FixedBytes(_) => false,
        }
    }

    /// Number of bytes this type occupies in the head of an ABI encoding.
    /// Dynamic types take a single offset slot.
    pub fn head_size(&self) -> usize {
        if self.is_dynamic() {
            return WORD_SIZE;
        }
        match self {
            ParamType::FixedArray(elem, len) => elem.head_size() * len,
            ParamType::Tuple(fields) => fields.iter().map(ParamType::head_size).sum(),
            _ => WORD_SIZE,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Uint(bits) => write!(f, "uint{bits}"),
            ParamType::Int(bits) => write!(f, "int{bits}"),
            ParamType::Address => write!(f, "address"),
            ParamType::Bool => write!(f, "bool"),
            ParamType::FixedBytes(n) => write!(f, "bytes{n}"),
            ParamType::Bytes => write!(f, "bytes"),
            ParamType::String => write!(f, "string"),
            ParamType::Array(elem) => write!(f, "{elem}[]"),
            ParamType::FixedArray(elem, len) => write!(f, "{elem}[{len}]"),
            ParamType::Tuple(fields) => {
                let parts: Vec<_> = fields.iter().map(|t| t.to_string()).collect();
                write!(f, "({})", parts.join(","))
            }
        }
    }
}

/// One declared event parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParam {
    pub name: String,
    pub ty: ParamType,
    /// Carried in a topic rather than in the data payload.
    pub indexed: bool,
}

impl AbiParam {
    pub fn new(name: impl Into<String>, ty: ParamType, indexed: bool) -> Self {
        Self {
            name: name.into(),
            ty,
            indexed,
        }
    }
}

/// An event entry of a contract ABI. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAbiEntry {
    pub name: String,
    pub params: Vec<AbiParam>,
    #[serde(default)]
    pub anonymous: bool,
}

impl EventAbiEntry {
    pub fn new(name: impl Into<String>, params: Vec<AbiParam>) -> Self {
        Self {
            name: name.into(),
            params,
            anonymous: false,
        }
    }

    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    /// Canonical signature, e.g. `"Transfer(address,address,uint256)"`.
    pub fn signature(&self) -> String {
        let types: Vec<_> = self.params.iter().map(|p| p.ty.to_string()).collect();
        format!("{}({})", self.name, types.join(","))
    }

    /// Indexed parameters in declaration order.
    pub fn indexed_params(&self) -> impl Iterator<Item = &AbiParam> {
        self.params.iter().filter(|p| p.indexed)
    }

    /// Non-indexed parameters in declaration order.
    pub fn data_params(&self) -> impl Iterator<Item = &AbiParam> {
        self.params.iter().filter(|p| !p.indexed)
    }

    pub fn indexed_count(&self) -> usize {
        self.indexed_params().count()
    }

    /// Number of topics a well-formed log of this event carries.
    pub fn expected_topic_count(&self) -> usize {
        if self.anonymous {
            self.indexed_count()
        } else {
            self.indexed_count() + 1
        }
    }

    /// Static head size of the data payload.
    pub fn data_head_size(&self) -> usize {
        self.data_params().map(|p| p.ty.head_size()).sum()
    }

    /// Returns `true` if any non-indexed parameter is dynamically sized.
    pub fn has_dynamic_data(&self) -> bool {
        self.data_params().any(|p| p.ty.is_dynamic())
    }
}
