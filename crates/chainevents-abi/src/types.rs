//! Conversions between `ParamType`, ABI type strings, and alloy `DynSolType`.

use alloy_core::dyn_abi::DynSolType;
use chainevents_core::{DecodeError, ParamType};

/// TRON's token-id parameter type; ABI-encoded exactly like `uint256`.
const TRC_TOKEN: &str = "trcToken";

/// Parse an ABI type string (`"uint256"`, `"address[]"`, `"(bool,bytes32)[2]"`).
pub fn parse_param_type(s: &str) -> Result<ParamType, DecodeError> {
    let normalized = s.trim().replace(TRC_TOKEN, "uint256");
    let dyn_ty = DynSolType::parse(&normalized).map_err(|e| DecodeError::UnsupportedType {
        ty: format!("{s}: {e}"),
    })?;
    from_dyn(&dyn_ty)
}

/// Build a `ParamType` from an alloy `DynSolType`.
pub fn from_dyn(ty: &DynSolType) -> Result<ParamType, DecodeError> {
    match ty {
        DynSolType::Bool => Ok(ParamType::Bool),
        DynSolType::Int(bits) => Ok(ParamType::Int(*bits as u16)),
        DynSolType::Uint(bits) => Ok(ParamType::Uint(*bits as u16)),
        DynSolType::FixedBytes(n) => Ok(ParamType::FixedBytes(*n as u8)),
        DynSolType::Address => Ok(ParamType::Address),
        DynSolType::Bytes => Ok(ParamType::Bytes),
        DynSolType::String => Ok(ParamType::String),
        DynSolType::Array(elem) => Ok(ParamType::Array(Box::new(from_dyn(elem)?))),
        DynSolType::FixedArray(elem, len) => {
            Ok(ParamType::FixedArray(Box::new(from_dyn(elem)?), *len))
        }
        DynSolType::Tuple(fields) => {
            let fields: Result<Vec<_>, _> = fields.iter().map(from_dyn).collect();
            Ok(ParamType::Tuple(fields?))
        }
        // `function` values never appear in event logs
        other => Err(DecodeError::UnsupportedType {
            ty: other.sol_type_name().into_owned(),
        }),
    }
}

/// Build the alloy `DynSolType` that decodes a `ParamType`.
pub fn to_dyn(ty: &ParamType) -> DynSolType {
    match ty {
        ParamType::Uint(bits) => DynSolType::Uint(*bits as usize),
        ParamType::Int(bits) => DynSolType::Int(*bits as usize),
        ParamType::Address => DynSolType::Address,
        ParamType::Bool => DynSolType::Bool,
        ParamType::FixedBytes(n) => DynSolType::FixedBytes(*n as usize),
        ParamType::Bytes => DynSolType::Bytes,
        ParamType::String => DynSolType::String,
        ParamType::Array(elem) => DynSolType::Array(Box::new(to_dyn(elem))),
        ParamType::FixedArray(elem, len) => DynSolType::FixedArray(Box::new(to_dyn(elem)), *len),
        ParamType::Tuple(fields) => DynSolType::Tuple(fields.iter().map(to_dyn).collect()),
    }
}

/// Value types are stored verbatim in a topic; everything else is hashed.
pub fn is_value_type(ty: &ParamType) -> bool {
    matches!(
        ty,
        ParamType::Uint(_)
            | ParamType::Int(_)
            | ParamType::Address
            | ParamType::Bool
            | ParamType::FixedBytes(_)
    )
}
