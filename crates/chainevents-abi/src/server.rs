//! Result maps from values an indexed backend decoded itself.
//!
//! Hosted event servers send each parameter as JSON instead of topics and
//! data: integers as decimal strings or numbers, addresses as `0x` or `41`
//! prefixed hex, bytes as hex, arrays either inline or as a JSON string.
//! Every value is checked against its declared type and converted to the
//! `FieldValue` the raw decoder would have produced.

use alloy_core::primitives::{I256, U256};
use chainevents_core::{
    parse_hex, DecodeError, EventAbiEntry, FieldValue, ParamType, ServerResult,
};
use indexmap::IndexMap;
use serde_json::Value;
use std::str::FromStr;

use crate::decoder::param_key;
use crate::types::is_value_type;

/// `true` if `server` names `entry` and carries a value for every parameter.
pub fn covers(entry: &EventAbiEntry, server: &ServerResult) -> bool {
    server.event_name == entry.name
        && entry
            .params
            .iter()
            .enumerate()
            .all(|(i, p)| lookup(server, i, &param_key(i, p)).is_some())
}

/// Convert `server` into an ordered map of exactly the declared parameters.
pub fn decode_server_result(
    entry: &EventAbiEntry,
    server: &ServerResult,
) -> Result<IndexMap<String, FieldValue>, DecodeError> {
    let fail = |reason: String| DecodeError::AbiDecodeFailed {
        event: entry.name.clone(),
        reason,
    };
    if server.event_name != entry.name {
        return Err(fail(format!("record names event '{}'", server.event_name)));
    }

    let mut out = IndexMap::with_capacity(entry.params.len());
    for (i, param) in entry.params.iter().enumerate() {
        let key = param_key(i, param);
        let value =
            lookup(server, i, &key).ok_or_else(|| fail(format!("missing value for '{key}'")))?;
        // Indexed dynamic values only ever reach the server as their hash
        let field = if param.indexed && !is_value_type(&param.ty) {
            topic_hash(value)
        } else {
            convert(&param.ty, value)
        }
        .map_err(|reason| fail(format!("'{key}': {reason}")))?;
        out.insert(key, field);
    }
    Ok(out)
}

/// By name first, then by position.
fn lookup<'a>(server: &'a ServerResult, index: usize, key: &str) -> Option<&'a Value> {
    server
        .values
        .get(key)
        .or_else(|| server.values.get(index.to_string().as_str()))
}

fn convert(ty: &ParamType, value: &Value) -> Result<FieldValue, String> {
    match ty {
        ParamType::Uint(_) => {
            let text = scalar_text(value)?;
            let n = U256::from_str(&text).map_err(|e| format!("invalid uint '{text}': {e}"))?;
            Ok(match u128::try_from(n) {
                Ok(v) => FieldValue::Uint(v),
                Err(_) => FieldValue::BigUint(n.to_string()),
            })
        }
        ParamType::Int(_) => {
            let text = scalar_text(value)?;
            let n = I256::from_dec_str(&text).map_err(|e| format!("invalid int '{text}': {e}"))?;
            Ok(match i128::try_from(n) {
                Ok(v) => FieldValue::Int(v),
                Err(_) => FieldValue::BigInt(n.to_string()),
            })
        }
        ParamType::Bool => match value {
            Value::Bool(b) => Ok(FieldValue::Bool(*b)),
            Value::String(s) if s == "true" => Ok(FieldValue::Bool(true)),
            Value::String(s) if s == "false" => Ok(FieldValue::Bool(false)),
            other => Err(format!("expected a bool, got {other}")),
        },
        ParamType::Address => address(value),
        ParamType::FixedBytes(len) => {
            let bytes = hex_bytes(value)?;
            if bytes.len() != usize::from(*len) {
                return Err(format!("expected {len} bytes, got {}", bytes.len()));
            }
            Ok(FieldValue::FixedBytes(bytes))
        }
        ParamType::Bytes => hex_bytes(value).map(FieldValue::Bytes),
        ParamType::String => match value {
            Value::String(s) => Ok(FieldValue::Str(s.clone())),
            other => Err(format!("expected a string, got {other}")),
        },
        ParamType::Array(elem) => elements(value)?
            .iter()
            .map(|v| convert(elem, v))
            .collect::<Result<Vec<_>, _>>()
            .map(FieldValue::Array),
        ParamType::FixedArray(elem, len) => {
            let items = elements(value)?;
            if items.len() != *len {
                return Err(format!("expected {len} elements, got {}", items.len()));
            }
            items
                .iter()
                .map(|v| convert(elem, v))
                .collect::<Result<Vec<_>, _>>()
                .map(FieldValue::Array)
        }
        ParamType::Tuple(fields) => {
            let items = elements(value)?;
            if items.len() != fields.len() {
                return Err(format!(
                    "expected {} tuple fields, got {}",
                    fields.len(),
                    items.len()
                ));
            }
            fields
                .iter()
                .zip(&items)
                .map(|(ty, v)| convert(ty, v))
                .collect::<Result<Vec<_>, _>>()
                .map(FieldValue::Tuple)
        }
    }
}

fn scalar_text(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(format!("expected a number, got {other}")),
    }
}

fn address(value: &Value) -> Result<FieldValue, String> {
    let s = value.as_str().ok_or("expected an address string")?;
    let hex = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    let hex = match hex.strip_prefix("41") {
        Some(rest) if hex.len() == 42 => rest,
        _ => hex,
    };
    if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(format!("invalid address '{s}'"));
    }
    Ok(FieldValue::Address(format!("0x{}", hex.to_ascii_lowercase())))
}

fn hex_bytes(value: &Value) -> Result<Vec<u8>, String> {
    let s = value.as_str().ok_or("expected a hex string")?;
    parse_hex(s).map_err(|e| e.to_string())
}

fn topic_hash(value: &Value) -> Result<FieldValue, String> {
    let bytes = hex_bytes(value)?;
    if bytes.len() != 32 {
        return Err(format!("expected a 32-byte hash, got {} bytes", bytes.len()));
    }
    Ok(FieldValue::Hash(format!("0x{}", hex::encode(bytes))))
}

/// Inline JSON arrays, or arrays the server serialised into a string.
fn elements(value: &Value) -> Result<Vec<Value>, String> {
    match value {
        Value::Array(items) => Ok(items.clone()),
        Value::String(s) => {
            serde_json::from_str(s).map_err(|e| format!("expected an array, got '{s}': {e}"))
        }
        other => Err(format!("expected an array, got {other}")),
    }
}
