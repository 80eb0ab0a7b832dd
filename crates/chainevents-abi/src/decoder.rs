//! Log decoding: topics and data → named, typed fields.
//!
//! Decoding follows the Solidity event ABI:
//! - topics[0] = keccak256(signature) for non-anonymous events
//! - topics[1..] = indexed params in declaration order. Value types are
//!   stored verbatim; strings, bytes, arrays and tuples only as their hash.
//! - data = non-indexed params, ABI-encoded as a parameter tuple

use crate::normalizer;
use crate::server;
use crate::selector::{selector_for, to_hex};
use crate::types::{is_value_type, to_dyn};
use alloy_core::dyn_abi::{DynSolType, DynSolValue};
use chainevents_core::{
    AbiParam, DecodeError, DecodedEvent, EventAbiEntry, FieldValue, RawLog, ResourceNode,
    ResultType, WORD_SIZE,
};
use indexmap::IndexMap;

/// Key under which a parameter appears in `result`; unnamed ones use their position.
pub fn param_key(index: usize, param: &AbiParam) -> String {
    if param.name.is_empty() {
        index.to_string()
    } else {
        param.name.clone()
    }
}

/// Decode `raw` against `entry` into an ordered map of parameter name → value.
///
/// The map contains exactly the declared parameters, in declaration order.
/// Records a backend already decoded are converted from its values instead.
pub fn decode(
    entry: &EventAbiEntry,
    raw: &RawLog,
) -> Result<IndexMap<String, FieldValue>, DecodeError> {
    if let Some(predecoded) = &raw.server_result {
        return server::decode_server_result(entry, predecoded);
    }
    check_shape(entry, raw)?;

    let topic_offset = if entry.anonymous { 0 } else { 1 };
    let mut indexed = raw.topics[topic_offset..].iter();
    let mut data_values = decode_data(entry, &raw.data)?.into_iter();

    let mut out = IndexMap::with_capacity(entry.params.len());
    for (i, param) in entry.params.iter().enumerate() {
        let value = if param.indexed {
            // shape check guarantees one topic per indexed param
            let topic = indexed.next().ok_or_else(|| topic_mismatch(entry, raw))?;
            decode_topic(entry, topic, param)?
        } else {
            data_values
                .next()
                .map(normalizer::normalize)
                .ok_or_else(|| DecodeError::AbiDecodeFailed {
                    event: entry.name.clone(),
                    reason: format!("missing value for '{}'", param.name),
                })?
        };
        out.insert(param_key(i, param), value);
    }
    Ok(out)
}

/// Validate topic count, selector and data length, in that order.
fn check_shape(entry: &EventAbiEntry, raw: &RawLog) -> Result<(), DecodeError> {
    if raw.topics.len() != entry.expected_topic_count() {
        return Err(topic_mismatch(entry, raw));
    }

    if !entry.anonymous {
        let expected = selector_for(entry);
        if raw.topics[0] != expected {
            return Err(DecodeError::SelectorMismatch {
                event: entry.name.clone(),
                expected: to_hex(&expected),
                got: to_hex(&raw.topics[0]),
            });
        }
    }

    let head = entry.data_head_size();
    let len = raw.data.len();
    let (ok, expected) = if entry.has_dynamic_data() {
        (
            len % WORD_SIZE == 0 && len >= head,
            format!("a multiple of {WORD_SIZE} bytes, at least {head}"),
        )
    } else {
        (len == head, format!("exactly {head} bytes"))
    };
    if !ok {
        return Err(DecodeError::DataLengthMismatch {
            event: entry.name.clone(),
            expected,
            got: len,
        });
    }
    Ok(())
}

fn topic_mismatch(entry: &EventAbiEntry, raw: &RawLog) -> DecodeError {
    DecodeError::TopicCountMismatch {
        event: entry.name.clone(),
        expected: entry.expected_topic_count(),
        got: raw.topics.len(),
    }
}

fn decode_topic(
    entry: &EventAbiEntry,
    topic: &[u8; 32],
    param: &AbiParam,
) -> Result<FieldValue, DecodeError> {
    if !is_value_type(&param.ty) {
        return Ok(FieldValue::Hash(to_hex(topic)));
    }
    to_dyn(&param.ty)
        .abi_decode(topic)
        .map(normalizer::normalize)
        .map_err(|e| DecodeError::AbiDecodeFailed {
            event: entry.name.clone(),
            reason: format!("topic '{}': {e}", param.name),
        })
}

fn decode_data(entry: &EventAbiEntry, data: &[u8]) -> Result<Vec<DynSolValue>, DecodeError> {
    let types: Vec<DynSolType> = entry.data_params().map(|p| to_dyn(&p.ty)).collect();
    if types.is_empty() {
        return Ok(Vec::new());
    }

    let decoded = DynSolType::Tuple(types)
        .abi_decode_params(data)
        .map_err(|e| DecodeError::AbiDecodeFailed {
            event: entry.name.clone(),
            reason: e.to_string(),
        })?;

    match decoded {
        DynSolValue::Tuple(vals) => Ok(vals),
        other => Ok(vec![other]),
    }
}

/// Builds complete [`DecodedEvent`] records from raw logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventDecoder;

impl EventDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode one raw log reported by `node`.
    pub fn decode_log(
        &self,
        entry: &EventAbiEntry,
        raw: &RawLog,
        node: ResourceNode,
    ) -> Result<DecodedEvent, DecodeError> {
        let result = decode(entry, raw)?;
        let result_types = entry
            .params
            .iter()
            .enumerate()
            .map(|(i, p)| (param_key(i, p), p.ty.to_string()))
            .collect();

        Ok(DecodedEvent {
            event_name: entry.name.clone(),
            contract_address: raw.address.clone(),
            transaction_id: raw.transaction_id.clone(),
            block_number: raw.block_number,
            block_timestamp: raw.block_timestamp,
            log_index: raw.log_index,
            result_type: ResultType::for_node(node),
            result,
            result_types,
            resource_node: node,
        })
    }
}
