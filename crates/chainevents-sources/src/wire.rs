//! Backend response shapes and their conversion into `RawLog`.

use chainevents_core::{parse_hex, parse_word, DecodeError, RawLog, ServerResult};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

// ─── Node: /wallet(solidity)/gettransactioninfobyid ──────────────────────────

/// Transaction info as returned by full and solidity nodes.
#[derive(Debug, Deserialize)]
pub struct NodeTransactionInfo {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "blockNumber", default)]
    pub block_number: u64,
    /// Milliseconds
    #[serde(rename = "blockTimeStamp", default)]
    pub block_timestamp: i64,
    #[serde(default)]
    pub log: Vec<NodeLog>,
}

/// One entry of `log[]`; hex fields carry no `0x` prefix.
#[derive(Debug, Deserialize)]
pub struct NodeLog {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
}

impl NodeTransactionInfo {
    /// Convert `log[]` into raw logs; `log_index` is the position in the array.
    pub fn into_raw_logs(self, tx_id: &str) -> Result<Vec<RawLog>, DecodeError> {
        let transaction_id = if self.id.is_empty() {
            tx_id.to_string()
        } else {
            self.id
        };
        self.log
            .into_iter()
            .enumerate()
            .map(|(i, log)| {
                Ok(RawLog {
                    address: log.address,
                    topics: parse_topics(&log.topics)?,
                    data: parse_hex(&log.data)?,
                    block_number: self.block_number,
                    block_timestamp: self.block_timestamp,
                    transaction_id: transaction_id.clone(),
                    log_index: i as u32,
                    server_result: None,
                })
            })
            .collect()
    }
}

// ─── Event server: /v1/{transactions,contracts}/…/events ──────────────────────

/// One page of event-server records.
#[derive(Debug, Deserialize)]
pub struct EventServerPage {
    #[serde(default)]
    pub data: Vec<EventServerRecord>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageMeta {
    /// Token for the following page
    #[serde(default)]
    pub fingerprint: Option<String>,
}

/// One event-server record.
///
/// Self-hosted event servers send the raw `topics` and `data`. The hosted
/// API sends neither and instead carries `event_name` with an already
/// decoded `result` map.
#[derive(Debug, Deserialize)]
pub struct EventServerRecord {
    pub transaction_id: String,
    #[serde(default)]
    pub block_number: u64,
    #[serde(default)]
    pub block_timestamp: i64,
    pub contract_address: String,
    #[serde(default)]
    pub event_index: u32,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub result: Option<IndexMap<String, Value>>,
}

impl EventServerPage {
    pub fn next_page(&self) -> Option<String> {
        self.meta
            .as_ref()
            .and_then(|m| m.fingerprint.clone())
            .filter(|f| !f.is_empty())
    }

    /// `Some(reason)` when the server reported a failure in-band.
    pub fn failure(&self) -> Option<String> {
        match self.success {
            Some(false) => Some(
                self.error
                    .clone()
                    .unwrap_or_else(|| "request unsuccessful".to_string()),
            ),
            _ => None,
        }
    }

    pub fn into_raw_logs(self) -> Result<Vec<RawLog>, DecodeError> {
        self.data.into_iter().map(EventServerRecord::into_raw_log).collect()
    }
}

impl EventServerRecord {
    /// Raw topics win when present; otherwise the server's decoded result
    /// is carried along for the decoder.
    pub fn into_raw_log(self) -> Result<RawLog, DecodeError> {
        let server_result = if self.topics.is_empty() {
            match (self.event_name, self.result) {
                (Some(event_name), Some(values)) => Some(ServerResult { event_name, values }),
                _ => {
                    return Err(DecodeError::EmptyRecord {
                        transaction_id: self.transaction_id,
                        log_index: self.event_index,
                    })
                }
            }
        } else {
            None
        };

        Ok(RawLog {
            address: self.contract_address,
            topics: parse_topics(&self.topics)?,
            data: parse_hex(&self.data)?,
            block_number: self.block_number,
            block_timestamp: self.block_timestamp,
            transaction_id: self.transaction_id,
            log_index: self.event_index,
            server_result,
        })
    }
}

fn parse_topics(topics: &[String]) -> Result<Vec<[u8; 32]>, DecodeError> {
    topics.iter().map(|t| parse_word(t)).collect()
}
