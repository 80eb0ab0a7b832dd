//! Event ABI registry.
//!
//! Holds the event entries of one or more contracts, indexed by selector
//! and by name. Built once, then shared read-only (wrap in an `Arc`).
//!
//! Contracts may declare events with the same signature but different
//! indexed parameters (ERC-20 vs ERC-721 `Transfer`). Such entries share a
//! selector; a log is matched to the one expecting its topic count.

use crate::decoder::param_key;
use crate::selector::{selector_for, to_hex};
use crate::server;
use crate::types::parse_param_type;
use alloy_json_abi::JsonAbi;
use chainevents_core::{AbiParam, DecodeError, EventAbiEntry, RawLog, Word};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Event entries indexed by selector and name.
#[derive(Debug, Clone, Default)]
pub struct EventRegistry {
    entries: Vec<EventAbiEntry>,
    /// selector → positions in `entries` (same signature, different indexing)
    by_selector: HashMap<Word, Vec<usize>>,
    /// name → positions in `entries` (overloads share a name)
    by_name: HashMap<String, Vec<usize>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry; returns `false` if an identical entry is already
    /// registered.
    ///
    /// An entry whose selector is taken by one with different parameters
    /// is kept alongside it.
    pub fn add(&mut self, entry: EventAbiEntry) -> bool {
        let idx = self.entries.len();
        if !entry.anonymous {
            let selector = selector_for(&entry);
            let slot = self.by_selector.entry(selector).or_default();
            if slot.iter().any(|&i| self.entries[i].params == entry.params) {
                tracing::debug!(
                    event = %entry.name,
                    selector = %to_hex(&selector),
                    "duplicate event entry ignored"
                );
                return false;
            }
            if !slot.is_empty() {
                tracing::warn!(
                    event = %entry.name,
                    selector = %to_hex(&selector),
                    topics = entry.expected_topic_count(),
                    "selector shared by entries with different parameters; matching on topic count"
                );
            }
            slot.push(idx);
        }
        self.by_name.entry(entry.name.clone()).or_default().push(idx);
        self.entries.push(entry);
        true
    }

    /// Merge all entries of `other` into `self`.
    pub fn extend(&mut self, other: EventRegistry) {
        for entry in other.entries {
            self.add(entry);
        }
    }

    /// Load event entries from contract ABI JSON.
    ///
    /// Accepts a plain entry array, the `{"entrys": [...]}` wrapper nodes
    /// return, or an `{"abi": ...}` object around either. Non-event entries
    /// are skipped.
    pub fn from_abi_json(json: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(json).map_err(|e| DecodeError::InvalidAbi {
            reason: e.to_string(),
        })?;
        Self::from_abi_value(&value)
    }

    pub fn from_abi_value(value: &Value) -> Result<Self, DecodeError> {
        let items = entry_array(value).ok_or_else(|| DecodeError::InvalidAbi {
            reason: "expected an array of ABI entries".into(),
        })?;

        let mut registry = Self::new();
        for item in items {
            let kind = item.get("type").and_then(Value::as_str).unwrap_or_default();
            if !kind.eq_ignore_ascii_case("event") {
                continue;
            }
            let raw: RawAbiEntry =
                serde_json::from_value(item.clone()).map_err(|e| DecodeError::InvalidAbi {
                    reason: e.to_string(),
                })?;
            let entry = raw.into_entry()?;
            check_unique_keys(&entry)?;
            registry.add(entry);
        }
        Ok(registry)
    }

    /// Load event entries from a parsed `alloy_json_abi::JsonAbi`.
    pub fn from_json_abi(abi: &JsonAbi) -> Result<Self, DecodeError> {
        let mut registry = Self::new();
        for event in abi.events() {
            let params = event
                .inputs
                .iter()
                .map(|p| {
                    Ok(AbiParam::new(
                        p.name.clone(),
                        parse_param_type(&p.selector_type())?,
                        p.indexed,
                    ))
                })
                .collect::<Result<Vec<_>, DecodeError>>()?;
            let mut entry = EventAbiEntry::new(event.name.clone(), params);
            entry.anonymous = event.anonymous;
            check_unique_keys(&entry)?;
            registry.add(entry);
        }
        Ok(registry)
    }

    /// First entry registered under `selector`.
    pub fn get_by_selector(&self, selector: &Word) -> Option<&EventAbiEntry> {
        self.by_selector
            .get(selector)
            .and_then(|idx| idx.first())
            .map(|&i| &self.entries[i])
    }

    /// First entry registered under `name`.
    pub fn get_by_name(&self, name: &str) -> Option<&EventAbiEntry> {
        self.by_name
            .get(name)
            .and_then(|idx| idx.first())
            .map(|&i| &self.entries[i])
    }

    /// All entries registered under `name`, in registration order.
    pub fn all_by_name(&self, name: &str) -> Vec<&EventAbiEntry> {
        self.by_name
            .get(name)
            .map(|idx| idx.iter().map(|&i| &self.entries[i]).collect())
            .unwrap_or_default()
    }

    /// Selectors of every non-anonymous entry registered under `name`.
    pub fn selectors_for_name(&self, name: &str) -> Vec<Word> {
        self.all_by_name(name)
            .into_iter()
            .filter(|e| !e.anonymous)
            .map(selector_for)
            .collect()
    }

    /// Find the entry that describes `raw`.
    ///
    /// A record the backend already decoded is matched by event name. For
    /// raw logs the entry whose selector equals topics[0] wins, preferring
    /// the one expecting `topics.len()` topics when several share it.
    /// Otherwise the single anonymous entry expecting exactly
    /// `topics.len()` topics, if there is exactly one.
    pub fn resolve(&self, raw: &RawLog) -> Option<&EventAbiEntry> {
        if let Some(predecoded) = &raw.server_result {
            let named = self.all_by_name(&predecoded.event_name);
            return named
                .iter()
                .find(|e| server::covers(e, predecoded))
                .or_else(|| named.first())
                .copied();
        }
        if let Some(idx) = raw.selector_topic().and_then(|t| self.by_selector.get(t)) {
            let mut candidates = idx.iter().map(|&i| &self.entries[i]);
            let first = candidates.clone().next();
            if let Some(entry) = candidates
                .find(|e| e.expected_topic_count() == raw.topics.len())
                .or(first)
            {
                return Some(entry);
            }
        }
        let mut anonymous = self
            .entries
            .iter()
            .filter(|e| e.anonymous && e.expected_topic_count() == raw.topics.len());
        match (anonymous.next(), anonymous.next()) {
            (Some(entry), None) => Some(entry),
            _ => None,
        }
    }

    pub fn entries(&self) -> &[EventAbiEntry] {
        &self.entries
    }

    /// Distinct event names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_name.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parameters must map to distinct result keys.
fn check_unique_keys(entry: &EventAbiEntry) -> Result<(), DecodeError> {
    let mut seen = HashSet::with_capacity(entry.params.len());
    for (i, param) in entry.params.iter().enumerate() {
        let key = param_key(i, param);
        if !seen.insert(key.clone()) {
            return Err(DecodeError::InvalidAbi {
                reason: format!("event '{}' declares parameter '{key}' twice", entry.name),
            });
        }
    }
    Ok(())
}

fn entry_array(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(map) => map
            .get("entrys")
            .or_else(|| map.get("abi"))
            .and_then(entry_array),
        _ => None,
    }
}

// ─── ABI JSON wire shape ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawAbiEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    inputs: Vec<RawAbiParam>,
    #[serde(default)]
    anonymous: bool,
}

#[derive(Debug, Deserialize)]
struct RawAbiParam {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    indexed: bool,
    #[serde(default)]
    components: Vec<RawAbiParam>,
}

impl RawAbiEntry {
    fn into_entry(self) -> Result<EventAbiEntry, DecodeError> {
        let params = self
            .inputs
            .iter()
            .map(|p| {
                let ty = parse_param_type(&p.type_string())?;
                Ok(AbiParam::new(p.name.clone(), ty, p.indexed))
            })
            .collect::<Result<Vec<_>, DecodeError>>()?;
        let mut entry = EventAbiEntry::new(self.name, params);
        entry.anonymous = self.anonymous;
        Ok(entry)
    }
}

impl RawAbiParam {
    /// Canonical type string, expanding `tuple` into its components.
    fn type_string(&self) -> String {
        match self.ty.strip_prefix("tuple") {
            Some(suffix) => {
                let inner: Vec<String> = self.components.iter().map(|c| c.type_string()).collect();
                format!("({}){suffix}", inner.join(","))
            }
            None => self.ty.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainevents_core::ParamType;

    const SOME_EVENT_ABI: &str = r#"[
        {"type":"constructor","inputs":[]},
        {"name":"emitNow","type":"function","inputs":[{"name":"_receiver","type":"address"}]},
        {"anonymous":false,"name":"SomeEvent","type":"event","inputs":[
            {"indexed":true,"name":"_sender","type":"address"},
            {"indexed":false,"name":"_receiver","type":"address"},
            {"indexed":false,"name":"_amount","type":"uint256"}
        ]}
    ]"#;

    #[test]
    fn loads_events_and_skips_other_entries() {
        let reg = EventRegistry::from_abi_json(SOME_EVENT_ABI).unwrap();
        assert_eq!(reg.len(), 1);
        let entry = reg.get_by_name("SomeEvent").unwrap();
        assert_eq!(entry.signature(), "SomeEvent(address,address,uint256)");
        assert!(entry.params[0].indexed);
    }

    #[test]
    fn accepts_entrys_wrapper_and_capitalised_type() {
        let json = r#"{"entrys":[{"name":"Deposit","type":"Event","inputs":[
            {"indexed":true,"name":"who","type":"address"},
            {"name":"id","type":"trcToken"}
        ]}]}"#;
        let reg = EventRegistry::from_abi_json(json).unwrap();
        let entry = reg.get_by_name("Deposit").unwrap();
        assert_eq!(entry.params[1].ty, ParamType::Uint(256));
        assert_eq!(reg.names(), vec!["Deposit".to_string()]);
    }

    #[test]
    fn expands_tuple_components() {
        let json = r#"[{"name":"Order","type":"event","inputs":[
            {"name":"o","type":"tuple[]","components":[
                {"name":"maker","type":"address"},
                {"name":"amount","type":"uint96"}
            ]}
        ]}]"#;
        let reg = EventRegistry::from_abi_json(json).unwrap();
        let entry = reg.get_by_name("Order").unwrap();
        assert_eq!(entry.signature(), "Order((address,uint96)[])");
    }

    #[test]
    fn rejects_non_array_abi() {
        assert!(matches!(
            EventRegistry::from_abi_json(r#"{"name":"x"}"#),
            Err(DecodeError::InvalidAbi { .. })
        ));
        assert!(EventRegistry::from_abi_json("not json").is_err());
    }

    #[test]
    fn resolves_by_selector_then_anonymous() {
        let mut reg = EventRegistry::from_abi_json(SOME_EVENT_ABI).unwrap();
        let some_event = reg.get_by_name("SomeEvent").unwrap().clone();

        let mut raw = RawLog {
            address: "T1".into(),
            topics: vec![selector_for(&some_event), [0u8; 32]],
            data: vec![0u8; 64],
            block_number: 1,
            block_timestamp: 0,
            transaction_id: "tx".into(),
            log_index: 0,
            server_result: None,
        };
        assert_eq!(reg.resolve(&raw).map(|e| e.name.as_str()), Some("SomeEvent"));

        raw.topics = vec![[0x01; 32], [0x02; 32]];
        assert!(reg.resolve(&raw).is_none());

        reg.add(
            EventAbiEntry::new(
                "Anon",
                vec![
                    AbiParam::new("a", ParamType::Uint(256), true),
                    AbiParam::new("b", ParamType::Uint(256), true),
                ],
            )
            .anonymous(),
        );
        assert_eq!(reg.resolve(&raw).map(|e| e.name.as_str()), Some("Anon"));
    }

    #[test]
    fn duplicate_selector_is_ignored() {
        let mut reg = EventRegistry::from_abi_json(SOME_EVENT_ABI).unwrap();
        let dup = reg.get_by_name("SomeEvent").unwrap().clone();
        assert!(!reg.add(dup));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn shared_selector_resolves_by_topic_count() {
        let json = r#"[
            {"name":"Transfer","type":"event","inputs":[
                {"indexed":true,"name":"from","type":"address"},
                {"indexed":true,"name":"to","type":"address"},
                {"indexed":false,"name":"value","type":"uint256"}
            ]},
            {"name":"Transfer","type":"event","inputs":[
                {"indexed":true,"name":"from","type":"address"},
                {"indexed":true,"name":"to","type":"address"},
                {"indexed":true,"name":"tokenId","type":"uint256"}
            ]}
        ]"#;
        let reg = EventRegistry::from_abi_json(json).unwrap();
        assert_eq!(reg.len(), 2);
        let fungible = &reg.entries()[0];
        let selector = selector_for(fungible);
        assert_eq!(selector, selector_for(&reg.entries()[1]));

        let mut raw = RawLog {
            address: "T1".into(),
            topics: vec![selector, [0u8; 32], [0u8; 32], [0u8; 32]],
            data: vec![],
            block_number: 1,
            block_timestamp: 0,
            transaction_id: "tx".into(),
            log_index: 0,
            server_result: None,
        };
        let nft = reg.resolve(&raw).unwrap();
        assert_eq!(nft.params[2].name, "tokenId");
        assert!(crate::decode(nft, &raw).is_ok());

        raw.topics.pop();
        raw.data = vec![0u8; 32];
        let token = reg.resolve(&raw).unwrap();
        assert_eq!(token.params[2].name, "value");
        assert!(crate::decode(token, &raw).is_ok());
    }

    #[test]
    fn duplicate_parameter_names_are_rejected() {
        let json = r#"[{"name":"Dup","type":"event","inputs":[
            {"name":"a","type":"uint256"},
            {"name":"a","type":"address"}
        ]}]"#;
        assert!(matches!(
            EventRegistry::from_abi_json(json),
            Err(DecodeError::InvalidAbi { reason }) if reason.contains("'a'")
        ));

        // An explicit name may not collide with an unnamed parameter's position
        let json = r#"[{"name":"Dup","type":"event","inputs":[
            {"name":"1","type":"uint256"},
            {"name":"","type":"address"}
        ]}]"#;
        assert!(EventRegistry::from_abi_json(json).is_err());

        let abi: JsonAbi = serde_json::from_str(
            r#"[{"anonymous":false,"name":"Dup","type":"event","inputs":[
                {"indexed":false,"name":"a","type":"uint256"},
                {"indexed":true,"name":"a","type":"uint256"}
            ]}]"#,
        )
        .unwrap();
        assert!(EventRegistry::from_json_abi(&abi).is_err());
    }

    #[test]
    fn server_decoded_record_resolves_by_name() {
        let reg = EventRegistry::from_abi_json(SOME_EVENT_ABI).unwrap();
        let mut values = indexmap::IndexMap::new();
        values.insert("_sender".to_string(), Value::from("0x00"));
        values.insert("_receiver".to_string(), Value::from("0x00"));
        values.insert("_amount".to_string(), Value::from("1"));
        let mut raw = RawLog {
            address: "T1".into(),
            topics: vec![],
            data: vec![],
            block_number: 1,
            block_timestamp: 0,
            transaction_id: "tx".into(),
            log_index: 0,
            server_result: Some(chainevents_core::ServerResult {
                event_name: "SomeEvent".into(),
                values,
            }),
        };
        assert_eq!(reg.resolve(&raw).map(|e| e.name.as_str()), Some("SomeEvent"));

        if let Some(server) = raw.server_result.as_mut() {
            server.event_name = "Unknown".into();
        }
        assert!(reg.resolve(&raw).is_none());
    }

    #[test]
    fn loads_from_alloy_json_abi() {
        let abi: JsonAbi = serde_json::from_str(
            r#"[{"anonymous":false,"name":"SomeEvent","type":"event","inputs":[
                {"indexed":true,"name":"_sender","type":"address"},
                {"indexed":false,"name":"_receiver","type":"address"},
                {"indexed":false,"name":"_amount","type":"uint256"}
            ]}]"#,
        )
        .unwrap();
        let reg = EventRegistry::from_json_abi(&abi).unwrap();
        let entry = reg.get_by_name("SomeEvent").unwrap();
        assert_eq!(
            to_hex(&selector_for(entry)),
            "0x9f08738e168c835bbaf7483705fb1c0a04a1a3258dd9687f14d430948e04e329"
        );
        assert_eq!(reg.selectors_for_name("SomeEvent").len(), 1);
    }
}
