//! Golden fixture integration tests.
//!
//! Each test loads a raw log from `fixtures/logs/`, decodes it with the
//! registry built from the referenced ABI under `fixtures/abi/`, and
//! asserts the string form of every field matches the recorded output.

use chainevents_abi::{EventDecoder, EventRegistry};
use chainevents_core::{DecodeError, RawLog, ResourceNode, ResultType};

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// The fixtures live two levels above the crate root.
fn fixture_path(name: &str) -> std::path::PathBuf {
    let mut p = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    p.push("../../fixtures");
    p.push(name);
    p
}

fn load_json(name: &str) -> serde_json::Value {
    let path = fixture_path(name);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read fixture {}: {e}", path.display()));
    serde_json::from_str(&content).unwrap_or_else(|e| panic!("bad fixture JSON {name}: {e}"))
}

fn load_registry(name: &str) -> EventRegistry {
    let path = fixture_path(name);
    let content = std::fs::read_to_string(&path).unwrap();
    EventRegistry::from_abi_json(&content).unwrap()
}

/// Decode a log fixture and compare against its `expected` block.
fn run_golden(fixture: &str) {
    let f = load_json(fixture);
    let registry = load_registry(f["abi"].as_str().unwrap());
    let raw: RawLog = serde_json::from_value(f["log"].clone()).unwrap();

    let entry = registry
        .resolve(&raw)
        .unwrap_or_else(|| panic!("{fixture}: no ABI entry for topic 0"));
    let event = EventDecoder::new()
        .decode_log(entry, &raw, ResourceNode::SolidityNode)
        .unwrap_or_else(|e| panic!("{fixture}: decode failed: {e}"));

    let expected = &f["expected"];
    assert_eq!(event.event_name, expected["event_name"].as_str().unwrap());
    assert_eq!(event.result_type, ResultType::Decoded);

    // [[name, value], ...] in declaration order
    let want: Vec<(&str, &str)> = expected["result"]
        .as_array()
        .unwrap()
        .iter()
        .map(|pair| (pair[0].as_str().unwrap(), pair[1].as_str().unwrap()))
        .collect();
    let got: Vec<(&str, String)> = event
        .result
        .iter()
        .map(|(k, v)| (k.as_str(), v.to_string()))
        .collect();

    assert_eq!(got.len(), want.len(), "{fixture}: field count");
    for ((got_name, got_value), (name, value)) in got.iter().zip(&want) {
        assert_eq!(got_name, name, "{fixture}: field order");
        assert_eq!(got_value, value, "{fixture}: field {name}");
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn golden_some_event() {
    run_golden("logs/some_event.json");
}

#[test]
fn golden_message_with_dynamic_data() {
    run_golden("logs/message.json");
}

#[test]
fn wrapper_abi_registers_every_event() {
    let registry = load_registry("abi/message_entrys.json");
    assert_eq!(registry.names(), vec!["Message".to_string(), "Transfer".to_string()]);
}

#[test]
fn truncated_data_is_rejected() {
    let f = load_json("logs/some_event.json");
    let registry = load_registry("abi/some_event.json");
    let mut raw: RawLog = serde_json::from_value(f["log"].clone()).unwrap();
    raw.data.truncate(40);

    let entry = registry.resolve(&raw).unwrap();
    let err = EventDecoder::new()
        .decode_log(entry, &raw, ResourceNode::FullNode)
        .unwrap_err();
    assert!(matches!(err, DecodeError::DataLengthMismatch { got: 40, .. }));
}
