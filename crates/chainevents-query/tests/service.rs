//! Query service tests over in-memory sources.

use std::sync::Arc;

use chainevents_abi::{selector_for, EventRegistry};
use chainevents_core::{
    EventError, EventQueryOptions, OrderBy, OrderField, RawLog, ResourceNode, ResultType,
    ServerResult,
};
use chainevents_query::{EventQueryService, QueryConfig};
use chainevents_sources::MemorySource;

// ─── Helpers ──────────────────────────────────────────────────────────────────

const CONTRACT: &str = "0x4e0f4ba8a6d1b3e0b4b41e1cbbd5ba8bb2c6b4a2";
const SENDER: &str = "f00c9a48e6d6baca7c36134e7cad7d43a851e7b2";
const RECEIVER: &str = "d4d999298d6bea26bf2bbb32a254362d8b9f9e6b";

const ABI: &str = r#"[
    {"anonymous":false,"name":"SomeEvent","type":"event","inputs":[
        {"indexed":true,"name":"_sender","type":"address"},
        {"indexed":false,"name":"_receiver","type":"address"},
        {"indexed":false,"name":"_amount","type":"uint256"}
    ]},
    {"anonymous":false,"name":"Ping","type":"event","inputs":[
        {"indexed":false,"name":"n","type":"uint256"}
    ]}
]"#;

fn registry() -> EventRegistry {
    EventRegistry::from_abi_json(ABI).unwrap()
}

fn word_from_hex(addr_hex: &str) -> [u8; 32] {
    let mut w = [0u8; 32];
    let bytes = hex::decode(addr_hex).unwrap();
    w[32 - bytes.len()..].copy_from_slice(&bytes);
    w
}

fn word_from_u64(v: u64) -> [u8; 32] {
    let mut w = [0u8; 32];
    w[24..].copy_from_slice(&v.to_be_bytes());
    w
}

fn some_event(tx: &str, ts: i64, log_index: u32, amount: u64) -> RawLog {
    let reg = registry();
    let entry = reg.get_by_name("SomeEvent").unwrap();
    let mut data = word_from_hex(RECEIVER).to_vec();
    data.extend_from_slice(&word_from_u64(amount));
    RawLog {
        address: CONTRACT.into(),
        topics: vec![selector_for(entry), word_from_hex(SENDER)],
        data,
        block_number: (ts / 3_000) as u64,
        block_timestamp: ts,
        transaction_id: tx.into(),
        log_index,
        server_result: None,
    }
}

fn ping(tx: &str, ts: i64, log_index: u32) -> RawLog {
    let reg = registry();
    let entry = reg.get_by_name("Ping").unwrap();
    RawLog {
        address: CONTRACT.into(),
        topics: vec![selector_for(entry)],
        data: word_from_u64(7).to_vec(),
        block_number: (ts / 3_000) as u64,
        block_timestamp: ts,
        transaction_id: tx.into(),
        log_index,
        server_result: None,
    }
}

/// A record the way hosted event servers send it: no topics, decoded values.
fn hosted_some_event(tx: &str, ts: i64, log_index: u32, amount: u64) -> RawLog {
    RawLog {
        address: CONTRACT.into(),
        topics: vec![],
        data: vec![],
        block_number: (ts / 3_000) as u64,
        block_timestamp: ts,
        transaction_id: tx.into(),
        log_index,
        server_result: Some(ServerResult {
            event_name: "SomeEvent".into(),
            values: serde_json::from_value(serde_json::json!({
                "_sender": format!("0x{SENDER}"),
                "_receiver": format!("0x{RECEIVER}"),
                "_amount": amount.to_string(),
            }))
            .unwrap(),
        }),
    }
}

struct Fixture {
    full: MemorySource,
    solidity: MemorySource,
    events: MemorySource,
    service: EventQueryService,
}

fn fixture() -> Fixture {
    let full = MemorySource::new(ResourceNode::FullNode);
    let solidity = MemorySource::new(ResourceNode::SolidityNode);
    let events = MemorySource::new(ResourceNode::EventServer).with_page_size(2);
    let service = EventQueryService::new(registry())
        .with_transaction_tier(Arc::new(full.clone()))
        .with_transaction_tier(Arc::new(solidity.clone()))
        .with_indexed(Arc::new(events.clone()));
    Fixture {
        full,
        solidity,
        events,
        service,
    }
}

// ─── By transaction ───────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_transaction_yields_empty_result() {
    let f = fixture();
    let res = f.service.get_events_by_transaction_id("tx1").await.unwrap();
    assert!(res.is_empty());
}

#[tokio::test]
async fn transaction_appears_once_unconfirmed_node_has_it() {
    let f = fixture();
    assert!(f.service.get_events_by_transaction_id("tx1").await.unwrap().is_empty());

    f.full.push(some_event("tx1", 3_000, 0, 4000));
    let res = f.service.get_events_by_transaction_id("tx1").await.unwrap();
    assert_eq!(res.len(), 1);

    let event = &res.data[0];
    assert_eq!(event.event_name, "SomeEvent");
    assert_eq!(event.resource_node, ResourceNode::FullNode);
    assert_eq!(event.result_type, ResultType::Decoded);
    assert_eq!(event.result["_sender"].to_string(), format!("0x{SENDER}"));
    assert_eq!(event.result["_receiver"].to_string(), format!("0x{RECEIVER}"));
    assert_eq!(event.result["_amount"].to_string(), "4000");
}

#[tokio::test]
async fn falls_through_to_confirmed_tier() {
    let f = fixture();
    f.solidity.push(some_event("tx1", 3_000, 0, 4000));
    let res = f.service.get_events_by_transaction_id("tx1").await.unwrap();
    assert_eq!(res.len(), 1);
    assert_eq!(res.data[0].resource_node, ResourceNode::SolidityNode);
}

#[tokio::test]
async fn unavailable_tier_falls_through_to_next() {
    let f = fixture();
    f.full.set_available(false);
    f.solidity.push(some_event("tx1", 3_000, 0, 4000));
    let res = f.service.get_events_by_transaction_id("tx1").await.unwrap();
    assert_eq!(res.len(), 1);
}

#[tokio::test]
async fn unavailable_is_reported_only_without_an_authoritative_answer() {
    let f = fixture();
    f.full.set_available(false);
    f.solidity.set_available(false);
    let err = f.service.get_events_by_transaction_id("tx1").await.unwrap_err();
    assert!(matches!(err, EventError::Unavailable { .. }));

    // The confirmed node answers NotFound: authoritative, so empty result
    f.solidity.set_available(true);
    let res = f.service.get_events_by_transaction_id("tx1").await.unwrap();
    assert!(res.is_empty());
}

#[tokio::test]
async fn unmatched_logs_are_dropped() {
    let f = fixture();
    let mut foreign = some_event("tx1", 3_000, 1, 1);
    foreign.topics[0] = [0xee; 32];
    f.full.extend([some_event("tx1", 3_000, 0, 4000), foreign]);

    let res = f.service.get_events_by_transaction_id("tx1").await.unwrap();
    assert_eq!(res.len(), 1);
    assert_eq!(res.data[0].log_index, 0);
}

#[tokio::test]
async fn malformed_log_aborts_with_decoding_error() {
    let f = fixture();
    let mut bad = some_event("tx1", 3_000, 0, 4000);
    bad.data.truncate(32);
    f.full.push(bad);

    let err = f.service.get_events_by_transaction_id("tx1").await.unwrap_err();
    assert!(matches!(err, EventError::Decoding(_)));
}

#[tokio::test]
async fn explicit_tier_bypasses_fallback() {
    let f = fixture();
    f.solidity.push(some_event("tx1", 3_000, 0, 4000));

    let res = f
        .service
        .get_events_by_transaction_id_from(ResourceNode::FullNode, "tx1")
        .await
        .unwrap();
    assert!(res.is_empty());

    let res = f
        .service
        .get_events_by_transaction_id_from(ResourceNode::SolidityNode, "tx1")
        .await
        .unwrap();
    assert_eq!(res.len(), 1);

    let err = EventQueryService::new(registry())
        .get_events_by_transaction_id_from(ResourceNode::FullNode, "tx1")
        .await
        .unwrap_err();
    assert!(matches!(err, EventError::UnsupportedQuery { .. }));
}

#[tokio::test]
async fn indexed_tier_joins_transaction_lookup_when_configured() {
    let f = fixture();
    f.events.push(some_event("tx1", 3_000, 0, 4000));
    assert!(f.service.get_events_by_transaction_id("tx1").await.unwrap().is_empty());

    let service = f.service.clone().with_config(QueryConfig {
        include_indexed_in_transaction_lookup: true,
        ..QueryConfig::default()
    });
    assert_eq!(
        service.tiers(),
        vec![
            ResourceNode::FullNode,
            ResourceNode::SolidityNode,
            ResourceNode::EventServer
        ]
    );
    let res = service.get_events_by_transaction_id("tx1").await.unwrap();
    assert_eq!(res.data[0].result_type, ResultType::Indexed);
}

// ─── By contract ──────────────────────────────────────────────────────────────

fn seed_contract(f: &Fixture) {
    f.events.extend([
        some_event("tx3", 9_000, 0, 4000),
        some_event("tx1", 3_000, 1, 1000),
        ping("tx2", 6_000, 0),
        some_event("tx1", 3_000, 0, 4000),
        some_event("tx4", 12_000, 0, 2500),
    ]);
}

#[tokio::test]
async fn contract_results_are_ascending_across_pages() {
    let f = fixture();
    seed_contract(&f);

    let res = f
        .service
        .get_events_by_contract_address(CONTRACT, EventQueryOptions::default())
        .await
        .unwrap();
    let keys: Vec<_> = res.data.iter().map(|e| e.sort_key()).collect();
    assert_eq!(
        keys,
        vec![(3_000, 0), (3_000, 1), (6_000, 0), (9_000, 0), (12_000, 0)]
    );
    assert!(res.data.iter().all(|e| e.result_type == ResultType::Indexed));
}

#[tokio::test]
async fn descending_order_reverses() {
    let f = fixture();
    seed_contract(&f);

    let opts = EventQueryOptions {
        order_by: Some(OrderBy::desc(OrderField::BlockTimestamp)),
        ..Default::default()
    };
    let res = f
        .service
        .get_events_by_contract_address(CONTRACT, opts)
        .await
        .unwrap();
    assert_eq!(res.data.first().map(|e| e.block_timestamp), Some(12_000));
    assert_eq!(res.data.last().map(|e| e.sort_key()), Some((3_000, 0)));
}

#[tokio::test]
async fn filters_keep_only_matching_events() {
    let f = fixture();
    seed_contract(&f);

    let mut opts = EventQueryOptions::default();
    opts.filters.insert("_amount".into(), "4000".into());
    let res = f
        .service
        .get_events_by_contract_address(CONTRACT, opts)
        .await
        .unwrap();
    assert_eq!(res.len(), 2);
    assert!(res.data.iter().all(|e| e.result["_amount"].to_string() == "4000"));

    let mut opts = EventQueryOptions::default();
    opts.filters.insert("_amount".into(), "4001".into());
    let res = f
        .service
        .get_events_by_contract_address(CONTRACT, opts)
        .await
        .unwrap();
    assert!(res.is_empty());
}

#[tokio::test]
async fn hosted_records_decode_like_raw_logs() {
    let f = fixture();
    f.events.extend([
        hosted_some_event("tx1", 3_000, 0, 4000),
        some_event("tx2", 6_000, 0, 4000),
        hosted_some_event("tx3", 9_000, 0, 1000),
    ]);

    let mut opts = EventQueryOptions::default();
    opts.filters.insert("_amount".into(), "4000".into());
    let res = f
        .service
        .get_events_by_contract_address(CONTRACT, opts)
        .await
        .unwrap();
    assert_eq!(res.len(), 2);
    assert_eq!(res.data[0].result, res.data[1].result);
    assert_eq!(res.data[0].transaction_id, "tx1");
    assert_eq!(res.data[0].result_type, ResultType::Indexed);
    assert_eq!(res.data[0].result_types["_amount"], "uint256");
}

#[tokio::test]
async fn event_name_restricts_results() {
    let f = fixture();
    seed_contract(&f);

    let opts = EventQueryOptions {
        event_name: Some("Ping".into()),
        ..Default::default()
    };
    let res = f
        .service
        .get_events_by_contract_address(CONTRACT, opts)
        .await
        .unwrap();
    assert_eq!(res.len(), 1);
    assert_eq!(res.data[0].event_name, "Ping");

    let opts = EventQueryOptions {
        event_name: Some("Nope".into()),
        ..Default::default()
    };
    let res = f
        .service
        .get_events_by_contract_address(CONTRACT, opts)
        .await
        .unwrap();
    assert!(res.is_empty());
}

#[tokio::test]
async fn limit_truncates_after_sorting() {
    let f = fixture();
    seed_contract(&f);

    let opts = EventQueryOptions {
        limit: Some(3),
        ..Default::default()
    };
    let res = f
        .service
        .get_events_by_contract_address(CONTRACT, opts)
        .await
        .unwrap();
    let keys: Vec<_> = res.data.iter().map(|e| e.sort_key()).collect();
    assert_eq!(keys, vec![(3_000, 0), (3_000, 1), (6_000, 0)]);
}

#[tokio::test]
async fn max_pages_bounds_pagination() {
    let f = fixture();
    seed_contract(&f);

    let service = f.service.clone().with_config(QueryConfig {
        max_pages: 1,
        ..QueryConfig::default()
    });
    let res = service
        .get_events_by_contract_address(CONTRACT, EventQueryOptions::default())
        .await
        .unwrap();
    assert_eq!(res.len(), 2);
}

#[tokio::test]
async fn contract_query_without_indexed_tier_is_unsupported() {
    let service = EventQueryService::new(registry())
        .with_transaction_tier(Arc::new(MemorySource::new(ResourceNode::FullNode)));
    let err = service
        .get_events_by_contract_address(CONTRACT, EventQueryOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EventError::UnsupportedQuery { node: ResourceNode::EventServer, .. }
    ));
}

#[tokio::test]
async fn contract_query_surfaces_outage() {
    let f = fixture();
    seed_contract(&f);
    f.events.set_available(false);
    let err = f
        .service
        .get_events_by_contract_address(CONTRACT, EventQueryOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_retryable());
}
