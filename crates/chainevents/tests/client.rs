//! Facade tests: configuration loading and wiring.

use std::sync::Arc;
use std::time::Duration;

use chainevents::{
    selector_for, EventClient, EventQuery, EventQueryOptions, EventQueryService, EventRegistry,
    EventsConfig, MemorySource, RawLog, ResourceNode, WatchOptions,
};

fn config_path() -> std::path::PathBuf {
    let mut p = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    p.push("../../fixtures/config/chainevents.yaml");
    p
}

#[test]
fn loads_yaml_file_and_rebases_abi_paths() {
    let cfg = EventsConfig::from_file(config_path()).unwrap();
    assert_eq!(cfg.sources.max_retries, 2);
    assert_eq!(cfg.query.page_size, 100);
    assert_eq!(cfg.watch.poll_interval_ms, 1_500);
    assert_eq!(cfg.log.directives(), "info,chainevents_watch=debug");
    assert!(cfg.abi_files.iter().all(|p| p.exists()));

    let registry = cfg.load_registry().unwrap();
    assert_eq!(registry.names(), vec!["Message", "SomeEvent", "Transfer"]);
}

#[test]
fn from_config_wires_every_backend() {
    let cfg = EventsConfig::from_file(config_path()).unwrap();
    let client = EventClient::from_config_files(&cfg).unwrap();
    assert_eq!(
        client.service().tiers(),
        vec![ResourceNode::FullNode, ResourceNode::SolidityNode]
    );
    assert!(client.service().has_indexed());
    assert_eq!(client.watcher().config().poll_interval_ms, 1_500);
    assert_eq!(client.registry().len(), 3);
}

#[test]
fn event_server_only_config_has_no_transaction_tiers() {
    let cfg = EventsConfig::from_yaml_str("sources:\n  event_server_url: http://127.0.0.1:9000\n")
        .unwrap();
    let client = EventClient::from_config(&cfg, EventRegistry::default()).unwrap();
    assert!(client.service().tiers().is_empty());
    assert!(client.service().has_indexed());
}

const ABI: &str = r#"[
    {"anonymous":false,"name":"Ping","type":"event","inputs":[
        {"indexed":false,"name":"n","type":"uint256"}
    ]}
]"#;

fn ping(tx: &str, ts: i64, n: u8) -> RawLog {
    let registry = EventRegistry::from_abi_json(ABI).unwrap();
    let mut data = vec![0u8; 32];
    data[31] = n;
    RawLog {
        address: "TPing".into(),
        topics: vec![selector_for(registry.get_by_name("Ping").unwrap())],
        data,
        block_number: 1,
        block_timestamp: ts,
        transaction_id: tx.into(),
        log_index: 0,
        server_result: None,
    }
}

#[tokio::test]
async fn client_queries_and_watches_through_one_service() {
    let events = MemorySource::new(ResourceNode::EventServer);
    events.extend([ping("a", 3_000, 1), ping("b", 6_000, 2)]);
    let service = EventQueryService::new(EventRegistry::from_abi_json(ABI).unwrap())
        .with_indexed(Arc::new(events.clone()));
    let client = EventClient::new(service);

    let res = client
        .get_events_by_contract_address("TPing", EventQueryOptions::default())
        .await
        .unwrap();
    assert_eq!(res.data.len(), 2);
    assert_eq!(res.data[1].field("n").unwrap().to_string(), "2");

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let handle = client.watch_with(
        EventQuery::contract(chainevents::ContractQuery::new("TPing")),
        WatchOptions::from_timestamp(0).poll_interval(Duration::from_millis(20)),
        move |_, ev| {
            let _ = tx.send(ev.map(|e| e.transaction_id));
        },
    );

    let first = rx.recv().await.unwrap().unwrap();
    let second = rx.recv().await.unwrap().unwrap();
    handle.stop();
    handle.join().await;
    assert_eq!((first.as_str(), second.as_str()), ("a", "b"));
}
