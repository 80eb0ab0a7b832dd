//! Node-backed sources: unconfirmed state (full node) and confirmed state
//! (solidity node).
//!
//! Both read `gettransactioninfobyid`; they differ only in the endpoint
//! prefix. Neither can list events by contract.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use chainevents_core::{EventError, EventSource, RawLog, ResourceNode};

use crate::transport::HttpTransport;
use crate::wire::NodeTransactionInfo;

const FULL_NODE_TX_INFO: &str = "/wallet/gettransactioninfobyid";
const SOLIDITY_NODE_TX_INFO: &str = "/walletsolidity/gettransactioninfobyid";

/// Shared by-transaction lookup against a node endpoint.
#[derive(Clone)]
pub struct NodeSource {
    transport: Arc<dyn HttpTransport>,
    kind: ResourceNode,
    path: &'static str,
}

impl NodeSource {
    fn new(transport: Arc<dyn HttpTransport>, kind: ResourceNode, path: &'static str) -> Self {
        Self {
            transport,
            kind,
            path,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.transport.base_url(), self.path)
    }

    async fn transaction_logs(&self, tx_id: &str) -> Result<Vec<RawLog>, EventError> {
        let what = format!("transaction {tx_id}");
        let body = json!({ "value": tx_id });
        let resp = self
            .transport
            .post(self.path, &body)
            .await
            .map_err(|e| e.into_event_error(self.kind, &what))?;

        // Nodes answer `{}` for transactions they do not know (yet)
        if is_empty_object(&resp) {
            return Err(EventError::not_found(self.kind, what));
        }

        let info: NodeTransactionInfo = serde_json::from_value(resp).map_err(|e| {
            EventError::unavailable(self.kind, format!("malformed transaction info: {e}"))
        })?;
        let logs = info.into_raw_logs(tx_id)?;

        tracing::debug!(
            node = %self.kind,
            tx_id,
            logs = logs.len(),
            "fetched transaction info"
        );
        Ok(logs)
    }
}

fn is_empty_object(v: &Value) -> bool {
    match v {
        Value::Object(map) => map.is_empty(),
        Value::Null => true,
        _ => false,
    }
}

/// Unconfirmed-state source backed by a full node.
#[derive(Clone)]
pub struct UnconfirmedSource(NodeSource);

impl UnconfirmedSource {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self(NodeSource::new(transport, ResourceNode::FullNode, FULL_NODE_TX_INFO))
    }

    pub fn endpoint(&self) -> String {
        self.0.endpoint()
    }
}

#[async_trait]
impl EventSource for UnconfirmedSource {
    fn kind(&self) -> ResourceNode {
        ResourceNode::FullNode
    }

    async fn fetch_by_transaction(&self, tx_id: &str) -> Result<Vec<RawLog>, EventError> {
        self.0.transaction_logs(tx_id).await
    }
}

/// Confirmed-state source backed by a solidity node.
#[derive(Clone)]
pub struct ConfirmedSource(NodeSource);

impl ConfirmedSource {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self(NodeSource::new(
            transport,
            ResourceNode::SolidityNode,
            SOLIDITY_NODE_TX_INFO,
        ))
    }

    pub fn endpoint(&self) -> String {
        self.0.endpoint()
    }
}

#[async_trait]
impl EventSource for ConfirmedSource {
    fn kind(&self) -> ResourceNode {
        ResourceNode::SolidityNode
    }

    async fn fetch_by_transaction(&self, tx_id: &str) -> Result<Vec<RawLog>, EventError> {
        self.0.transaction_logs(tx_id).await
    }
}
