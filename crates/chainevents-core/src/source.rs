//! The `EventSource` trait: one implementation per backend kind.
//!
//! A source translates a logical query into the request shape of its
//! backend and maps the response into [`RawLog`] records. Sources are
//! object-safe so the query service can hold an ordered tier list of
//! `Arc<dyn EventSource>`.

use async_trait::async_trait;

use crate::error::EventError;
use crate::event::{RawLog, ResourceNode};
use crate::query::{ContractQuery, LogPage};

#[async_trait]
pub trait EventSource: Send + Sync {
    /// Which backend this source talks to.
    fn kind(&self) -> ResourceNode;

    /// All logs emitted by a transaction.
    ///
    /// Fails with `NotFound` if the transaction is unknown to this backend.
    async fn fetch_by_transaction(&self, tx_id: &str) -> Result<Vec<RawLog>, EventError>;

    /// One page of logs emitted by a contract.
    ///
    /// Only backends with a durable, queryable history implement this; the
    /// default answers `UnsupportedQuery`.
    async fn fetch_by_contract(
        &self,
        _query: &ContractQuery,
        _page_token: Option<&str>,
    ) -> Result<LogPage, EventError> {
        Err(EventError::UnsupportedQuery {
            node: self.kind(),
            query: "by-contract",
        })
    }

    /// Returns `true` if `fetch_by_contract` is served.
    fn supports_contract_queries(&self) -> bool {
        false
    }
}
