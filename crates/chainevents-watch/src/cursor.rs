//! Watch cursor: how far a subscription has delivered.

use chainevents_core::DecodedEvent;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Position of a watch in `(block_timestamp, log_index)` order.
///
/// Several records can share a block timestamp, so the cursor also keeps
/// the `(transaction_id, log_index)` pairs already delivered at exactly
/// `block_timestamp`. A record is new iff its timestamp is later, or equal
/// and not in that set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCursor {
    /// Block timestamp (ms) of the newest delivered record
    pub block_timestamp: i64,
    /// `log_index` of the newest delivered record, if any
    pub log_index: Option<u32>,
    delivered: HashSet<(String, u32)>,
}

impl EventCursor {
    /// A cursor before every record at or after `block_timestamp`.
    pub fn at(block_timestamp: i64) -> Self {
        Self {
            block_timestamp,
            log_index: None,
            delivered: HashSet::new(),
        }
    }

    pub fn is_new(&self, event: &DecodedEvent) -> bool {
        if event.block_timestamp != self.block_timestamp {
            return event.block_timestamp > self.block_timestamp;
        }
        !self
            .delivered
            .contains(&(event.transaction_id.clone(), event.log_index))
    }

    /// Record `event` as delivered. Never moves the cursor backwards.
    pub fn advance(&mut self, event: &DecodedEvent) {
        if event.block_timestamp < self.block_timestamp {
            return;
        }
        if event.block_timestamp > self.block_timestamp {
            self.block_timestamp = event.block_timestamp;
            self.delivered.clear();
            self.log_index = None;
        }
        self.delivered
            .insert((event.transaction_id.clone(), event.log_index));
        self.log_index = Some(self.log_index.map_or(event.log_index, |i| i.max(event.log_index)));
    }

    /// Number of records delivered at the cursor's timestamp.
    pub fn delivered_at_cursor(&self) -> usize {
        self.delivered.len()
    }
}
