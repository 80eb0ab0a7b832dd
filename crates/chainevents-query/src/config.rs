//! Query service configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Records requested per event-server page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Upper bound on pages followed for one by-contract query
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    /// Append the event server to the by-transaction tier list
    #[serde(default)]
    pub include_indexed_in_transaction_lookup: bool,
}

fn default_page_size() -> usize { 200 }
fn default_max_pages() -> usize { 50 }

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            include_indexed_in_transaction_lookup: false,
        }
    }
}
