//! # chainevents-watch
//!
//! Cancellable polling subscriptions. A watch re-runs one event query on an
//! interval and hands every record it has not delivered before to a
//! callback, oldest first.
//!
//! ```no_run
//! # async fn example(service: chainevents_query::EventQueryService) {
//! use chainevents_core::{ContractQuery, EventQuery};
//! use chainevents_watch::WatchController;
//!
//! let controller = WatchController::new(service);
//! let handle = controller.watch(
//!     EventQuery::contract(ContractQuery::new("TXYZ").event_name("Transfer")),
//!     |handle, event| match event {
//!         Ok(ev) => println!("{} at {}", ev.event_name, ev.block_timestamp),
//!         Err(_) => handle.stop(),
//!     },
//! );
//! handle.stop();
//! handle.join().await;
//! # }
//! ```

pub mod config;
pub mod controller;
pub mod cursor;
pub mod handle;

pub use config::{WatchConfig, WatchOptions, WatchStart};
pub use controller::WatchController;
pub use cursor::EventCursor;
pub use handle::WatchHandle;
