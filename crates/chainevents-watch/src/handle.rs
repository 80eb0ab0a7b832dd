//! `WatchHandle`: the caller's (and the callback's) view of one watch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chainevents_core::EventQuery;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::cursor::EventCursor;

struct Shared {
    id: u64,
    active: AtomicBool,
    wake: Notify,
    query: EventQuery,
    poll_interval: Duration,
    /// Written only by the watch task
    cursor: Mutex<EventCursor>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// Handle to a running watch. Cheap to clone; all clones control the same
/// subscription.
///
/// States: active → stopped (terminal).
#[derive(Clone)]
pub struct WatchHandle {
    shared: Arc<Shared>,
}

impl WatchHandle {
    pub(crate) fn new(id: u64, query: EventQuery, poll_interval: Duration, cursor: EventCursor) -> Self {
        Self {
            shared: Arc::new(Shared {
                id,
                active: AtomicBool::new(true),
                wake: Notify::new(),
                query,
                poll_interval,
                cursor: Mutex::new(cursor),
                task: Mutex::new(None),
            }),
        }
    }

    pub(crate) fn attach(&self, task: JoinHandle<()>) {
        *self.shared.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
    }

    pub(crate) fn publish_cursor(&self, cursor: &EventCursor) {
        *self.shared.cursor.lock().unwrap_or_else(PoisonError::into_inner) = cursor.clone();
    }

    /// Resolves when `stop()` is called (or immediately if it already was).
    pub(crate) async fn stopped(&self) {
        if self.is_active() {
            self.shared.wake.notified().await;
        }
    }

    pub fn id(&self) -> u64 {
        self.shared.id
    }

    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Stop the watch. Idempotent; safe to call from inside the callback.
    ///
    /// Once this returns, the callback is not invoked again, including for
    /// the remainder of a poll already in flight.
    pub fn stop(&self) {
        if self.shared.active.swap(false, Ordering::SeqCst) {
            tracing::info!(watch_id = self.shared.id, "watch stop requested");
            // Stores a permit if the task is not parked yet
            self.shared.wake.notify_one();
        }
    }

    pub fn query(&self) -> &EventQuery {
        &self.shared.query
    }

    pub fn poll_interval(&self) -> Duration {
        self.shared.poll_interval
    }

    /// Snapshot of the last-seen cursor.
    pub fn last_seen_cursor(&self) -> EventCursor {
        self.shared
            .cursor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Wait for the watch task to terminate. Call `stop()` first, or the
    /// callback must stop the watch itself. Must not be awaited from inside
    /// the callback.
    pub async fn join(&self) {
        let task = self
            .shared
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::error!(watch_id = self.shared.id, error = %e, "watch task failed");
            }
        }
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("id", &self.shared.id)
            .field("active", &self.is_active())
            .field("query", &self.shared.query)
            .field("poll_interval", &self.shared.poll_interval)
            .finish()
    }
}
