//! Application state for the web layer.

use std::sync::Arc;

use tokio::sync::Notify;

use crate::alerts::EventLog;
use crate::poller::SnapshotStore;

/// Shared application state.
///
/// The poller writes, the handlers only read.
#[derive(Clone)]
pub struct AppState {
    /// Latest snapshot per route
    pub snapshots: SnapshotStore,

    /// Recently emitted events
    pub events: EventLog,

    /// Wakes the poller for an extra cycle
    pub refresh: Arc<Notify>,
}

impl AppState {
    pub fn new(snapshots: SnapshotStore, events: EventLog, refresh: Arc<Notify>) -> Self {
        Self {
            snapshots,
            events,
            refresh,
        }
    }
}
