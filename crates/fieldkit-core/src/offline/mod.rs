//! OfflineSync plugin: offline action queue, offline time entries and
//! connectivity status.
//!
//! Nothing here talks to a server. The host drains pending entries through
//! its own sync process and reports back with `mark_synced`.

pub mod network;
pub mod queue;
pub mod time_log;

pub use network::{ConnectionType, ConnectivityProbe, NetworkStatus, StaticConnectivity};
pub use queue::{ActionQueue, ClearedActions, Enqueued, PendingAction, PendingActions, QueuedAction};
pub use time_log::{ClearedEntries, PendingTimeEntries, QueuedTimeEntry, RecordedEntry, TimeEntryLog};

use std::sync::Arc;

use crate::clock::Clock;
use crate::storage::PreferenceStore;

pub const NAMESPACE: &str = "OfflineSyncPrefs";
pub const KEY_PENDING_ACTIONS: &str = "pending_actions";
pub const KEY_TIME_ENTRIES: &str = "offline_time_entries";

/// The OfflineSync plugin's components, sharing one store.
pub struct OfflineSync {
    pub actions: ActionQueue,
    pub time_entries: TimeEntryLog,
    connectivity: Arc<dyn ConnectivityProbe>,
}

impl OfflineSync {
    pub fn new(
        store: Arc<dyn PreferenceStore>,
        clock: Arc<dyn Clock>,
        connectivity: Arc<dyn ConnectivityProbe>,
    ) -> Self {
        Self {
            actions: ActionQueue::new(store.clone(), clock.clone()),
            time_entries: TimeEntryLog::new(store, clock),
            connectivity,
        }
    }

    pub fn network_status(&self) -> NetworkStatus {
        let status = self.connectivity.status();
        tracing::debug!(connected = status.connected, "network status");
        status
    }
}
