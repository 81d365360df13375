//! Offline time-entry log.
//!
//! Time entries captured without connectivity. The caller's payload is kept
//! verbatim next to the bookkeeping fields.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::queue::json_kind;
use super::{KEY_TIME_ENTRIES, NAMESPACE};
use crate::clock::Clock;
use crate::error::{Result, ValidationError};
use crate::ids::generate_id;
use crate::storage::{JsonSlot, PreferenceStore};

/// Keys owned by the log; caller-supplied values for them are replaced.
const RESERVED_KEYS: [&str; 4] = ["id", "createdAt", "synced", "syncedAt"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedTimeEntry {
    pub id: String,
    pub created_at: i64,
    #[serde(default)]
    pub synced: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<i64>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedEntry {
    pub success: bool,
    pub entry_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTimeEntries {
    pub time_entries: Vec<QueuedTimeEntry>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearedEntries {
    pub success: bool,
    pub remaining_entries: usize,
}

pub struct TimeEntryLog {
    slot: JsonSlot<Vec<QueuedTimeEntry>>,
    clock: Arc<dyn Clock>,
}

impl TimeEntryLog {
    pub fn new(store: Arc<dyn PreferenceStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            slot: JsonSlot::new(store, NAMESPACE, KEY_TIME_ENTRIES),
            clock,
        }
    }

    pub fn record(&self, time_entry: Value) -> Result<RecordedEntry> {
        let mut fields = match time_entry {
            Value::Object(map) => map,
            Value::Null => return Err(ValidationError::Missing("timeEntry").into()),
            other => {
                return Err(ValidationError::InvalidValue {
                    field: "timeEntry",
                    message: format!("expected an object, got {}", json_kind(&other)),
                }
                .into())
            }
        };
        for key in RESERVED_KEYS {
            fields.remove(key);
        }

        let guard = self.slot.lock()?;
        let mut entries = guard.load()?;
        let now = self.clock.now_ms();
        let id = generate_id(now, entries.iter().map(|e| e.id.as_str()));

        entries.push(QueuedTimeEntry {
            id: id.clone(),
            created_at: now,
            synced: false,
            synced_at: None,
            fields,
        });
        guard.store(&entries)?;

        tracing::info!(entry_id = %id, "recorded offline time entry");
        Ok(RecordedEntry {
            success: true,
            entry_id: id,
        })
    }

    pub fn list_pending(&self) -> Result<PendingTimeEntries> {
        let entries: Vec<QueuedTimeEntry> = self
            .slot
            .read()?
            .into_iter()
            .filter(|e| !e.synced)
            .collect();
        Ok(PendingTimeEntries {
            count: entries.len(),
            time_entries: entries,
        })
    }

    /// Same contract as the action queue: unknown ids are a silent no-op.
    pub fn mark_synced(&self, id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Err(ValidationError::Missing("entryId").into());
        }

        let guard = self.slot.lock()?;
        let mut entries = guard.load()?;
        match entries.iter_mut().find(|e| e.id == id) {
            Some(entry) if !entry.synced => {
                entry.synced = true;
                entry.synced_at = Some(self.clock.now_ms());
                guard.store(&entries)?;
                tracing::info!(entry_id = id, "marked time entry synced");
            }
            Some(_) => {}
            None => tracing::debug!(entry_id = id, "mark synced: no such time entry"),
        }
        Ok(())
    }

    pub fn clear_synced(&self) -> Result<ClearedEntries> {
        let guard = self.slot.lock()?;
        let mut entries = guard.load()?;
        entries.retain(|e| !e.synced);
        guard.store(&entries)?;
        Ok(ClearedEntries {
            success: true,
            remaining_entries: entries.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::CoreError;
    use crate::storage::MemoryPreferences;
    use serde_json::json;

    fn log() -> (TimeEntryLog, Arc<MemoryPreferences>, ManualClock) {
        let store = Arc::new(MemoryPreferences::new());
        let clock = ManualClock::new(1_000);
        let log = TimeEntryLog::new(store.clone(), Arc::new(clock.clone()));
        (log, store, clock)
    }

    #[test]
    fn record_requires_object() {
        let (log, _, _) = log();
        assert!(matches!(
            log.record(Value::Null),
            Err(CoreError::Validation(ValidationError::Missing("timeEntry")))
        ));
        assert!(matches!(
            log.record(json!("hours")),
            Err(CoreError::Validation(ValidationError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn record_passes_fields_through_and_owns_bookkeeping() {
        let (log, _, _) = log();
        let recorded = log
            .record(json!({
                "projectId": "P1",
                "duration": 90,
                "id": "caller-id",
                "synced": true
            }))
            .unwrap();

        let pending = log.list_pending().unwrap();
        assert_eq!(pending.count, 1);
        let entry = &pending.time_entries[0];
        assert_eq!(entry.id, recorded.entry_id);
        assert_eq!(entry.created_at, 1_000);
        assert!(!entry.synced);
        assert_eq!(entry.fields["projectId"], "P1");
        assert_eq!(entry.fields["duration"], 90);
        assert!(!entry.fields.contains_key("id"));
    }

    #[test]
    fn wire_shape_is_flat() {
        let (log, _, _) = log();
        log.record(json!({"projectId": "P1"})).unwrap();
        let value = serde_json::to_value(log.list_pending().unwrap()).unwrap();
        let entry = &value["timeEntries"][0];
        assert_eq!(entry["projectId"], "P1");
        assert_eq!(entry["synced"], false);
        assert_eq!(entry["createdAt"], 1_000);
    }

    #[test]
    fn pending_preserves_insertion_order_and_filters_synced() {
        let (log, _, clock) = log();
        let ids: Vec<String> = (0..3)
            .map(|i| {
                clock.advance(1);
                log.record(json!({"n": i})).unwrap().entry_id
            })
            .collect();

        log.mark_synced(&ids[1]).unwrap();
        let pending = log.list_pending().unwrap();
        let listed: Vec<&str> = pending.time_entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(listed, vec![ids[0].as_str(), ids[2].as_str()]);

        assert_eq!(log.clear_synced().unwrap().remaining_entries, 2);
    }

    #[test]
    fn mark_synced_requires_id() {
        let (log, _, _) = log();
        for blank in ["", "  \t"] {
            assert!(matches!(
                log.mark_synced(blank),
                Err(CoreError::Validation(ValidationError::Missing("entryId")))
            ));
        }
    }

    #[test]
    fn corrupt_blob_aborts_without_mutation() {
        let (log, store, _) = log();
        store.put(NAMESPACE, KEY_TIME_ENTRIES, "[{\"id\":").unwrap();

        assert!(matches!(log.record(json!({"minutes": 5})), Err(CoreError::Storage(_))));
        assert!(matches!(log.list_pending(), Err(CoreError::Storage(_))));
        assert!(matches!(log.mark_synced("1000_1"), Err(CoreError::Storage(_))));
        assert!(matches!(log.clear_synced(), Err(CoreError::Storage(_))));
        assert_eq!(
            store.get(NAMESPACE, KEY_TIME_ENTRIES).unwrap().as_deref(),
            Some("[{\"id\":")
        );
    }
}
