//! Offline action queue.
//!
//! Append-only list of actions recorded while the device could not reach
//! the backend. Entries move from pending to synced when the host confirms
//! upload; synced entries stay in the blob until [`ActionQueue::clear_synced`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::clock::Clock;
use crate::error::{Result, ValidationError};
use crate::ids::generate_id;
use crate::storage::{JsonSlot, PreferenceStore};

use super::{KEY_PENDING_ACTIONS, NAMESPACE};

/// One recorded action as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedAction {
    pub id: String,
    pub action_type: String,
    pub action_data: Map<String, Value>,
    pub timestamp: i64,
    #[serde(default)]
    pub synced: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<i64>,
}

/// Pending action as reported to the host (no sync bookkeeping).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAction {
    pub id: String,
    pub action_type: String,
    pub action_data: Map<String, Value>,
    pub timestamp: i64,
}

impl From<QueuedAction> for PendingAction {
    fn from(action: QueuedAction) -> Self {
        Self {
            id: action.id,
            action_type: action.action_type,
            action_data: action.action_data,
            timestamp: action.timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Enqueued {
    pub success: bool,
    pub action_id: String,
    /// Total entries in the blob, synced ones included.
    pub queue_length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingActions {
    pub pending_actions: Vec<PendingAction>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearedActions {
    pub success: bool,
    pub remaining_actions: usize,
}

pub struct ActionQueue {
    slot: JsonSlot<Vec<QueuedAction>>,
    clock: Arc<dyn Clock>,
}

impl ActionQueue {
    pub fn new(store: Arc<dyn PreferenceStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            slot: JsonSlot::new(store, NAMESPACE, KEY_PENDING_ACTIONS),
            clock,
        }
    }

    /// Append a pending action.
    ///
    /// `action_type` must be non-blank and `action_data` a JSON object.
    pub fn enqueue(&self, action_type: &str, action_data: Value) -> Result<Enqueued> {
        if action_type.trim().is_empty() {
            return Err(ValidationError::Missing("actionType").into());
        }
        let action_data = match action_data {
            Value::Object(map) => map,
            Value::Null => return Err(ValidationError::Missing("actionData").into()),
            other => {
                return Err(ValidationError::InvalidValue {
                    field: "actionData",
                    message: format!("expected an object, got {}", json_kind(&other)),
                }
                .into())
            }
        };

        let guard = self.slot.lock()?;
        let mut actions = guard.load()?;
        let now = self.clock.now_ms();
        let id = generate_id(now, actions.iter().map(|a| a.id.as_str()));

        actions.push(QueuedAction {
            id: id.clone(),
            action_type: action_type.to_string(),
            action_data,
            timestamp: now,
            synced: false,
            synced_at: None,
        });
        guard.store(&actions)?;

        tracing::info!(action_id = %id, action_type, queue_length = actions.len(), "queued offline action");
        Ok(Enqueued {
            success: true,
            action_id: id,
            queue_length: actions.len(),
        })
    }

    /// Unsynced actions in insertion order.
    pub fn list_pending(&self) -> Result<PendingActions> {
        let pending: Vec<PendingAction> = self
            .slot
            .read()?
            .into_iter()
            .filter(|a| !a.synced)
            .map(PendingAction::from)
            .collect();
        tracing::debug!(count = pending.len(), "listed pending actions");
        Ok(PendingActions {
            count: pending.len(),
            pending_actions: pending,
        })
    }

    /// Mark the first action with `id` as synced.
    ///
    /// Unknown ids succeed without touching the store. Re-marking keeps the
    /// original `synced_at`.
    pub fn mark_synced(&self, id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Err(ValidationError::Missing("actionId").into());
        }

        let guard = self.slot.lock()?;
        let mut actions = guard.load()?;
        match actions.iter_mut().find(|a| a.id == id) {
            Some(action) if action.synced => {
                tracing::debug!(action_id = id, "action already synced");
            }
            Some(action) => {
                action.synced = true;
                action.synced_at = Some(self.clock.now_ms());
                guard.store(&actions)?;
                tracing::info!(action_id = id, "marked action synced");
            }
            None => {
                tracing::debug!(action_id = id, "mark synced: no such action");
            }
        }
        Ok(())
    }

    /// Drop synced actions, returning how many pending ones remain.
    pub fn clear_synced(&self) -> Result<ClearedActions> {
        let guard = self.slot.lock()?;
        let mut actions = guard.load()?;
        let before = actions.len();
        actions.retain(|a| !a.synced);
        guard.store(&actions)?;

        tracing::info!(removed = before - actions.len(), remaining = actions.len(), "cleared synced actions");
        Ok(ClearedActions {
            success: true,
            remaining_actions: actions.len(),
        })
    }

    /// Number of unsynced actions.
    pub fn len(&self) -> Result<usize> {
        Ok(self.slot.read()?.iter().filter(|a| !a.synced).count())
    }

    /// Every persisted action, synced ones included.
    pub fn all(&self) -> Result<Vec<QueuedAction>> {
        Ok(self.slot.read()?)
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
