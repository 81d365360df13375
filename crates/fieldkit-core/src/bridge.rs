//! Plugin-call dispatcher for host applications.
//!
//! Hosts address operations as `(plugin, method, args)` with a JSON object
//! of arguments and get a JSON object back, the same way they would call a
//! native device plugin. Argument presence is checked here; everything else
//! is delegated to the plugin components.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::clock::Clock;
use crate::error::{Result, ValidationError};
use crate::offline::{OfflineSync, StaticConnectivity};
use crate::signature::{DeliveryNotes, SignatureData, SignaturePath};
use crate::storage::{Config, PreferenceStore};
use crate::tracking::{provider_from_config, TimeTracker};

pub const OFFLINE_SYNC: &str = "OfflineSync";
pub const TIME_TRACKING: &str = "TimeTracking";
pub const DELIVERY_NOTES: &str = "DeliveryNotes";

/// Every `(plugin, method)` pair the bridge answers.
pub const METHODS: &[(&str, &str)] = &[
    (OFFLINE_SYNC, "addOfflineAction"),
    (OFFLINE_SYNC, "getPendingActions"),
    (OFFLINE_SYNC, "markActionSynced"),
    (OFFLINE_SYNC, "clearSyncedActions"),
    (OFFLINE_SYNC, "getQueueLength"),
    (OFFLINE_SYNC, "saveOfflineTimeEntry"),
    (OFFLINE_SYNC, "getOfflineTimeEntries"),
    (OFFLINE_SYNC, "markTimeEntrySynced"),
    (OFFLINE_SYNC, "clearSyncedTimeEntries"),
    (OFFLINE_SYNC, "getNetworkStatus"),
    (TIME_TRACKING, "startTimeTracking"),
    (TIME_TRACKING, "stopTimeTracking"),
    (TIME_TRACKING, "pauseTimeTracking"),
    (TIME_TRACKING, "resumeTimeTracking"),
    (TIME_TRACKING, "getActiveTimeTracking"),
    (DELIVERY_NOTES, "getPendingDeliveryNotes"),
    (DELIVERY_NOTES, "signDeliveryNote"),
    (DELIVERY_NOTES, "getPendingSignatures"),
    (DELIVERY_NOTES, "clearPendingSignatures"),
    (DELIVERY_NOTES, "createSignatureBitmap"),
];

pub struct Bridge {
    offline: OfflineSync,
    tracker: TimeTracker,
    delivery: DeliveryNotes,
}

impl Bridge {
    /// Wire all plugins to one store, with boundaries taken from config.
    pub fn new(store: Arc<dyn PreferenceStore>, clock: Arc<dyn Clock>, config: &Config) -> Self {
        let connectivity = Arc::new(StaticConnectivity::from_config(&config.network));
        Self {
            offline: OfflineSync::new(store.clone(), clock.clone(), connectivity),
            tracker: TimeTracker::new(
                store.clone(),
                clock.clone(),
                provider_from_config(&config.location),
                &config.tracking,
            ),
            delivery: DeliveryNotes::new(store, clock, config.signature.clone()),
        }
    }

    pub fn offline(&self) -> &OfflineSync {
        &self.offline
    }

    pub fn tracker(&self) -> &TimeTracker {
        &self.tracker
    }

    pub fn delivery(&self) -> &DeliveryNotes {
        &self.delivery
    }

    /// Dispatch one plugin call. `args` may be `null` for argument-less methods.
    pub fn call(&self, plugin: &str, method: &str, args: &Value) -> Result<Value> {
        let args = Args::new(args)?;
        tracing::debug!(plugin, method, "bridge call");

        match (plugin, method) {
            (OFFLINE_SYNC, "addOfflineAction") => {
                let action_type = args.required_str("actionType")?;
                let action_data = args.required("actionData")?;
                reply(self.offline.actions.enqueue(action_type, action_data)?)
            }
            (OFFLINE_SYNC, "getPendingActions") => reply(self.offline.actions.list_pending()?),
            (OFFLINE_SYNC, "markActionSynced") => {
                self.offline.actions.mark_synced(args.required_str("actionId")?)?;
                reply(Success { success: true })
            }
            (OFFLINE_SYNC, "clearSyncedActions") => reply(self.offline.actions.clear_synced()?),
            (OFFLINE_SYNC, "getQueueLength") => reply(QueueLength {
                length: self.offline.actions.len()?,
            }),
            (OFFLINE_SYNC, "saveOfflineTimeEntry") => {
                reply(self.offline.time_entries.record(args.required("timeEntry")?)?)
            }
            (OFFLINE_SYNC, "getOfflineTimeEntries") => reply(self.offline.time_entries.list_pending()?),
            (OFFLINE_SYNC, "markTimeEntrySynced") => {
                self.offline.time_entries.mark_synced(args.required_str("entryId")?)?;
                reply(Success { success: true })
            }
            (OFFLINE_SYNC, "clearSyncedTimeEntries") => reply(self.offline.time_entries.clear_synced()?),
            (OFFLINE_SYNC, "getNetworkStatus") => reply(self.offline.network_status()),

            (TIME_TRACKING, "startTimeTracking") => reply(self.tracker.start(
                args.required_str("projectId")?,
                args.optional_str("projectName")?,
                args.optional_str("description")?,
            )?),
            (TIME_TRACKING, "stopTimeTracking") => reply(self.tracker.stop(args.optional_str("notes")?)?),
            (TIME_TRACKING, "pauseTimeTracking") => reply(self.tracker.pause()?),
            (TIME_TRACKING, "resumeTimeTracking") => reply(self.tracker.resume()?),
            (TIME_TRACKING, "getActiveTimeTracking") => reply(self.tracker.active()?),

            (DELIVERY_NOTES, "getPendingDeliveryNotes") => reply(self.delivery.pending_delivery_notes()),
            (DELIVERY_NOTES, "signDeliveryNote") => {
                let delivery_note_id = args.required_str("deliveryNoteId")?;
                let signer_name = args.required_str("signerName")?;
                let signature: SignatureData = args.decode("signatureData")?;
                reply(self.delivery.sign(delivery_note_id, signer_name, &signature)?)
            }
            (DELIVERY_NOTES, "getPendingSignatures") => reply(self.delivery.pending_signatures()?),
            (DELIVERY_NOTES, "clearPendingSignatures") => reply(self.delivery.clear_pending_signatures()?),
            (DELIVERY_NOTES, "createSignatureBitmap") => {
                let paths: Vec<SignaturePath> = args.decode("paths")?;
                reply(self.delivery.create_bitmap(
                    &paths,
                    args.optional_u32("width")?,
                    args.optional_u32("height")?,
                )?)
            }

            _ => Err(ValidationError::UnknownMethod {
                plugin: plugin.to_string(),
                method: method.to_string(),
            }
            .into()),
        }
    }
}

#[derive(Serialize)]
struct Success {
    success: bool,
}

#[derive(Serialize)]
struct QueueLength {
    length: usize,
}

fn reply<T: Serialize>(result: T) -> Result<Value> {
    Ok(serde_json::to_value(result)?)
}

/// Call arguments. Absent and `null` are the same thing.
struct Args<'a> {
    map: Option<&'a Map<String, Value>>,
}

impl<'a> Args<'a> {
    fn new(args: &'a Value) -> Result<Self> {
        match args {
            Value::Null => Ok(Self { map: None }),
            Value::Object(map) => Ok(Self { map: Some(map) }),
            _ => Err(ValidationError::InvalidValue {
                field: "args",
                message: "call arguments must be a JSON object".into(),
            }
            .into()),
        }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map?.get(key).filter(|v| !v.is_null())
    }

    fn required(&self, key: &'static str) -> Result<Value> {
        self.get(key)
            .cloned()
            .ok_or_else(|| ValidationError::Missing(key).into())
    }

    fn required_str(&self, key: &'static str) -> Result<&'a str> {
        self.optional_str(key)?
            .ok_or_else(|| ValidationError::Missing(key).into())
    }

    fn optional_str(&self, key: &'static str) -> Result<Option<&'a str>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(ValidationError::InvalidValue {
                field: key,
                message: "expected a string".into(),
            }
            .into()),
        }
    }

    fn optional_u32(&self, key: &'static str) -> Result<Option<u32>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| {
                    ValidationError::InvalidValue {
                        field: key,
                        message: format!("expected a non-negative integer, got {value}"),
                    }
                    .into()
                }),
        }
    }

    fn decode<T: serde::de::DeserializeOwned>(&self, key: &'static str) -> Result<T> {
        let value = self.required(key)?;
        serde_json::from_value(value).map_err(|e| {
            ValidationError::InvalidValue {
                field: key,
                message: e.to_string(),
            }
            .into()
        })
    }
}
