//! Typed JSON blob bound to one preference key.
//!
//! A [`JsonSlot`] takes its mutex from the store's collection registry, so
//! every load-modify-store cycle on one key performed through a [`SlotGuard`]
//! is serialized within the process, whichever slot instance runs it.
//! A missing key decodes as `T::default()`; an undecodable blob is a
//! [`StorageError::Corrupt`] and is left untouched.

use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::PreferenceStore;
use crate::error::StorageError;

pub struct JsonSlot<T> {
    store: Arc<dyn PreferenceStore>,
    namespace: &'static str,
    key: &'static str,
    lock: Arc<Mutex<()>>,
    _marker: PhantomData<fn() -> T>,
}

/// Exclusive access to a slot for the duration of one operation.
pub struct SlotGuard<'a, T> {
    slot: &'a JsonSlot<T>,
    _guard: MutexGuard<'a, ()>,
}

impl<T> JsonSlot<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(store: Arc<dyn PreferenceStore>, namespace: &'static str, key: &'static str) -> Self {
        let lock = store.collection_lock(namespace, key);
        Self {
            store,
            namespace,
            key,
            lock,
            _marker: PhantomData,
        }
    }

    /// Take the slot lock.
    pub fn lock(&self) -> Result<SlotGuard<'_, T>, StorageError> {
        let guard = self.lock.lock()?;
        Ok(SlotGuard {
            slot: self,
            _guard: guard,
        })
    }

    /// Lock, load and release.
    pub fn read(&self) -> Result<T, StorageError> {
        self.lock()?.load()
    }
}

impl<T> SlotGuard<'_, T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn load(&self) -> Result<T, StorageError> {
        let slot = self.slot;
        match slot.store.get(slot.namespace, slot.key)? {
            None => Ok(T::default()),
            Some(raw) => serde_json::from_str(&raw).map_err(|source| {
                tracing::error!(
                    namespace = slot.namespace,
                    key = slot.key,
                    "persisted blob is corrupt: {source}"
                );
                StorageError::Corrupt {
                    namespace: slot.namespace.to_string(),
                    key: slot.key.to_string(),
                    source,
                }
            }),
        }
    }

    pub fn store(&self, value: &T) -> Result<(), StorageError> {
        let slot = self.slot;
        let raw = serde_json::to_string(value).map_err(|source| StorageError::Encode {
            namespace: slot.namespace.to_string(),
            key: slot.key.to_string(),
            source,
        })?;
        slot.store.put(slot.namespace, slot.key, &raw)
    }

    pub fn remove(&self) -> Result<(), StorageError> {
        self.slot.store.remove(self.slot.namespace, self.slot.key)
    }
}
