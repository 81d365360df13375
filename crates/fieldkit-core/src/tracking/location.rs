//! Location fix boundary for session start.
//!
//! A fix is a nice-to-have: every failure mode (no provider, no fix,
//! provider too slow, provider panicked) collapses into `None`.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::storage::LocationConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Device location source.
///
/// Implementations should answer from a cached or last-known fix; the
/// tracker bounds the wait regardless.
pub trait LocationProvider: Send + Sync {
    fn try_get_location(&self) -> Option<GeoPoint>;
}

/// Provider for hosts without location support.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

impl LocationProvider for NoLocation {
    fn try_get_location(&self) -> Option<GeoPoint> {
        None
    }
}

/// Always reports the same fix.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub GeoPoint);

impl FixedLocation {
    /// `None` unless the config enables a fixed location.
    pub fn from_config(config: &LocationConfig) -> Option<Self> {
        config.enabled.then_some(Self(GeoPoint {
            lat: config.lat,
            lng: config.lng,
        }))
    }
}

impl LocationProvider for FixedLocation {
    fn try_get_location(&self) -> Option<GeoPoint> {
        Some(self.0)
    }
}

/// Provider chosen from config: fixed fix when enabled, otherwise none.
pub fn provider_from_config(config: &LocationConfig) -> Arc<dyn LocationProvider> {
    match FixedLocation::from_config(config) {
        Some(fixed) => Arc::new(fixed),
        None => Arc::new(NoLocation),
    }
}

/// Ask `provider` for a fix, waiting at most `timeout`.
///
/// The lookup runs on its own thread; a lookup that overruns is abandoned
/// and its answer discarded. The abandoned thread is detached, not
/// cancelled: it stays alive until the provider returns, so a provider that
/// never returns parks one thread per timed-out call.
///
/// A provider panic is reported as no fix only when panics unwind. Under
/// `panic = "abort"`, the release profile of this workspace, it terminates
/// the process.
pub fn lookup_bounded(provider: &Arc<dyn LocationProvider>, timeout: Duration) -> Option<GeoPoint> {
    let (tx, rx) = mpsc::sync_channel(1);
    let provider = Arc::clone(provider);
    let spawned = std::thread::Builder::new()
        .name("location-lookup".into())
        .spawn(move || {
            let _ = tx.send(provider.try_get_location());
        });
    if let Err(e) = spawned {
        tracing::warn!("could not spawn location lookup: {e}");
        return None;
    }

    match rx.recv_timeout(timeout) {
        Ok(fix) => {
            if fix.is_none() {
                tracing::debug!("no location fix available");
            }
            fix
        }
        Err(RecvTimeoutError::Timeout) => {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "location lookup timed out");
            None
        }
        Err(RecvTimeoutError::Disconnected) => {
            tracing::warn!("location provider failed without a result");
            None
        }
    }
}
