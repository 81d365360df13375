//! # Fieldkit Core Library
//!
//! Device-side plugin logic for a field-service client: an offline action
//! queue, offline time entries, a single-session time tracker and signature
//! capture for delivery notes. All state is persisted in a namespaced
//! key-value preference store so it survives restarts and connectivity loss.
//!
//! ## Architecture
//!
//! - **Storage**: SQLite-backed preference store and TOML configuration
//! - **OfflineSync**: action queue, time-entry log and connectivity status
//! - **TimeTracking**: Idle / Tracking / Paused session with optional location
//! - **DeliveryNotes**: stroke rasterizer and pending-signature list
//! - **Bridge**: `(plugin, method, args)` dispatcher over the three plugins
//!
//! ## Key Components
//!
//! - [`Bridge`]: JSON entry point used by hosts and the CLI
//! - [`ActionQueue`]: offline action queue
//! - [`TimeTracker`]: time-tracking state machine
//! - [`DeliveryNotes`]: signature capture
//! - [`Config`]: application configuration management

pub mod bridge;
pub mod clock;
pub mod error;
pub mod ids;
pub mod offline;
pub mod signature;
pub mod storage;
pub mod tracking;

pub use bridge::Bridge;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use offline::{
    ActionQueue, ConnectionType, ConnectivityProbe, NetworkStatus, OfflineSync, StaticConnectivity,
    TimeEntryLog,
};
pub use signature::{rasterize, DeliveryNotes, SignatureData, SignaturePath};
pub use storage::{Config, MemoryPreferences, PreferenceStore, SqlitePreferences};
pub use tracking::{GeoPoint, LocationProvider, SessionState, TimeTracker};
