//! Persistent state for the device plugins.
//!
//! All plugin state lives in a namespaced key-value [`PreferenceStore`].
//! Components never hold long-lived copies of a collection: each operation
//! loads the blob, mutates it and writes it back through a [`JsonSlot`].

mod config;
pub mod prefs;
pub mod slot;

pub use config::{Config, LocationConfig, NetworkConfig, SignatureConfig, TrackingConfig};
pub use prefs::{CollectionLocks, MemoryPreferences, PreferenceStore, SqlitePreferences};
pub use slot::{JsonSlot, SlotGuard};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the fieldkit data directory, creating it if needed.
///
/// `FIELDKIT_DATA_DIR` wins when set. Otherwise `~/.config/fieldkit[-dev]/`,
/// with `FIELDKIT_ENV=dev` selecting the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("FIELDKIT_DATA_DIR") {
        Some(explicit) if !explicit.is_empty() => PathBuf::from(explicit),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("FIELDKIT_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("fieldkit-dev")
            } else {
                base_dir.join("fieldkit")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
