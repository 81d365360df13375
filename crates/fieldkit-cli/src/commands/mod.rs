pub mod call;
pub mod config;
pub mod entries;
pub mod network;
pub mod queue;
pub mod session;
pub mod signature;

use std::error::Error;
use std::sync::Arc;

use fieldkit_core::{Bridge, Config, CoreError, SqlitePreferences, SystemClock, ValidationError};
use serde::Serialize;
use serde_json::Value;

pub type CmdResult = Result<(), Box<dyn Error>>;

/// Open the on-disk store and wire all plugins with the saved config.
pub fn open_bridge() -> Result<Bridge, Box<dyn Error>> {
    let config = Config::load()?;
    let store = Arc::new(SqlitePreferences::open()?);
    tracing::debug!(
        pause_stops_session = config.tracking.pause_stops_session,
        location = config.location.enabled,
        "opened fieldkit store"
    );
    Ok(Bridge::new(store, Arc::new(SystemClock), &config))
}

pub fn print_json<T: Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse a JSON command-line argument. Malformed input is a validation error.
pub fn parse_json_arg(field: &'static str, raw: &str) -> Result<Value, CoreError> {
    serde_json::from_str(raw).map_err(|e| {
        ValidationError::InvalidValue {
            field,
            message: format!("not valid JSON: {e}"),
        }
        .into()
    })
}
