use clap::Subcommand;
use fieldkit_core::{Config, ConfigError};
use serde_json::json;

use super::{print_json, CmdResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "tracking.location_timeout_ms", "signature.width")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// Print the whole config as JSON
    Show,
}

pub fn run(action: ConfigAction) -> CmdResult {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config
                .get(&key)
                .ok_or_else(|| ConfigError::UnknownKey(key.clone()))?;
            print_json(&json!({ "key": key, "value": value }))
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            print_json(&json!({ "success": true, "key": key, "value": config.get(&key) }))
        }
        ConfigAction::Show => print_json(&Config::load()?),
    }
}
