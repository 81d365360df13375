use clap::Args;
use serde_json::Value;

use super::{open_bridge, parse_json_arg, print_json, CmdResult};

#[derive(Args)]
pub struct CallArgs {
    /// Plugin name (OfflineSync, TimeTracking, DeliveryNotes)
    pub plugin: String,
    /// Method name, e.g. addOfflineAction
    pub method: String,
    /// Arguments as a JSON object
    pub args: Option<String>,
}

pub fn run(call: CallArgs) -> CmdResult {
    let args = match call.args.as_deref() {
        Some(raw) => parse_json_arg("args", raw)?,
        None => Value::Null,
    };
    let bridge = open_bridge()?;
    print_json(&bridge.call(&call.plugin, &call.method, &args)?)
}
