use clap::Subcommand;
use serde_json::json;

use super::{open_bridge, parse_json_arg, print_json, CmdResult};

#[derive(Subcommand)]
pub enum QueueAction {
    /// Queue an action for later sync
    Add {
        /// Action type tag (e.g. "time_entry_created")
        action_type: String,
        /// Action payload as a JSON object
        data: String,
    },
    /// List actions not yet synced
    Pending,
    /// Mark an action as synced
    MarkSynced {
        /// Action ID
        id: String,
    },
    /// Drop all synced actions
    ClearSynced,
    /// Print the number of pending actions
    Length,
}

pub fn run(action: QueueAction) -> CmdResult {
    let bridge = open_bridge()?;
    let queue = &bridge.offline().actions;
    match action {
        QueueAction::Add { action_type, data } => {
            let data = parse_json_arg("actionData", &data)?;
            print_json(&queue.enqueue(&action_type, data)?)
        }
        QueueAction::Pending => print_json(&queue.list_pending()?),
        QueueAction::MarkSynced { id } => {
            queue.mark_synced(&id)?;
            print_json(&json!({ "success": true }))
        }
        QueueAction::ClearSynced => print_json(&queue.clear_synced()?),
        QueueAction::Length => print_json(&json!({ "length": queue.len()? })),
    }
}
