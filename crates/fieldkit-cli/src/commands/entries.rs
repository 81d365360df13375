use clap::Subcommand;
use serde_json::json;

use super::{open_bridge, parse_json_arg, print_json, CmdResult};

#[derive(Subcommand)]
pub enum EntriesAction {
    /// Record a time entry captured offline
    Add {
        /// Entry fields as a JSON object
        entry: String,
    },
    /// List entries not yet synced
    Pending,
    /// Mark an entry as synced
    MarkSynced {
        /// Entry ID
        id: String,
    },
    /// Drop all synced entries
    ClearSynced,
}

pub fn run(action: EntriesAction) -> CmdResult {
    let bridge = open_bridge()?;
    let entries = &bridge.offline().time_entries;
    match action {
        EntriesAction::Add { entry } => {
            let entry = parse_json_arg("timeEntry", &entry)?;
            print_json(&entries.record(entry)?)
        }
        EntriesAction::Pending => print_json(&entries.list_pending()?),
        EntriesAction::MarkSynced { id } => {
            entries.mark_synced(&id)?;
            print_json(&json!({ "success": true }))
        }
        EntriesAction::ClearSynced => print_json(&entries.clear_synced()?),
    }
}
