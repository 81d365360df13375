use clap::Subcommand;

use super::{open_bridge, print_json, CmdResult};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Start tracking time on a project
    Start {
        /// Project ID
        project_id: String,
        /// Project display name
        #[arg(long)]
        name: Option<String>,
        /// What is being worked on
        #[arg(long)]
        description: Option<String>,
    },
    /// Stop the running session
    Stop {
        /// Notes attached to the finished session
        #[arg(long)]
        notes: Option<String>,
    },
    /// Pause the running session
    Pause,
    /// Resume a paused session
    Resume,
    /// Print the current session as JSON
    Status,
}

pub fn run(action: SessionAction) -> CmdResult {
    let bridge = open_bridge()?;
    let tracker = bridge.tracker();
    match action {
        SessionAction::Start {
            project_id,
            name,
            description,
        } => print_json(&tracker.start(&project_id, name.as_deref(), description.as_deref())?),
        SessionAction::Stop { notes } => print_json(&tracker.stop(notes.as_deref())?),
        SessionAction::Pause => print_json(&tracker.pause()?),
        SessionAction::Resume => print_json(&tracker.resume()?),
        SessionAction::Status => print_json(&tracker.active()?),
    }
}
