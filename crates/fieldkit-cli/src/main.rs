use clap::{Parser, Subcommand};
use fieldkit_core::CoreError;

mod commands;

#[derive(Parser)]
#[command(name = "fieldkit", version, about = "Fieldkit device plugins CLI")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Offline action queue
    Queue {
        #[command(subcommand)]
        action: commands::queue::QueueAction,
    },
    /// Offline time entries
    Entries {
        #[command(subcommand)]
        action: commands::entries::EntriesAction,
    },
    /// Time-tracking session control
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Signatures and delivery notes
    Signature {
        #[command(subcommand)]
        action: commands::signature::SignatureAction,
    },
    /// Print the current network status
    Network,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Raw plugin call, e.g. `fieldkit call OfflineSync getQueueLength`
    Call(commands::call::CallArgs),
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Queue { action } => commands::queue::run(action),
        Commands::Entries { action } => commands::entries::run(action),
        Commands::Session { action } => commands::session::run(action),
        Commands::Signature { action } => commands::signature::run(action),
        Commands::Network => commands::network::run(),
        Commands::Config { action } => commands::config::run(action),
        Commands::Call(args) => commands::call::run(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(exit_code(e.as_ref()));
    }
}

/// `FIELDKIT_LOG` wins over the verbosity flag. Logs go to stderr so stdout
/// stays machine-readable.
fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match std::env::var("FIELDKIT_LOG") {
        Ok(directives) if !directives.is_empty() => EnvFilter::new(directives),
        _ => match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            _ => EnvFilter::new("debug"),
        },
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn exit_code(err: &(dyn std::error::Error + 'static)) -> i32 {
    match err.downcast_ref::<CoreError>().map(CoreError::kind) {
        Some("validation") => 2,
        Some("invalid_state") => 3,
        Some("storage") => 4,
        _ => 1,
    }
}
