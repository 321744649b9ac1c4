mod commands;
mod render;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "nowcal")]
#[command(about = "See which meetings are on now, just ended, or coming up next")]
struct Cli {
    /// Log what nowcal is doing to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show ongoing, upcoming and recently ended events
    Events {
        /// Refresh feeds even if the cache is still fresh
        #[arg(short, long)]
        refresh: bool,

        /// Print the ranked list as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fetch every calendar feed now
    Refresh,
    /// Manage calendar feeds
    Sources {
        #[command(subcommand)]
        command: SourcesCommand,
    },
    /// Create a meeting note for a relevant event
    Note {
        /// Pick the Nth event of `nowcal events` instead of prompting
        #[arg(short, long)]
        index: Option<usize>,
    },
    /// Show where nowcal keeps its files
    Config,
}

#[derive(Subcommand)]
enum SourcesCommand {
    List,
    Add {
        name: String,
        /// Feed URL (http, https or webcal)
        url: String,
    },
    Remove {
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Events { refresh, json } => commands::events::run(refresh, json).await,
        Commands::Refresh => commands::refresh::run().await,
        Commands::Sources { command } => match command {
            SourcesCommand::List => commands::sources::list(),
            SourcesCommand::Add { name, url } => commands::sources::add(&name, &url),
            SourcesCommand::Remove { name } => commands::sources::remove(&name),
        },
        Commands::Note { index } => commands::note::run(index).await,
        Commands::Config => commands::config::run(),
    }
}

/// Logs go to stderr so `--json` output stays parseable. RUST_LOG wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "nowcal=debug,nowcal_core=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}
