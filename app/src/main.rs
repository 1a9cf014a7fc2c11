#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod command;
mod operator;

use command::{
    ChatInput, ChatStrategy, CommandStrategy, HistoryInput, HistoryStrategy, InfoStrategy,
    InitStrategy, ResetStrategy, VersionStrategy,
};

#[derive(Parser)]
#[command(name = "conflusso")]
#[command(about = "A three-voice dialogue between you and two AI personas", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/conflusso/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Enter the dialogue (default)
    Chat,
    /// Create the configuration template
    Init,
    /// Show configuration, storage paths and the stored assistant binding
    Info,
    /// Print the last entries of the conversation log
    History {
        /// Number of entries to print
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
    /// Forget the stored assistant and thread so they are recreated
    Reset,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // The dialogue owns stdout; diagnostics go to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let config_path = cli.config;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => ChatStrategy.execute(ChatInput { config_path }).await,
        Commands::Init => InitStrategy.execute(()).await,
        Commands::Info => InfoStrategy.execute(config_path).await,
        Commands::History { limit } => {
            HistoryStrategy
                .execute(HistoryInput { config_path, limit })
                .await
        }
        Commands::Reset => ResetStrategy.execute(config_path).await,
        Commands::Version => VersionStrategy.execute(()).await,
    }
}
