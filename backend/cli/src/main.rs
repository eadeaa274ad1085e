mod chat_cmd;
mod health_cmd;
mod render_cmd;
mod replay_cmd;
mod session_cmd;
mod terminal_output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

use docsight_config::{config_dir, config_file_path, load_and_prepare};
use docsight_logging::init_logger;

#[derive(Parser)]
#[command(name = "docsight")]
#[command(about = "docsight: streaming client for the document-analysis service")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.docsight/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question and stream the answer
    Chat {
        message: String,
        /// Reuse an existing server-side session
        #[arg(long)]
        session: Option<String>,
        /// Print tokens as they arrive instead of the formatted answer
        #[arg(long)]
        raw: bool,
        /// Wait for the whole answer instead of streaming it
        #[arg(long, conflicts_with = "raw")]
        no_stream: bool,
    },
    /// Upload documents into a session
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Add to an existing session instead of starting a new one
        #[arg(long)]
        session: Option<String>,
    },
    /// Delete a server-side session
    Reset {
        #[arg(long)]
        session: String,
    },
    /// Normalize and segment a model response read from FILE or stdin
    Render {
        file: Option<PathBuf>,
        /// Print the block sequence as JSON
        #[arg(long)]
        json: bool,
        /// Strip markdown from prose blocks
        #[arg(long, conflicts_with = "json")]
        plain: bool,
    },
    /// Decode a captured event-stream transcript and print its events
    Replay {
        file: PathBuf,
        /// Bytes per simulated network chunk
        #[arg(long, default_value_t = 64)]
        chunk_size: usize,
    },
    /// Check that the analysis service is reachable
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| config_file_path(&config_dir()));
    let config = load_and_prepare(&path).await?;

    init_logger(config.log_level(), config.log_dir(), config.log_json());
    debug!(path = %path.display(), base_url = config.base_url(), "Configuration loaded");

    match cli.command {
        Commands::Chat {
            message,
            session,
            raw,
            no_stream,
        } => chat_cmd::run(&config, &message, session, raw, no_stream).await,
        Commands::Upload { files, session } => session_cmd::upload(&config, &files, session).await,
        Commands::Reset { session } => session_cmd::reset(&config, session).await,
        Commands::Render { file, json, plain } => render_cmd::run(&config, file, json, plain).await,
        Commands::Replay { file, chunk_size } => replay_cmd::run(&file, chunk_size).await,
        Commands::Health => health_cmd::run(&config).await,
    }
}
