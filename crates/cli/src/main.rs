//! Leadline CLI
//!
//! Browse the request inbox and pipeline, view dashboard statistics, manage
//! reply drafts and compose replies from the command line.

mod commands;
mod config;
mod factory;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use leadline_core::{Clock, SystemClock};

use crate::config::LeadlineConfig;

/// Leadline CLI: track customer requests and compose replies.
#[derive(Parser, Debug)]
#[command(name = "leadline", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(
        long,
        env = "LEADLINE_CONFIG",
        default_value = "leadline.toml",
        global = true
    )]
    config: PathBuf,

    /// Output format.
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List inbound requests, newest first.
    Inbox(commands::inbox::InboxArgs),
    /// Show customer requests grouped by pipeline stage.
    Pipeline(commands::pipeline::PipelineArgs),
    /// Show dashboard statistics.
    Stats,
    /// Move a request to another stage.
    Stage(commands::stage::StageArgs),
    /// Manage saved reply drafts.
    Draft(commands::draft::DraftArgs),
    /// Compose a reply to a request.
    Reply(commands::reply::ReplyArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = LeadlineConfig::load(&cli.config)?;

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let now = clock.now();
    let compose = config.compose.to_compose_config();

    match cli.command {
        Command::Inbox(args) => {
            let requests = factory::load_requests(&config.data, now)?;
            commands::inbox::run(&requests, &args, &cli.format)
        }
        Command::Pipeline(args) => {
            let requests = factory::load_requests(&config.data, now)?;
            commands::pipeline::run(&requests, &args, &cli.format)
        }
        Command::Stats => {
            let requests = factory::load_requests(&config.data, now)?;
            commands::stats::run(&requests, now, &cli.format)
        }
        Command::Stage(args) => {
            let mut requests = factory::load_requests(&config.data, now)?;
            commands::stage::run(&mut requests, &args, &cli.format)
        }
        Command::Draft(args) => {
            let drafts = factory::create_drafts(&config.state, &compose, clock)?;
            commands::draft::run(&drafts, &args, now, &cli.format).await
        }
        Command::Reply(args) => {
            let requests = factory::load_requests(&config.data, now)?;
            let drafts = factory::create_drafts(&config.state, &compose, clock)?;
            commands::reply::run(&requests, drafts, compose, &args, &cli.format).await
        }
    }
}
