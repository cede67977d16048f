mod config;
mod logging;
mod modules;
mod steps;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mas_http::{HttpSession, RestTransport};
use microanalytic_score::MicroAnalyticScore;
use serde::Serialize;

use config::AppConfig;
use modules::ModulesCommand;
use steps::StepsCommand;

/// masctl - manage and call SAS Micro Analytic Score modules
#[derive(Parser)]
#[command(name = "masctl", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Module lifecycle
    #[command(subcommand)]
    Modules(ModulesCommand),
    /// Step metadata and execution
    #[command(subcommand)]
    Steps(StepsCommand),
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    logging::init(cli.verbose, cli.json_logs, &config.logging)?;

    let session = HttpSession::new(config.session).context("failed to create HTTP session")?;
    tracing::debug!(base_url = session.base_url(), "session ready");
    let transport: Arc<dyn RestTransport> = Arc::new(session);
    let client = MicroAnalyticScore::new(transport, &config.service);

    match cli.command {
        Commands::Modules(cmd) => cmd.run(&client).await,
        Commands::Steps(cmd) => cmd.run(&client).await,
    }
}
