//! Dossier CLI
//!
//! Main entry point for the dossier command-line tool.
//! Turns a topic into a cited, multi-section research report.

mod commands;

use clap::{Parser, Subcommand};
use commands::{EvidenceCommand, ExportCommand, ResearchCommand};
use dossier_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Dossier - autonomous research reports with cited sources
#[derive(Parser, Debug)]
#[command(name = "dossier")]
#[command(about = "Autonomous research reports with cited sources", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "DOSSIER_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "DOSSIER_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (ollama, openai)
    #[arg(short, long, global = true, env = "DOSSIER_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "DOSSIER_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Research a topic and write a cited report
    Research(ResearchCommand),

    /// Show the passages the RAG pipeline selects for one query
    Evidence(EvidenceCommand),

    /// Export a markdown report to PDF
    Export(ExportCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Research(_) => "research",
            Commands::Evidence(_) => "evidence",
            Commands::Export(_) => "export",
        }
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load()?;

    // An explicit --config is merged on top of the discovered one.
    if let Some(ref path) = cli.config {
        config = config.merge_yaml(path)?;
    }

    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Dossier CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    match &cli.command {
        Commands::Research(_) | Commands::Evidence(_) => config.validate_for_research()?,
        Commands::Export(_) => {}
    }

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let result = match cli.command {
        Commands::Research(cmd) => cmd.execute(&config).await,
        Commands::Evidence(cmd) => cmd.execute(&config).await,
        Commands::Export(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
