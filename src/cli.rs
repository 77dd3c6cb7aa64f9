//! CLI interface for acr.

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod analyze;
pub mod cache;
pub mod config;
pub mod create;
pub mod log;
mod output;
mod pipeline;

/// acr: AI-assisted code review and commit messages for git repositories.
#[derive(Parser)]
#[command(name = "acr")]
#[command(about = "AI-assisted code review and commit messages", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The main command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Main command categories.
#[derive(Subcommand)]
pub enum Commands {
    /// Reviews commits or staged changes.
    Analyze(analyze::AnalyzeCommand),
    /// Lists recent commits.
    Log(log::LogCommand),
    /// Generates a commit message for staged changes.
    Create(create::CreateCommand),
    /// Manages the diff summary cache.
    Cache(cache::CacheCommand),
    /// Configuration and model information.
    Config(config::ConfigCommand),
}

impl Cli {
    /// Executes the CLI command.
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Analyze(cmd) => cmd.execute().await,
            Commands::Log(cmd) => cmd.execute(),
            Commands::Create(cmd) => cmd.execute().await,
            Commands::Cache(cmd) => cmd.execute(),
            Commands::Config(cmd) => cmd.execute(),
        }
    }
}
