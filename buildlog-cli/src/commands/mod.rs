//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod tail;

pub use tail::TailArgs;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Follow the live log of a build, or of all builds with --lobby
    Tail(TailArgs),
}

/// Handle a CLI command
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Tail(args) => tail::handle_tail_command(args, config).await,
    }
}
