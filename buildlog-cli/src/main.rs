//! Buildlog CLI
//!
//! Follows the live log of a build from the command line.

mod commands;
mod config;
mod terminal;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "buildlog")]
#[command(about = "Follow live build logs", long_about = None)]
struct Cli {
    /// Socket endpoint of the build server
    #[arg(
        long,
        env = "BUILDLOG_SOCKET_URL",
        default_value = "ws://localhost:4000/socket"
    )]
    socket_url: String,

    /// Seconds to wait for a join reply
    #[arg(long, default_value_t = 10)]
    join_timeout: u64,

    /// Seconds between socket heartbeats
    #[arg(long, default_value_t = 30)]
    heartbeat_interval: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics go to stderr so stdout only carries log rows
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "buildlog_client=info,buildlog=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::new(cli.socket_url, cli.join_timeout, cli.heartbeat_interval)?;

    handle_command(cli.command, &config).await
}
