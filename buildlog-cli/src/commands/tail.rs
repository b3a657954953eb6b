//! Tail command handler
//!
//! Joins a build's log channel and prints every log event until the channel
//! closes or the user interrupts.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use buildlog_client::{
    BuildSelector, JoinOutcome, LogStreamClient, PhoenixSocket, RetryPolicy, StreamConfig,
    Subscription,
};
use buildlog_core::protocol::{DEFAULT_LOBBY_TOPIC, DEFAULT_TOPIC_PREFIX};
use clap::Args;
use colored::*;
use tracing::info;

use crate::config::Config;
use crate::terminal::TerminalView;

/// Arguments of `tail`
#[derive(Args, Debug)]
pub struct TailArgs {
    /// Build to follow
    #[arg(conflicts_with = "lobby")]
    pub build_id: Option<String>,

    /// Follow the shared lobby topic instead of a single build
    #[arg(long)]
    pub lobby: bool,

    /// Rows kept in memory
    #[arg(long, default_value_t = 1000)]
    pub max_rows: usize,

    /// Join attempts before giving up (1 = no retry)
    #[arg(long, default_value_t = 1)]
    pub join_attempts: u32,

    /// Prefix of per-build topics
    #[arg(long, default_value = DEFAULT_TOPIC_PREFIX)]
    pub topic_prefix: String,

    /// Topic followed with --lobby
    #[arg(long, default_value = DEFAULT_LOBBY_TOPIC)]
    pub lobby_topic: String,

    /// Event rendered as a log row
    #[arg(long, default_value = "build_event")]
    pub event: String,

    /// Module name sent with the join
    #[arg(long, default_value = "Build")]
    pub module: String,
}

impl TailArgs {
    /// Stream settings described by these arguments
    pub fn stream_config(&self) -> Result<StreamConfig> {
        let config = StreamConfig {
            topic_prefix: self.topic_prefix.clone(),
            lobby_topic: self.lobby_topic.clone(),
            event: self.event.clone(),
            ..StreamConfig::default()
        }
        .with_module(self.module.clone())
        .with_max_rows(self.max_rows)
        .with_retry(RetryPolicy::with_attempts(self.join_attempts));

        config.validate()?;
        Ok(config)
    }

    /// Which stream these arguments select
    pub fn selector(&self) -> BuildSelector<'static> {
        if self.lobby {
            BuildSelector::Lobby
        } else {
            BuildSelector::Id(self.build_id.clone().unwrap_or_default())
        }
    }
}

/// Handle the tail command
pub async fn handle_tail_command(args: TailArgs, config: &Config) -> Result<()> {
    let stream_config = args.stream_config()?;
    let selector = args.selector();

    let Some(topic) = selector.resolve_topic(&stream_config) else {
        println!("{}", "No build selected; nothing to follow.".yellow());
        return Ok(());
    };

    let socket = PhoenixSocket::connect(config.socket.clone())
        .await
        .with_context(|| format!("Failed to connect to {}", config.socket.endpoint))?;
    let socket = Arc::new(socket);

    let client = LogStreamClient::new(socket.clone(), stream_config.clone());
    let surface = TerminalView::new(std::io::stdout(), stream_config.max_rows);
    let view = surface.view();

    let Some(subscription) = client.init(selector, surface) else {
        return Ok(());
    };

    eprintln!(
        "{}",
        format!("Following {} on {}", topic, socket.endpoint()).bold()
    );

    let result = follow(subscription, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await;

    if view.evicted() > 0 {
        eprintln!(
            "{}",
            format!("{} older row(s) dropped from memory", view.evicted()).dimmed()
        );
    }

    drop(client);
    if let Ok(socket) = Arc::try_unwrap(socket) {
        // Give the close frame a moment to go out
        let _ = tokio::time::timeout(Duration::from_secs(2), socket.disconnect()).await;
    }

    result
}

/// Waits for the join, then follows the stream until it ends or `interrupt` fires
///
/// An interrupt at any point leaves the channel, even while the join is
/// still in flight.
async fn follow(mut subscription: Subscription, interrupt: impl Future<Output = ()>) -> Result<()> {
    let topic = subscription.topic().to_string();
    tokio::pin!(interrupt);

    let outcome = tokio::select! {
        _ = &mut interrupt => None,
        outcome = subscription.join_outcome() => Some(outcome),
    };

    match outcome {
        None => {
            info!("Interrupted while joining {}", topic);
            subscription.leave().await;
            return Ok(());
        }
        Some(JoinOutcome::Error(payload)) => bail!("Unable to join {}: {}", topic, payload),
        Some(JoinOutcome::Ok(_)) => {}
    }

    let interrupted = tokio::select! {
        _ = &mut interrupt => true,
        _ = subscription.closed() => false,
    };

    if interrupted {
        info!("Interrupted, leaving {}", topic);
        subscription.leave().await;
    }

    Ok(())
}
