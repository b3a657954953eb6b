//! Channel transport layer
//!
//! A transport multiplexes channel joins over one connection. The log stream
//! engine only talks to the [`ChannelTransport`] trait so it can run over a
//! real websocket or an in-process transport in tests.

mod memory;
mod socket;

pub use memory::{JoinBehavior, MemoryTransport};
pub use socket::PhoenixSocket;

use async_trait::async_trait;
use buildlog_core::protocol::Message;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::Result;

/// Transport trait for channel operations
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    /// Joins `topic` and waits for the server's reply
    ///
    /// # Arguments
    /// * `topic` - The topic to join (e.g., "build:42")
    /// * `params` - Join metadata sent with the request
    ///
    /// # Returns
    /// `Joined::Ok` with the stream of messages for this join, or
    /// `Joined::Error` when the server refused. Transport failures and
    /// timeouts are returned as `Err`.
    ///
    /// A join that is dropped or times out after its request went out must
    /// not stay joined on the server.
    async fn join(&self, topic: &str, params: Value) -> Result<Joined>;

    /// Leaves a channel joined with `join_ref`
    async fn leave(&self, topic: &str, join_ref: &str) -> Result<()>;
}

/// Server answer to a join
#[derive(Debug)]
pub enum Joined {
    /// Join accepted
    Ok {
        response: Value,
        channel: ChannelEvents,
    },
    /// Join refused
    Error { response: Value },
}

/// Messages delivered to one joined channel, in server order
#[derive(Debug)]
pub struct ChannelEvents {
    join_ref: String,
    rx: mpsc::UnboundedReceiver<Message>,
}

impl ChannelEvents {
    pub fn new(join_ref: impl Into<String>, rx: mpsc::UnboundedReceiver<Message>) -> Self {
        Self {
            join_ref: join_ref.into(),
            rx,
        }
    }

    /// Ref of the join these events belong to; needed to leave
    pub fn join_ref(&self) -> &str {
        &self.join_ref
    }

    /// Next message, or `None` once the transport dropped the channel
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }
}

/// Whether a message addressed to `msg_join_ref` belongs to a member joined with `join_ref`
///
/// Messages without a join ref (broadcasts) go to every member of the topic;
/// messages carrying another join ref are outdated and dropped.
pub(crate) fn is_member(msg_join_ref: Option<&str>, join_ref: &str) -> bool {
    match msg_join_ref {
        None => true,
        Some(r) => r == join_ref,
    }
}
