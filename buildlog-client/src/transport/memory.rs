//! In-process channel transport
//!
//! Stands in for a server: joins are answered from a script, pushed events
//! fan out to every member of a topic, and every join and leave is recorded.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use buildlog_core::protocol::{Message, events};
use serde_json::{Value, json};
use tokio::sync::mpsc;

use super::{ChannelEvents, ChannelTransport, Joined};
use crate::error::{ClientError, Result};

/// How the transport answers a join
#[derive(Debug, Clone)]
pub enum JoinBehavior {
    /// Reply `ok` with this response
    Accept(Value),
    /// Reply `error` with this response
    Reject(Value),
    /// Fail right away as if no reply arrived in time
    Timeout,
    /// Never answer; the join stays in flight until it is dropped
    Pending,
}

struct Member {
    topic: String,
    join_ref: String,
    tx: mpsc::UnboundedSender<Message>,
}

struct Inner {
    next_ref: u64,
    script: VecDeque<JoinBehavior>,
    fallback: JoinBehavior,
    joins: Vec<(String, Value)>,
    leaves: Vec<(String, String)>,
    members: Vec<Member>,
}

/// Channel transport that lives entirely in memory
pub struct MemoryTransport {
    inner: Mutex<Inner>,
}

impl MemoryTransport {
    /// Creates a transport that accepts every join
    pub fn new() -> Self {
        Self::with_behavior(JoinBehavior::Accept(json!({})))
    }

    /// Creates a transport answering every join with `behavior`
    pub fn with_behavior(behavior: JoinBehavior) -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_ref: 0,
                script: VecDeque::new(),
                fallback: behavior,
                joins: Vec::new(),
                leaves: Vec::new(),
                members: Vec::new(),
            }),
        }
    }

    /// Queues answers for the next joins; the fallback applies once they run out
    pub fn script(&self, behaviors: impl IntoIterator<Item = JoinBehavior>) {
        self.lock().script.extend(behaviors);
    }

    /// Pushes an event to every member of `topic`
    ///
    /// # Returns
    /// The number of members the event was delivered to
    pub fn push(&self, topic: &str, event: &str, payload: Value) -> usize {
        let mut inner = self.lock();
        inner.members.retain(|m| !m.tx.is_closed());

        inner
            .members
            .iter()
            .filter(|m| m.topic == topic)
            .filter(|m| m.tx.send(Message::push(topic, event, payload.clone())).is_ok())
            .count()
    }

    /// Closes `topic` from the server side
    pub fn close(&self, topic: &str) {
        let mut inner = self.lock();
        for member in inner.members.iter().filter(|m| m.topic == topic) {
            let mut msg = Message::push(topic, events::CLOSE, json!({}));
            msg.join_ref = Some(member.join_ref.clone());
            let _ = member.tx.send(msg);
        }
        inner.members.retain(|m| m.topic != topic);
    }

    /// Every join received so far, as `(topic, params)`
    pub fn joins(&self) -> Vec<(String, Value)> {
        self.lock().joins.clone()
    }

    /// Every leave received so far, as `(topic, join_ref)`
    pub fn leaves(&self) -> Vec<(String, String)> {
        self.lock().leaves.clone()
    }

    /// Number of live members joined to `topic`
    pub fn member_count(&self, topic: &str) -> usize {
        self.lock()
            .members
            .iter()
            .filter(|m| m.topic == topic && !m.tx.is_closed())
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChannelTransport for MemoryTransport {
    async fn join(&self, topic: &str, params: Value) -> Result<Joined> {
        let behavior = {
            let mut inner = self.lock();
            inner.joins.push((topic.to_string(), params));

            match inner.script.pop_front() {
                Some(behavior) => behavior,
                None => inner.fallback.clone(),
            }
        };

        match behavior {
            JoinBehavior::Accept(response) => {
                let mut inner = self.lock();
                inner.next_ref += 1;
                let join_ref = inner.next_ref.to_string();
                let (tx, rx) = mpsc::unbounded_channel();

                inner.members.push(Member {
                    topic: topic.to_string(),
                    join_ref: join_ref.clone(),
                    tx,
                });

                Ok(Joined::Ok {
                    response,
                    channel: ChannelEvents::new(join_ref, rx),
                })
            }
            JoinBehavior::Reject(response) => Ok(Joined::Error { response }),
            JoinBehavior::Timeout => Err(ClientError::Timeout(format!("join {}", topic))),
            JoinBehavior::Pending => std::future::pending().await,
        }
    }

    async fn leave(&self, topic: &str, join_ref: &str) -> Result<()> {
        let mut inner = self.lock();
        inner
            .leaves
            .push((topic.to_string(), join_ref.to_string()));
        inner
            .members
            .retain(|m| !(m.topic == topic && m.join_ref == join_ref));
        Ok(())
    }
}
