//! Websocket channel transport
//!
//! Speaks the Phoenix channel protocol (JSON serializer v2) over a single
//! websocket. One reader task routes incoming frames, one writer task owns the
//! websocket sink, and a heartbeat task keeps the connection alive.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use buildlog_core::protocol::{Message, events};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

use super::{ChannelEvents, ChannelTransport, Joined, is_member};
use crate::config::SocketConfig;
use crate::error::{ClientError, Result};

/// Instruction for the writer task
enum Outbound {
    Frame(Message),
    Close,
}

/// A channel member registered on this socket
struct Member {
    topic: String,
    join_ref: String,
    tx: mpsc::UnboundedSender<Message>,
}

/// Routing state shared by the socket handle and its reader task
#[derive(Default)]
struct Router {
    /// Reply waiters keyed by message ref
    pending: HashMap<String, oneshot::Sender<Message>>,
    members: Vec<Member>,
    closed: bool,
}

struct Shared {
    next_ref: AtomicU64,
    router: Mutex<Router>,
}

impl Shared {
    fn make_ref(&self) -> String {
        (self.next_ref.fetch_add(1, Ordering::Relaxed) + 1).to_string()
    }

    /// Routes one incoming frame to a reply waiter or to channel members
    async fn dispatch(&self, text: &str) {
        let msg = match Message::decode(text) {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Dropping undecodable frame: {}", e);
                return;
            }
        };

        let mut router = self.router.lock().await;

        if msg.is_reply() {
            if let Some(waiter) = msg.msg_ref.as_ref().and_then(|r| router.pending.remove(r)) {
                let _ = waiter.send(msg);
                return;
            }
        }

        let ends_channel = msg.event == events::CLOSE || msg.event == events::ERROR;
        let mut delivered = 0;

        router.members.retain(|member| {
            if member.topic != msg.topic || !is_member(msg.join_ref.as_deref(), &member.join_ref) {
                return !member.tx.is_closed();
            }

            let sent = member.tx.send(msg.clone()).is_ok();
            if sent {
                delivered += 1;
            }

            // A close or error addressed to this join ends its membership
            sent && !(ends_channel && msg.join_ref.is_some())
        });

        if delivered == 0 {
            debug!(
                "No member for {} on {} (join_ref {:?})",
                msg.event, msg.topic, msg.join_ref
            );
        }
    }

    /// Marks the socket closed and errors out every member and waiter
    async fn shutdown(&self) {
        let mut router = self.router.lock().await;
        router.closed = true;
        router.pending.clear();

        for member in router.members.drain(..) {
            let mut msg = Message::push(&member.topic, events::ERROR, json!({ "reason": "socket closed" }));
            msg.join_ref = Some(member.join_ref.clone());
            let _ = member.tx.send(msg);
        }
    }

    async fn forget(&self, topic: &str, join_ref: &str) {
        let mut router = self.router.lock().await;
        router.pending.remove(join_ref);
        router
            .members
            .retain(|m| !(m.topic == topic && m.join_ref == join_ref));
    }
}

/// Channel transport over a Phoenix websocket
pub struct PhoenixSocket {
    config: SocketConfig,
    shared: Arc<Shared>,
    outbound: mpsc::UnboundedSender<Outbound>,
    reader: Option<JoinHandle<()>>,
    writer: Option<JoinHandle<()>>,
    heartbeat: Option<JoinHandle<()>>,
}

impl PhoenixSocket {
    /// Connects to the socket endpoint
    ///
    /// # Arguments
    /// * `config` - Endpoint and timing settings
    ///
    /// # Example
    /// ```no_run
    /// # use buildlog_client::{PhoenixSocket, SocketConfig};
    /// # async fn example() -> buildlog_client::Result<()> {
    /// let socket = PhoenixSocket::connect(SocketConfig::new("ws://localhost:4000/socket")).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(config: SocketConfig) -> Result<Self> {
        config.validate()?;

        let url = config.websocket_url();
        info!("Connecting to {}", url);

        let (ws, _response) = tokio_tungstenite::connect_async(url.as_str()).await?;
        let (mut sink, mut stream) = ws.split();

        info!("Connected to {}", url);

        let shared = Arc::new(Shared {
            next_ref: AtomicU64::new(0),
            router: Mutex::new(Router::default()),
        });
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Outbound>();

        let writer = tokio::spawn(async move {
            while let Some(out) = outbound_rx.recv().await {
                match out {
                    Outbound::Frame(msg) => {
                        if let Err(e) = sink.send(WsMessage::Text(msg.encode())).await {
                            warn!("Failed to send frame: {}", e);
                            break;
                        }
                    }
                    Outbound::Close => break,
                }
            }

            if let Err(e) = sink.close().await {
                debug!("Error while closing websocket: {}", e);
            }
        });

        let reader_shared = Arc::clone(&shared);
        let reader = tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(WsMessage::Text(text)) => reader_shared.dispatch(&text).await,
                    Ok(WsMessage::Close(frame)) => {
                        info!("Server closed the socket: {:?}", frame);
                        break;
                    }
                    // Pings are answered by tungstenite itself
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Socket read failed: {}", e);
                        break;
                    }
                }
            }

            reader_shared.shutdown().await;
        });

        let heartbeat = Self::spawn_heartbeat(
            Arc::clone(&shared),
            outbound.clone(),
            config.heartbeat_interval,
        );

        Ok(Self {
            config,
            shared,
            outbound,
            reader: Some(reader),
            writer: Some(writer),
            heartbeat: Some(heartbeat),
        })
    }

    /// Closes the websocket
    ///
    /// Members still joined receive a `phx_error` and stop.
    pub async fn disconnect(mut self) {
        if let Some(heartbeat) = self.heartbeat.take() {
            heartbeat.abort();
        }

        let _ = self.outbound.send(Outbound::Close);

        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.await {
                warn!("Writer task panicked: {}", e);
            }
        }

        if let Some(reader) = self.reader.take() {
            reader.abort();
        }

        self.shared.shutdown().await;
    }

    /// Endpoint this socket is connected to
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Starts a background task to send heartbeats
    fn spawn_heartbeat(
        shared: Arc<Shared>,
        outbound: mpsc::UnboundedSender<Outbound>,
        interval: Duration,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;

                debug!("Sending heartbeat");

                let msg = Message::heartbeat(shared.make_ref());
                if outbound.send(Outbound::Frame(msg)).is_err() {
                    break;
                }
            }
        })
    }

    fn send(&self, msg: Message) -> Result<()> {
        self.outbound
            .send(Outbound::Frame(msg))
            .map_err(|_| ClientError::SocketClosed)
    }

    /// Waits for the reply registered under `msg_ref`
    async fn await_reply(
        &self,
        what: String,
        reply_rx: oneshot::Receiver<Message>,
    ) -> Result<Message> {
        match time::timeout(self.config.join_timeout, reply_rx).await {
            Ok(Ok(msg)) => Ok(msg),
            Ok(Err(_)) => Err(ClientError::SocketClosed),
            Err(_) => Err(ClientError::Timeout(what)),
        }
    }
}

/// A join request that went out but has not been settled by a reply
///
/// Dropping an armed guard drops the member and sends a leave without waiting
/// for its reply, so a server that accepts the join late does not keep the
/// channel open.
struct PendingJoin<'a> {
    shared: &'a Shared,
    outbound: &'a mpsc::UnboundedSender<Outbound>,
    topic: &'a str,
    join_ref: String,
    armed: bool,
}

impl PendingJoin<'_> {
    /// The server answered; nothing to undo
    fn settle(&mut self) {
        self.armed = false;
    }
}

impl Drop for PendingJoin<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        debug!("Abandoning join of {} (join_ref {})", self.topic, self.join_ref);

        let leave = Message::leave(self.topic, self.join_ref.clone(), self.shared.make_ref());
        let _ = self.outbound.send(Outbound::Frame(leave));

        // Members whose receiver is gone are also pruned on the next dispatch
        if let Ok(mut router) = self.shared.router.try_lock() {
            router.pending.remove(&self.join_ref);
            router
                .members
                .retain(|m| !(m.topic == self.topic && m.join_ref == self.join_ref));
        }
    }
}

#[async_trait]
impl ChannelTransport for PhoenixSocket {
    async fn join(&self, topic: &str, params: Value) -> Result<Joined> {
        let join_ref = self.shared.make_ref();
        let (tx, rx) = mpsc::unbounded_channel();
        let (reply_tx, reply_rx) = oneshot::channel();

        {
            let mut router = self.shared.router.lock().await;
            if router.closed {
                return Err(ClientError::SocketClosed);
            }

            router.pending.insert(join_ref.clone(), reply_tx);
            router.members.push(Member {
                topic: topic.to_string(),
                join_ref: join_ref.clone(),
                tx,
            });
        }

        debug!("Joining {} (join_ref {})", topic, join_ref);

        if let Err(e) = self.send(Message::join(topic, join_ref.clone(), params)) {
            self.shared.forget(topic, &join_ref).await;
            return Err(e);
        }

        let mut pending = PendingJoin {
            shared: &self.shared,
            outbound: &self.outbound,
            topic,
            join_ref: join_ref.clone(),
            armed: true,
        };

        let reply = self
            .await_reply(format!("join {}", topic), reply_rx)
            .await
            .and_then(|msg| msg.reply().map_err(ClientError::from));

        match reply {
            Ok(Some(reply)) if reply.is_ok() => {
                pending.settle();
                Ok(Joined::Ok {
                    response: reply.response,
                    channel: ChannelEvents::new(join_ref, rx),
                })
            }
            Ok(Some(reply)) => {
                pending.settle();
                self.shared.forget(topic, &join_ref).await;
                Ok(Joined::Error {
                    response: reply.response,
                })
            }
            // Only replies are routed to waiters
            Ok(None) => {
                self.shared.forget(topic, &join_ref).await;
                Err(ClientError::SocketClosed)
            }
            Err(e) => {
                if e.is_timeout() {
                    warn!("No reply to join of {}, leaving it", topic);
                }
                self.shared.forget(topic, &join_ref).await;
                Err(e)
            }
        }
    }

    async fn leave(&self, topic: &str, join_ref: &str) -> Result<()> {
        let msg_ref = self.shared.make_ref();
        let (reply_tx, reply_rx) = oneshot::channel();

        {
            let mut router = self.shared.router.lock().await;
            router
                .members
                .retain(|m| !(m.topic == topic && m.join_ref == join_ref));

            if router.closed {
                return Ok(());
            }

            router.pending.insert(msg_ref.clone(), reply_tx);
        }

        debug!("Leaving {} (join_ref {})", topic, join_ref);

        self.send(Message::leave(topic, join_ref, msg_ref.clone()))?;

        let result = self.await_reply(format!("leave {}", topic), reply_rx).await;
        if result.is_err() {
            self.shared.router.lock().await.pending.remove(&msg_ref);
        }

        result.map(|_| ())
    }
}

impl Drop for PhoenixSocket {
    fn drop(&mut self) {
        for handle in [
            self.heartbeat.take(),
            self.writer.take(),
            self.reader.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }
    }
}
