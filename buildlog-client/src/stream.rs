//! Log stream subscriptions
//!
//! [`LogStreamClient`] joins the channel of one build (or the lobby), waits
//! for the join to settle, then renders every log event into a surface until
//! the subscription is left or the server closes the channel.
//!
//! Each subscription runs in its own task. That task is the only writer of
//! its surface, so rows land in the order the server sent them.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use buildlog_core::domain::event::LogEvent;
use buildlog_core::domain::row::LogRow;
use buildlog_core::protocol::{build_topic, events};
use serde_json::{Value, json};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::StreamConfig;
use crate::transport::{ChannelEvents, ChannelTransport, Joined};
use crate::view::{LogSurface, StreamStatus};

/// Attribute on the host element that names the build
pub const BUILD_ID_ATTRIBUTE: &str = "build-id";

/// Something that carries named attributes, like a host element
pub trait AttributeSource {
    fn attribute(&self, name: &str) -> Option<String>;
}

impl AttributeSource for HashMap<String, String> {
    fn attribute(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl AttributeSource for BTreeMap<String, String> {
    fn attribute(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Which stream to follow
pub enum BuildSelector<'a> {
    /// An explicit build id
    Id(String),
    /// The build named by a host element's `build-id` attribute, if there is an element
    Element(Option<&'a dyn AttributeSource>),
    /// The shared lobby topic
    Lobby,
}

impl BuildSelector<'_> {
    /// Topic to join, or `None` when no build can be identified
    pub fn resolve_topic(&self, config: &StreamConfig) -> Option<String> {
        let build_id = match self {
            BuildSelector::Id(id) => id.clone(),
            BuildSelector::Element(Some(element)) => element.attribute(BUILD_ID_ATTRIBUTE)?,
            BuildSelector::Element(None) => return None,
            BuildSelector::Lobby => return Some(config.lobby_topic.clone()),
        };

        let build_id = build_id.trim();
        if build_id.is_empty() {
            return None;
        }

        Some(build_topic(&config.topic_prefix, build_id))
    }
}

/// Final result of joining a stream
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    /// Joined; carries the server's response
    Ok(Value),
    /// Not joined; carries the server's response or a `{"reason": ...}` payload
    Error(Value),
}

impl JoinOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, JoinOutcome::Ok(_))
    }

    /// The response payload of either outcome
    pub fn payload(&self) -> &Value {
        match self {
            JoinOutcome::Ok(payload) | JoinOutcome::Error(payload) => payload,
        }
    }
}

/// Renders one event: appends its row, then scrolls to the end
pub fn render_event<S: LogSurface + ?Sized>(surface: &mut S, event: LogEvent) {
    surface.append(LogRow::now(event));
    surface.scroll_to_end();
}

/// Client that subscribes surfaces to build log streams
#[derive(Clone)]
pub struct LogStreamClient {
    transport: Arc<dyn ChannelTransport>,
    config: StreamConfig,
}

impl LogStreamClient {
    /// Creates a client over a connected transport
    ///
    /// # Arguments
    /// * `transport` - The channel transport to join through
    /// * `config` - Topic naming, rendered event, retention and retry settings
    pub fn new(transport: Arc<dyn ChannelTransport>, config: StreamConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Subscribes `surface` to the stream picked by `selector`
    ///
    /// Returns immediately; the join and the rendering happen on a spawned
    /// task, so this must be called from within a tokio runtime.
    ///
    /// When the selector names no build, nothing happens at all: no join,
    /// no write to the surface, and `None` is returned.
    ///
    /// Every call opens its own subscription, even for a topic that is
    /// already followed.
    ///
    /// # Example
    /// ```no_run
    /// # use std::sync::Arc;
    /// # use buildlog_client::{BuildSelector, LogStreamClient, LogView, MemoryTransport, StreamConfig};
    /// # async fn example() {
    /// let client = LogStreamClient::new(Arc::new(MemoryTransport::new()), StreamConfig::default());
    /// let view = LogView::new(500);
    /// if let Some(mut subscription) = client.init(BuildSelector::Id("42".into()), view.clone()) {
    ///     println!("{:?}", subscription.join_outcome().await);
    /// }
    /// # }
    /// ```
    pub fn init<S: LogSurface>(
        &self,
        selector: BuildSelector<'_>,
        surface: S,
    ) -> Option<Subscription> {
        let topic = selector.resolve_topic(&self.config)?;

        let id = Uuid::new_v4();
        let (outcome_tx, outcome_rx) = watch::channel(None);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        debug!("Starting subscription {} on {}", id, topic);

        let task = tokio::spawn(run_subscription(
            Arc::clone(&self.transport),
            self.config.clone(),
            topic.clone(),
            surface,
            outcome_tx,
            shutdown_rx,
        ));

        Some(Subscription {
            id,
            topic,
            outcome: outcome_rx,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }
}

/// A live subscription of one surface to one topic
///
/// Dropping the subscription tears it down: the task stops rendering and
/// leaves the channel on its own.
pub struct Subscription {
    id: Uuid,
    topic: String,
    outcome: watch::Receiver<Option<JoinOutcome>>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Topic this subscription joined
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Waits for the join to settle
    pub async fn join_outcome(&mut self) -> JoinOutcome {
        match self.outcome.wait_for(Option::is_some).await {
            Ok(outcome) => outcome
                .clone()
                .unwrap_or_else(|| JoinOutcome::Error(json!({ "reason": "no outcome" }))),
            Err(_) => JoinOutcome::Error(json!({ "reason": "subscription task ended" })),
        }
    }

    /// The join outcome, if it has settled
    pub fn try_join_outcome(&self) -> Option<JoinOutcome> {
        self.outcome.borrow().clone()
    }

    /// Whether the subscription task is still running
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Waits until the subscription ends on its own
    ///
    /// That happens when the join fails, the server closes the channel, or
    /// the socket goes away.
    pub async fn closed(&mut self) {
        let Some(task) = self.task.as_mut() else {
            return;
        };

        let result = task.await;
        self.task = None;

        if let Err(e) = result {
            warn!("Subscription task for {} panicked: {}", self.topic, e);
        }
    }

    /// Leaves the channel and waits for the subscription task to finish
    ///
    /// A join still in flight is abandoned and settles as
    /// `Error({"reason": "cancelled"})`.
    ///
    /// # Returns
    /// How the join settled, if it did
    pub async fn leave(mut self) -> Option<JoinOutcome> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Subscription task for {} panicked: {}", self.topic, e);
            }
        }

        self.try_join_outcome()
    }
}

/// Body of a subscription task
async fn run_subscription<S: LogSurface>(
    transport: Arc<dyn ChannelTransport>,
    config: StreamConfig,
    topic: String,
    mut surface: S,
    outcome: watch::Sender<Option<JoinOutcome>>,
    mut shutdown: oneshot::Receiver<()>,
) {
    surface.set_status(StreamStatus::Joining);

    let joined = tokio::select! {
        biased;
        _ = &mut shutdown => {
            debug!("Subscription to {} cancelled while joining", topic);
            surface.set_status(StreamStatus::Closed);
            outcome.send_replace(Some(JoinOutcome::Error(json!({ "reason": "cancelled" }))));
            return;
        }
        joined = join_with_retry(transport.as_ref(), &topic, &config) => joined,
    };

    let mut channel = match joined {
        Ok((response, channel)) => {
            info!("Joined {} successfully: {}", topic, response);
            surface.set_status(StreamStatus::Joined);
            outcome.send_replace(Some(JoinOutcome::Ok(response)));
            channel
        }
        Err(response) => {
            warn!("Unable to join {}: {}", topic, response);
            surface.set_status(StreamStatus::Failed);
            outcome.send_replace(Some(JoinOutcome::Error(response)));
            return;
        }
    };

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                debug!("Leaving {}", topic);
                if let Err(e) = transport.leave(&topic, channel.join_ref()).await {
                    warn!("Failed to leave {}: {}", topic, e);
                }
                break;
            }
            msg = channel.recv() => match msg {
                Some(msg) if msg.event == config.event => {
                    render_event(&mut surface, LogEvent::from_payload(&msg.payload));
                }
                Some(msg) if msg.event == events::CLOSE => {
                    info!("Channel {} closed by server", topic);
                    break;
                }
                Some(msg) if msg.event == events::ERROR => {
                    warn!("Channel {} errored: {}", topic, msg.payload);
                    break;
                }
                Some(msg) => {
                    debug!("Ignoring {} on {}", msg.event, topic);
                }
                None => {
                    debug!("Transport dropped channel {}", topic);
                    break;
                }
            },
        }
    }

    surface.set_status(StreamStatus::Closed);
}

/// Joins `topic`, retrying failed attempts per the configured policy
///
/// # Returns
/// The join response with the channel's events, or the payload of the last failure
async fn join_with_retry(
    transport: &dyn ChannelTransport,
    topic: &str,
    config: &StreamConfig,
) -> Result<(Value, ChannelEvents), Value> {
    let max_attempts = config.retry.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        let failure = match transport.join(topic, config.join_params.clone()).await {
            Ok(Joined::Ok { response, channel }) => {
                if attempt > 1 {
                    info!("Joined {} after {} attempt(s)", topic, attempt);
                }
                return Ok((response, channel));
            }
            Ok(Joined::Error { response }) => response,
            // No point retrying on a transport that is gone
            Err(e) if e.is_closed() => return Err(json!({ "reason": e.to_string() })),
            Err(e) => json!({ "reason": e.to_string() }),
        };

        if attempt >= max_attempts {
            return Err(failure);
        }

        let delay = config.retry.delay_after(attempt);
        warn!(
            "Failed to join {} (attempt {}/{}): {}; retrying in {:?}",
            topic, attempt, max_attempts, failure, delay
        );

        time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryPolicy;
    use crate::error::{ClientError, Result};
    use crate::transport::{JoinBehavior, MemoryTransport};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use crate::view::LogView;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Append(String),
        Scroll,
        Status(StreamStatus),
    }

    // Surface that records every call it receives
    #[derive(Clone, Default)]
    struct RecordingSurface {
        ops: Arc<Mutex<Vec<Op>>>,
    }

    impl RecordingSurface {
        fn ops(&self) -> Vec<Op> {
            self.ops.lock().unwrap().clone()
        }
    }

    impl LogSurface for RecordingSurface {
        fn append(&mut self, row: LogRow) {
            self.ops.lock().unwrap().push(Op::Append(row.text()));
        }

        fn scroll_to_end(&mut self) {
            self.ops.lock().unwrap().push(Op::Scroll);
        }

        fn set_status(&mut self, status: StreamStatus) {
            self.ops.lock().unwrap().push(Op::Status(status));
        }
    }

    fn client(transport: &Arc<MemoryTransport>) -> LogStreamClient {
        LogStreamClient::new(transport.clone(), StreamConfig::default())
    }

    async fn wait_until(mut done: impl FnMut() -> bool) {
        time::timeout(Duration::from_secs(2), async {
            while !done() {
                time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    fn event(role: &str, action: &str, step: &str) -> Value {
        json!({ "role": role, "action": action, "step": step })
    }

    #[test]
    fn test_resolve_topic() {
        let config = StreamConfig::default();

        let mut element = HashMap::new();
        element.insert("build-id".to_string(), "17".to_string());

        assert_eq!(
            BuildSelector::Id("42".into()).resolve_topic(&config),
            Some("build:42".to_string())
        );
        assert_eq!(
            BuildSelector::Element(Some(&element)).resolve_topic(&config),
            Some("build:17".to_string())
        );
        assert_eq!(
            BuildSelector::Lobby.resolve_topic(&config),
            Some("build:lobby".to_string())
        );
        assert_eq!(BuildSelector::Element(None).resolve_topic(&config), None);
        assert_eq!(BuildSelector::Id("  ".into()).resolve_topic(&config), None);
    }

    #[tokio::test]
    async fn test_no_identifier_is_a_no_op() {
        let transport = Arc::new(MemoryTransport::new());
        let client = client(&transport);
        let surface = RecordingSurface::default();
        let no_attribute: HashMap<String, String> = HashMap::new();

        assert!(client.init(BuildSelector::Element(None), surface.clone()).is_none());
        assert!(
            client
                .init(BuildSelector::Element(Some(&no_attribute)), surface.clone())
                .is_none()
        );
        assert!(client.init(BuildSelector::Id(String::new()), surface.clone()).is_none());

        tokio::task::yield_now().await;
        assert!(transport.joins().is_empty());
        assert!(surface.ops().is_empty());
    }

    #[tokio::test]
    async fn test_joins_build_topic_once() {
        let transport = Arc::new(MemoryTransport::new());
        let client = client(&transport);

        let mut sub = client
            .init(BuildSelector::Id("42".into()), LogView::new(10))
            .unwrap();

        assert_eq!(sub.topic(), "build:42");
        assert!(sub.join_outcome().await.is_ok());
        assert_eq!(
            transport.joins(),
            vec![("build:42".to_string(), json!({ "module": "Build" }))]
        );
    }

    #[tokio::test]
    async fn test_renders_events_in_order() {
        let transport = Arc::new(MemoryTransport::new());
        let client = client(&transport);
        let view = LogView::new(10);

        let mut sub = client
            .init(BuildSelector::Id("42".into()), view.clone())
            .unwrap();
        sub.join_outcome().await;

        transport.push("build:42", "build_event", event("observer", "execute", "A"));
        transport.push("build:42", "build_event", event("runner", "execute", "B"));
        transport.push("build:42", "build_event", event("runner", "finish", "B"));

        wait_until(|| view.len() == 3).await;

        assert_eq!(
            view.lines(),
            vec![
                "observer: execute — A",
                "runner: execute — B",
                "runner: finish — B"
            ]
        );
        assert_eq!(view.scroll_top(), view.scroll_height());
        assert_eq!(view.status(), Some(StreamStatus::Joined));
    }

    #[tokio::test]
    async fn test_scrolls_after_every_append() {
        let transport = Arc::new(MemoryTransport::new());
        let client = client(&transport);
        let surface = RecordingSurface::default();

        let mut sub = client
            .init(BuildSelector::Id("42".into()), surface.clone())
            .unwrap();
        sub.join_outcome().await;

        transport.push("build:42", "build_event", event("runner", "execute", "A"));
        transport.push("build:42", "build_event", event("runner", "execute", "B"));

        wait_until(|| surface.ops().len() == 6).await;

        assert_eq!(
            surface.ops(),
            vec![
                Op::Status(StreamStatus::Joining),
                Op::Status(StreamStatus::Joined),
                Op::Append("runner: execute — A".to_string()),
                Op::Scroll,
                Op::Append("runner: execute — B".to_string()),
                Op::Scroll,
            ]
        );
    }

    #[tokio::test]
    async fn test_partial_payload_renders_empty_fields() {
        let transport = Arc::new(MemoryTransport::new());
        let client = client(&transport);
        let view = LogView::new(10);

        let mut sub = client
            .init(BuildSelector::Id("42".into()), view.clone())
            .unwrap();
        sub.join_outcome().await;

        transport.push("build:42", "build_event", json!({ "role": "runner", "action": "finish" }));
        transport.push("build:42", "build_event", json!(null));

        wait_until(|| view.len() == 2).await;
        assert_eq!(view.lines(), vec!["runner: finish — ", ":  — "]);
    }

    #[tokio::test]
    async fn test_ignores_other_events() {
        let transport = Arc::new(MemoryTransport::new());
        let client = client(&transport);
        let view = LogView::new(10);

        let mut sub = client
            .init(BuildSelector::Id("42".into()), view.clone())
            .unwrap();
        sub.join_outcome().await;

        transport.push("build:42", "presence_diff", json!({}));
        transport.push("build:42", "build_event", event("runner", "execute", "A"));

        wait_until(|| view.len() == 1).await;
        assert_eq!(view.lines(), vec!["runner: execute — A"]);
    }

    #[tokio::test]
    async fn test_join_error_is_reported_once() {
        let transport = Arc::new(MemoryTransport::with_behavior(JoinBehavior::Reject(
            json!({ "reason": "unknown build" }),
        )));
        let client = client(&transport);
        let view = LogView::new(10);

        let mut sub = client
            .init(BuildSelector::Id("42".into()), view.clone())
            .unwrap();

        assert_eq!(
            sub.join_outcome().await,
            JoinOutcome::Error(json!({ "reason": "unknown build" }))
        );
        assert_eq!(view.status(), Some(StreamStatus::Failed));
        assert_eq!(transport.joins().len(), 1);
        assert_eq!(transport.push("build:42", "build_event", json!({})), 0);
        assert!(view.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_becomes_error_outcome() {
        let transport = Arc::new(MemoryTransport::with_behavior(JoinBehavior::Timeout));
        let client = client(&transport);

        let mut sub = client
            .init(BuildSelector::Lobby, LogView::new(10))
            .unwrap();

        let outcome = sub.join_outcome().await;
        assert!(!outcome.is_ok());
        assert!(outcome.payload()["reason"].as_str().unwrap().contains("Timed out"));
    }

    #[tokio::test]
    async fn test_two_inits_are_independent() {
        let transport = Arc::new(MemoryTransport::new());
        let client = client(&transport);
        let first = LogView::new(10);
        let second = LogView::new(10);

        let mut a = client
            .init(BuildSelector::Id("42".into()), first.clone())
            .unwrap();
        let mut b = client
            .init(BuildSelector::Id("42".into()), second.clone())
            .unwrap();

        assert!(a.join_outcome().await.is_ok());
        assert!(b.join_outcome().await.is_ok());
        assert_ne!(a.id(), b.id());
        assert_eq!(transport.joins().len(), 2);
        assert_eq!(transport.member_count("build:42"), 2);

        transport.push("build:42", "build_event", event("runner", "execute", "A"));
        wait_until(|| first.len() == 1 && second.len() == 1).await;
    }

    #[tokio::test]
    async fn test_retention_cap_keeps_latest_rows() {
        let transport = Arc::new(MemoryTransport::new());
        let client = LogStreamClient::new(transport.clone(), StreamConfig::default().with_max_rows(2));
        let view = LogView::new(client.config().max_rows);

        let mut sub = client
            .init(BuildSelector::Id("42".into()), view.clone())
            .unwrap();
        sub.join_outcome().await;

        for step in ["A", "B", "C"] {
            transport.push("build:42", "build_event", event("runner", "execute", step));
        }

        wait_until(|| view.evicted() == 1).await;
        assert_eq!(view.lines(), vec!["runner: execute — B", "runner: execute — C"]);
        assert_eq!(view.scroll_top(), 2);
    }

    #[tokio::test]
    async fn test_leave_sends_leave_and_stops_rendering() {
        let transport = Arc::new(MemoryTransport::new());
        let client = client(&transport);
        let view = LogView::new(10);

        let mut sub = client
            .init(BuildSelector::Id("42".into()), view.clone())
            .unwrap();
        sub.join_outcome().await;

        sub.leave().await;

        assert_eq!(
            transport.leaves(),
            vec![("build:42".to_string(), "1".to_string())]
        );
        assert_eq!(transport.push("build:42", "build_event", json!({})), 0);
        assert_eq!(view.status(), Some(StreamStatus::Closed));
        assert!(view.is_empty());
    }

    #[tokio::test]
    async fn test_drop_leaves_channel() {
        let transport = Arc::new(MemoryTransport::new());
        let client = client(&transport);

        let mut sub = client
            .init(BuildSelector::Id("42".into()), LogView::new(10))
            .unwrap();
        sub.join_outcome().await;
        drop(sub);

        wait_until(|| transport.leaves().len() == 1).await;
        assert_eq!(transport.member_count("build:42"), 0);
    }

    #[tokio::test]
    async fn test_server_close_ends_subscription() {
        let transport = Arc::new(MemoryTransport::new());
        let client = client(&transport);
        let view = LogView::new(10);

        let mut sub = client
            .init(BuildSelector::Id("42".into()), view.clone())
            .unwrap();
        sub.join_outcome().await;

        transport.close("build:42");

        wait_until(|| !sub.is_active()).await;
        assert_eq!(view.status(), Some(StreamStatus::Closed));
        assert!(transport.leaves().is_empty());
    }

    #[tokio::test]
    async fn test_retry_until_joined() {
        let transport = Arc::new(MemoryTransport::new());
        transport.script([
            JoinBehavior::Timeout,
            JoinBehavior::Reject(json!({ "reason": "busy" })),
        ]);

        let retry = RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        };
        let client = LogStreamClient::new(transport.clone(), StreamConfig::default().with_retry(retry));

        let mut sub = client
            .init(BuildSelector::Id("42".into()), LogView::new(10))
            .unwrap();

        assert!(sub.join_outcome().await.is_ok());
        assert_eq!(transport.joins().len(), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_with_last_failure() {
        let transport = Arc::new(MemoryTransport::with_behavior(JoinBehavior::Reject(
            json!({ "reason": "busy" }),
        )));

        let retry = RetryPolicy {
            max_attempts: 2,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        };
        let client = LogStreamClient::new(transport.clone(), StreamConfig::default().with_retry(retry));

        let mut sub = client
            .init(BuildSelector::Id("42".into()), LogView::new(10))
            .unwrap();

        assert_eq!(
            sub.join_outcome().await,
            JoinOutcome::Error(json!({ "reason": "busy" }))
        );
        assert_eq!(transport.joins().len(), 2);
        assert_eq!(sub.try_join_outcome(), Some(JoinOutcome::Error(json!({ "reason": "busy" }))));
    }

    #[tokio::test]
    async fn test_leave_while_joining_reports_cancelled() {
        let transport = Arc::new(MemoryTransport::with_behavior(JoinBehavior::Pending));
        let client = client(&transport);
        let surface = RecordingSurface::default();

        let sub = client
            .init(BuildSelector::Id("42".into()), surface.clone())
            .unwrap();

        wait_until(|| transport.joins().len() == 1).await;
        assert_eq!(sub.try_join_outcome(), None);

        assert_eq!(
            sub.leave().await,
            Some(JoinOutcome::Error(json!({ "reason": "cancelled" })))
        );
        assert_eq!(
            surface.ops(),
            vec![
                Op::Status(StreamStatus::Joining),
                Op::Status(StreamStatus::Closed)
            ]
        );
        assert!(transport.leaves().is_empty());
    }

    // Transport whose socket is already gone
    #[derive(Default)]
    struct ClosedTransport {
        joins: AtomicUsize,
    }

    #[async_trait]
    impl ChannelTransport for ClosedTransport {
        async fn join(&self, _topic: &str, _params: Value) -> Result<Joined> {
            self.joins.fetch_add(1, Ordering::SeqCst);
            Err(ClientError::SocketClosed)
        }

        async fn leave(&self, _topic: &str, _join_ref: &str) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_closed_socket_is_not_retried() {
        let transport = Arc::new(ClosedTransport::default());
        let client = LogStreamClient::new(
            transport.clone(),
            StreamConfig::default().with_retry(RetryPolicy::with_attempts(3)),
        );

        let mut sub = client
            .init(BuildSelector::Id("42".into()), LogView::new(10))
            .unwrap();

        assert_eq!(
            sub.join_outcome().await,
            JoinOutcome::Error(json!({ "reason": "Socket closed" }))
        );
        assert_eq!(transport.joins.load(Ordering::SeqCst), 1);
    }
}
