//! Buildlog Client
//!
//! Follows a build's log stream over a realtime channel and renders it into a
//! bounded log view.
//!
//! The pieces:
//! - Transport: joins channels over a Phoenix websocket ([`PhoenixSocket`]) or in memory
//! - Stream: [`LogStreamClient`] subscribes a surface to one build (or the lobby)
//! - View: [`LogView`], a bounded surface that keeps the newest rows in sight
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use buildlog_client::{BuildSelector, LogStreamClient, LogView, PhoenixSocket, SocketConfig, StreamConfig};
//!
//! #[tokio::main]
//! async fn main() -> buildlog_client::Result<()> {
//!     let socket = PhoenixSocket::connect(SocketConfig::new("ws://localhost:4000/socket")).await?;
//!     let client = LogStreamClient::new(Arc::new(socket), StreamConfig::default());
//!
//!     let view = LogView::new(1000);
//!     if let Some(mut subscription) = client.init(BuildSelector::Id("42".into()), view.clone()) {
//!         println!("Join: {:?}", subscription.join_outcome().await);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod stream;
pub mod transport;
pub mod view;

// Re-export commonly used types
pub use buildlog_core::domain::event::LogEvent;
pub use buildlog_core::domain::row::LogRow;
pub use config::{RetryPolicy, SocketConfig, StreamConfig};
pub use error::{ClientError, Result};
pub use stream::{
    AttributeSource, BUILD_ID_ATTRIBUTE, BuildSelector, JoinOutcome, LogStreamClient, Subscription,
    render_event,
};
pub use transport::{ChannelEvents, ChannelTransport, JoinBehavior, Joined, MemoryTransport, PhoenixSocket};
pub use view::{LogSurface, LogView, StreamStatus};
