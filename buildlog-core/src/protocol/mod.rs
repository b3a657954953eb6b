//! Channel protocol
//!
//! Topic naming and the wire format of channel messages. The transport that
//! carries these messages lives in `buildlog-client`.

pub mod message;
pub mod topic;

pub use message::{Message, MessageError, Reply, ReplyStatus, events};
pub use topic::{DEFAULT_LOBBY_TOPIC, DEFAULT_TOPIC_PREFIX, build_topic};
