//! Channel wire messages
//!
//! Messages use the Phoenix JSON serializer, version 2: every frame is a JSON
//! array `[join_ref, ref, topic, event, payload]` where both refs may be `null`.

use serde_json::Value;
use thiserror::Error;

/// Reserved event names of the channel protocol
pub mod events {
    pub const JOIN: &str = "phx_join";
    pub const LEAVE: &str = "phx_leave";
    pub const REPLY: &str = "phx_reply";
    pub const CLOSE: &str = "phx_close";
    pub const ERROR: &str = "phx_error";
    pub const HEARTBEAT: &str = "heartbeat";

    /// Topic used for socket-level heartbeats
    pub const HEARTBEAT_TOPIC: &str = "phoenix";
}

/// Errors raised while decoding a frame
#[derive(Debug, Error)]
pub enum MessageError {
    /// Frame is not a valid `[join_ref, ref, topic, event, payload]` array
    #[error("Malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A `phx_reply` whose payload lacks a status
    #[error("Reply without status on topic {0}")]
    MissingStatus(String),
}

type Frame = (Option<String>, Option<String>, String, String, Value);

/// A single channel message
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Ref of the join this message belongs to
    pub join_ref: Option<String>,
    /// Ref used to correlate a request with its reply
    pub msg_ref: Option<String>,
    pub topic: String,
    pub event: String,
    pub payload: Value,
}

impl Message {
    /// Join request; the join ref doubles as the message ref
    pub fn join(topic: impl Into<String>, join_ref: impl Into<String>, params: Value) -> Self {
        let join_ref = join_ref.into();
        Self {
            join_ref: Some(join_ref.clone()),
            msg_ref: Some(join_ref),
            topic: topic.into(),
            event: events::JOIN.to_string(),
            payload: params,
        }
    }

    /// Leave request for a previously joined channel
    pub fn leave(
        topic: impl Into<String>,
        join_ref: impl Into<String>,
        msg_ref: impl Into<String>,
    ) -> Self {
        Self {
            join_ref: Some(join_ref.into()),
            msg_ref: Some(msg_ref.into()),
            topic: topic.into(),
            event: events::LEAVE.to_string(),
            payload: Value::Object(Default::default()),
        }
    }

    /// Socket heartbeat
    pub fn heartbeat(msg_ref: impl Into<String>) -> Self {
        Self {
            join_ref: None,
            msg_ref: Some(msg_ref.into()),
            topic: events::HEARTBEAT_TOPIC.to_string(),
            event: events::HEARTBEAT.to_string(),
            payload: Value::Object(Default::default()),
        }
    }

    /// Server push (no refs), as broadcasts arrive
    pub fn push(topic: impl Into<String>, event: impl Into<String>, payload: Value) -> Self {
        Self {
            join_ref: None,
            msg_ref: None,
            topic: topic.into(),
            event: event.into(),
            payload,
        }
    }

    /// Encodes the message as a v2 frame
    pub fn encode(&self) -> String {
        let frame: (
            &Option<String>,
            &Option<String>,
            &str,
            &str,
            &Value,
        ) = (
            &self.join_ref,
            &self.msg_ref,
            &self.topic,
            &self.event,
            &self.payload,
        );
        // A tuple of strings and a Value always serializes
        serde_json::to_string(&frame).unwrap_or_default()
    }

    /// Decodes a v2 frame
    pub fn decode(text: &str) -> Result<Self, MessageError> {
        let (join_ref, msg_ref, topic, event, payload): Frame = serde_json::from_str(text)?;
        Ok(Self {
            join_ref,
            msg_ref,
            topic,
            event,
            payload,
        })
    }

    /// Whether this is a reply to a request
    pub fn is_reply(&self) -> bool {
        self.event == events::REPLY
    }

    /// Parses the payload of a `phx_reply`
    ///
    /// Returns `Ok(None)` for any other event.
    pub fn reply(&self) -> Result<Option<Reply>, MessageError> {
        if !self.is_reply() {
            return Ok(None);
        }

        let status = self
            .payload
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| MessageError::MissingStatus(self.topic.clone()))?;

        let response = self.payload.get("response").cloned().unwrap_or(Value::Null);

        Ok(Some(Reply {
            status: ReplyStatus::from(status),
            response,
        }))
    }
}

/// Status of a `phx_reply`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyStatus {
    Ok,
    Error,
    /// Any status other than `ok` or `error`
    Other(String),
}

impl From<&str> for ReplyStatus {
    fn from(status: &str) -> Self {
        match status {
            "ok" => ReplyStatus::Ok,
            "error" => ReplyStatus::Error,
            other => ReplyStatus::Other(other.to_string()),
        }
    }
}

/// Decoded `phx_reply` payload
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: ReplyStatus,
    pub response: Value,
}

impl Reply {
    pub fn is_ok(&self) -> bool {
        self.status == ReplyStatus::Ok
    }
}
