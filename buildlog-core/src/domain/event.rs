//! Log event domain types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A structured log event pushed by the build server
///
/// Events are immutable once received: the fields are only readable, and
/// the client never re-emits them.
///
/// Decoding never fails. Any JSON value can become a `LogEvent`; fields that
/// are missing or `null` come out empty, and non-string values are rendered
/// as text (the server may send the string form of a richer structure in
/// `step`, or the structure itself).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct LogEvent {
    role: String,
    action: String,
    step: String,
}

impl LogEvent {
    /// Creates an event from its three fields
    pub fn new(
        role: impl Into<String>,
        action: impl Into<String>,
        step: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            action: action.into(),
            step: step.into(),
        }
    }

    /// Builds an event from an arbitrary channel payload
    ///
    /// A payload that is not a JSON object yields an event with all fields empty.
    pub fn from_payload(payload: &Value) -> Self {
        match payload {
            Value::Object(fields) => Self {
                role: field_text(fields.get("role")),
                action: field_text(fields.get("action")),
                step: field_text(fields.get("step")),
            },
            _ => Self::new("", "", ""),
        }
    }

    /// The actor that produced the event (e.g. `observer`, `runner`)
    pub fn role(&self) -> &str {
        &self.role
    }

    /// The verb performed (e.g. `execute`)
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Description of the work item
    pub fn step(&self) -> &str {
        &self.step
    }
}

impl From<Value> for LogEvent {
    fn from(payload: Value) -> Self {
        Self::from_payload(&payload)
    }
}

/// Converts a payload field to display text
fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        // Arrays and objects keep their compact JSON form
        Some(other) => other.to_string(),
    }
}
