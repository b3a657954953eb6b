//! Rendered log rows

use chrono::{DateTime, Utc};
use std::fmt;

use crate::domain::event::LogEvent;

/// One rendered line of the log view
///
/// Wraps the received event together with the local time it arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRow {
    pub event: LogEvent,
    pub received_at: DateTime<Utc>,
}

impl LogRow {
    /// Creates a row for an event received now
    pub fn now(event: LogEvent) -> Self {
        Self {
            event,
            received_at: Utc::now(),
        }
    }

    /// Summary text of the row: `role: action — step`
    pub fn text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for LogRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} — {}",
            self.event.role(),
            self.event.action(),
            self.event.step()
        )
    }
}

/// Replaces every control character with U+FFFD
///
/// Use this for any output that a terminal interprets, so payloads cannot
/// smuggle escape sequences.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { '\u{FFFD}' } else { c })
        .collect()
}
