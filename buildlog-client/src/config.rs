//! Client configuration
//!
//! Settings for the socket connection and for log stream subscriptions.
//! All timeouts and limits are configurable; the defaults match what the
//! build server's own browser client uses.

use std::time::Duration;

use buildlog_core::protocol::{DEFAULT_LOBBY_TOPIC, DEFAULT_TOPIC_PREFIX};
use serde_json::{Value, json};

use crate::error::{ClientError, Result};

/// Serializer version requested from the server
pub const PROTOCOL_VSN: &str = "2.0.0";

/// Socket connection settings
#[derive(Debug, Clone)]
pub struct SocketConfig {
    /// Socket endpoint (e.g., "ws://localhost:4000/socket")
    pub endpoint: String,

    /// How often to send a heartbeat to keep the connection alive
    pub heartbeat_interval: Duration,

    /// How long to wait for the reply to a join or leave
    pub join_timeout: Duration,
}

impl SocketConfig {
    /// Creates a socket configuration with default timings
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            heartbeat_interval: Duration::from_secs(30),
            join_timeout: Duration::from_secs(10),
        }
    }

    /// Full websocket URL: endpoint + `/websocket` + serializer version
    pub fn websocket_url(&self) -> String {
        let endpoint = self.endpoint.trim_end_matches('/');
        let path = if endpoint.ends_with("/websocket") {
            endpoint.to_string()
        } else {
            format!("{}/websocket", endpoint)
        };

        format!("{}?vsn={}", path, PROTOCOL_VSN)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.is_empty() {
            return Err(ClientError::InvalidConfig(
                "endpoint cannot be empty".to_string(),
            ));
        }

        if !self.endpoint.starts_with("ws://") && !self.endpoint.starts_with("wss://") {
            return Err(ClientError::InvalidConfig(
                "endpoint must start with ws:// or wss://".to_string(),
            ));
        }

        if self.endpoint.contains('?') {
            return Err(ClientError::InvalidConfig(
                "endpoint must not carry a query string".to_string(),
            ));
        }

        if self.heartbeat_interval.is_zero() {
            return Err(ClientError::InvalidConfig(
                "heartbeat_interval must be greater than 0".to_string(),
            ));
        }

        if self.join_timeout.is_zero() {
            return Err(ClientError::InvalidConfig(
                "join_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self::new("ws://localhost:4000/socket")
    }
}

/// Join retry policy with exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total join attempts, including the first one
    pub max_attempts: u32,

    /// Delay before the second attempt
    pub initial_delay: Duration,

    /// Upper bound for the delay between attempts
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// A single attempt, no retry
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }

    /// Retries up to `max_attempts` attempts in total
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::none()
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Log stream subscription settings
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Prefix of per-build topics
    pub topic_prefix: String,

    /// Topic joined for the aggregate (lobby) view
    pub lobby_topic: String,

    /// The one event rendered into the log view
    pub event: String,

    /// Join metadata sent with every join
    pub join_params: Value,

    /// Maximum number of rows kept by the log view
    pub max_rows: usize,

    /// What to do when a join fails
    pub retry: RetryPolicy,
}

impl StreamConfig {
    /// Sets the module name sent as join metadata
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.join_params = json!({ "module": module.into() });
        self
    }

    /// Sets the row retention cap
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Sets the join retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.topic_prefix.is_empty() {
            return Err(ClientError::InvalidConfig(
                "topic_prefix cannot be empty".to_string(),
            ));
        }

        if self.lobby_topic.is_empty() {
            return Err(ClientError::InvalidConfig(
                "lobby_topic cannot be empty".to_string(),
            ));
        }

        if self.event.is_empty() {
            return Err(ClientError::InvalidConfig(
                "event cannot be empty".to_string(),
            ));
        }

        if !self.join_params.is_object() {
            return Err(ClientError::InvalidConfig(
                "join_params must be a JSON object".to_string(),
            ));
        }

        if self.max_rows == 0 {
            return Err(ClientError::InvalidConfig(
                "max_rows must be greater than 0".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ClientError::InvalidConfig(
                "retry.max_attempts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            topic_prefix: DEFAULT_TOPIC_PREFIX.to_string(),
            lobby_topic: DEFAULT_LOBBY_TOPIC.to_string(),
            event: "build_event".to_string(),
            join_params: json!({ "module": "Build" }),
            max_rows: 1000,
            retry: RetryPolicy::none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stream_config() {
        let config = StreamConfig::default();
        assert_eq!(config.topic_prefix, "build");
        assert_eq!(config.lobby_topic, "build:lobby");
        assert_eq!(config.event, "build_event");
        assert_eq!(config.join_params, json!({ "module": "Build" }));
        assert_eq!(config.retry.max_attempts, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_stream_config_validation() {
        let mut config = StreamConfig::default();

        config.max_rows = 0;
        assert!(config.validate().is_err());
        config.max_rows = 10;

        config.join_params = json!("Build");
        assert!(config.validate().is_err());
        config = config.with_module("Build");
        assert!(config.validate().is_ok());

        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_websocket_url() {
        let config = SocketConfig::new("ws://localhost:4000/socket");
        assert_eq!(
            config.websocket_url(),
            "ws://localhost:4000/socket/websocket?vsn=2.0.0"
        );

        let config = SocketConfig::new("wss://ci.example.com/socket/websocket/");
        assert_eq!(
            config.websocket_url(),
            "wss://ci.example.com/socket/websocket?vsn=2.0.0"
        );
    }

    #[test]
    fn test_socket_config_validation() {
        let mut config = SocketConfig::default();
        assert!(config.validate().is_ok());

        config.endpoint = "http://localhost:4000/socket".to_string();
        assert!(config.validate().is_err());

        config.endpoint = "ws://localhost:4000/socket?token=x".to_string();
        assert!(config.validate().is_err());

        config.endpoint = "ws://localhost:4000/socket".to_string();
        config.join_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_backoff() {
        let policy = RetryPolicy::with_attempts(10);
        assert_eq!(policy.delay_after(1), Duration::from_millis(500));
        assert_eq!(policy.delay_after(2), Duration::from_secs(1));
        assert_eq!(policy.delay_after(3), Duration::from_secs(2));
        assert_eq!(policy.delay_after(9), Duration::from_secs(30));
        assert_eq!(policy.delay_after(40), Duration::from_secs(30));
    }
}
