//! Configuration module
//!
//! Handles CLI configuration: where the socket lives and how to talk to it.

use std::time::Duration;

use anyhow::Result;
use buildlog_client::SocketConfig;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Socket connection settings
    pub socket: SocketConfig,
}

impl Config {
    /// Builds and validates the configuration from command-line values
    pub fn new(socket_url: String, join_timeout_secs: u64, heartbeat_secs: u64) -> Result<Self> {
        let socket = SocketConfig {
            endpoint: socket_url,
            heartbeat_interval: Duration::from_secs(heartbeat_secs),
            join_timeout: Duration::from_secs(join_timeout_secs),
        };
        socket.validate()?;

        Ok(Self { socket })
    }
}
