//! Server configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for a [`FeedServer`](crate::FeedServer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,

    /// How often clients should send a Heartbeat. Sent to the client in
    /// Metadata as milliseconds.
    pub heartbeat_interval: Duration,

    /// Missed heartbeat intervals tolerated before a silent client is
    /// dropped.
    pub heartbeat_grace: u32,

    /// How long a new connection has to send Identify.
    pub identify_timeout: Duration,

    /// Upper bound for `RequestAuctions.amount`.
    pub max_page_size: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            heartbeat_interval: Duration::from_secs(30),
            heartbeat_grace: 2,
            identify_timeout: Duration::from_secs(5),
            max_page_size: 100,
        }
    }
}

impl FeedConfig {
    /// Heartbeat interval in the wire form carried by Metadata.
    pub fn heartbeat_interval_ms(&self) -> i32 {
        i32::try_from(self.heartbeat_interval.as_millis()).unwrap_or(i32::MAX)
    }

    /// How long the server waits for any message before giving up on a
    /// client.
    pub fn idle_timeout(&self) -> Duration {
        self.heartbeat_interval
            .saturating_mul(self.heartbeat_grace.saturating_add(1))
    }
}
