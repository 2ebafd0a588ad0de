//! Realtime engine configuration.

use serde::{Deserialize, Serialize};

/// Realtime (WebSocket) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Outbound buffer size per connection.
    ///
    /// When a client cannot keep up and the buffer fills, further events
    /// for that connection are dropped with a warning.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Deadline in seconds for store calls made from event handlers.
    ///
    /// A stalled store call is converted into a reported failure instead of
    /// hanging the event forever.
    #[serde(default = "default_store_timeout")]
    pub store_timeout_seconds: u64,
    /// Interval in seconds between presence reconciliation sweeps.
    ///
    /// The sweep drops room-index entries whose connection is no longer
    /// registered and re-broadcasts presence for the affected rooms.
    #[serde(default = "default_reconcile_interval")]
    pub reconcile_interval_seconds: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: default_channel_buffer(),
            store_timeout_seconds: default_store_timeout(),
            reconcile_interval_seconds: default_reconcile_interval(),
        }
    }
}

fn default_channel_buffer() -> usize {
    256
}

fn default_store_timeout() -> u64 {
    10
}

fn default_reconcile_interval() -> u64 {
    60
}
