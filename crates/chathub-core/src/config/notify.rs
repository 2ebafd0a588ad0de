//! Email notification configuration.

use serde::{Deserialize, Serialize};

/// Email notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Capacity of the in-process email queue.
    ///
    /// When full, further emails are dropped with a warning; the queue
    /// never blocks the message send path.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Deadline in seconds for a single email relay call.
    #[serde(default = "default_send_timeout")]
    pub send_timeout_seconds: u64,
    /// Whether a user who is both mentioned and eligible for a room-wide
    /// email receives a single email (`true`) or one from each pipeline
    /// (`false`, the historical behavior).
    #[serde(default)]
    pub coalesce_overlap: bool,
    /// URL of the external email delivery relay. When unset, emails are
    /// logged and discarded.
    #[serde(default)]
    pub relay_url: Option<String>,
    /// Bearer token for the delivery relay.
    #[serde(default)]
    pub relay_token: Option<String>,
    /// From address stamped on outgoing email.
    #[serde(default = "default_from_address")]
    pub from_address: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            send_timeout_seconds: default_send_timeout(),
            coalesce_overlap: false,
            relay_url: None,
            relay_token: None,
            from_address: default_from_address(),
        }
    }
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_send_timeout() -> u64 {
    10
}

fn default_from_address() -> String {
    "noreply@chathub.local".to_string()
}
