//! Realtime engine metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level metrics counters.
#[derive(Debug, Default)]
pub struct RealtimeMetrics {
    /// Total connections ever established
    pub connections_total: AtomicU64,
    /// Total events delivered to client connections
    pub events_delivered: AtomicU64,
    /// Total messages broadcast to rooms
    pub messages_broadcast: AtomicU64,
    /// Total in-app mention notifications dispatched
    pub mentions_dispatched: AtomicU64,
    /// Total emails handed to the notification queue
    pub emails_enqueued: AtomicU64,
    /// Total stale index entries removed by the reconciliation sweep
    pub presence_repairs: AtomicU64,
}

impl RealtimeMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an established connection
    pub fn connection_opened(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record events delivered to connections
    pub fn events_delivered_count(&self, n: u64) {
        self.events_delivered.fetch_add(n, Ordering::Relaxed);
    }

    /// Record one room broadcast
    pub fn message_broadcast(&self) {
        self.messages_broadcast.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an in-app mention dispatch
    pub fn mention_dispatched(&self) {
        self.mentions_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an email handed to the queue
    pub fn email_enqueued(&self) {
        self.emails_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Record stale entries removed by the reconciliation sweep
    pub fn presence_repaired(&self, n: u64) {
        self.presence_repairs.fetch_add(n, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            events_delivered: self.events_delivered.load(Ordering::Relaxed),
            messages_broadcast: self.messages_broadcast.load(Ordering::Relaxed),
            mentions_dispatched: self.mentions_dispatched.load(Ordering::Relaxed),
            emails_enqueued: self.emails_enqueued.load(Ordering::Relaxed),
            presence_repairs: self.presence_repairs.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Total connections ever established
    pub connections_total: u64,
    /// Total events delivered to client connections
    pub events_delivered: u64,
    /// Total messages broadcast to rooms
    pub messages_broadcast: u64,
    /// Total in-app mention notifications dispatched
    pub mentions_dispatched: u64,
    /// Total emails handed to the notification queue
    pub emails_enqueued: u64,
    /// Total stale index entries repaired
    pub presence_repairs: u64,
}
