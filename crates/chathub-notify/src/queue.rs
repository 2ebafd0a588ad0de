//! Bounded in-process email queue.

use tokio::sync::mpsc;
use tracing::warn;

use crate::email::EmailMessage;

/// Producer half of the email queue.
///
/// Enqueueing never blocks: when the queue is full the email is dropped
/// with a warning, so a slow relay can never stall the message send path.
#[derive(Debug, Clone)]
pub struct EmailQueue {
    tx: mpsc::Sender<EmailMessage>,
}

impl EmailQueue {
    /// Create a queue with the given capacity, returning the producer and
    /// the receiver to hand to the worker.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<EmailMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Enqueue an email for background delivery.
    ///
    /// Returns whether the email was accepted.
    pub fn enqueue(&self, email: EmailMessage) -> bool {
        match self.tx.try_send(email) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                warn!(to = %dropped.to, "Email queue full, dropping message");
                false
            }
            Err(mpsc::error::TrySendError::Closed(dropped)) => {
                warn!(to = %dropped.to, "Email worker gone, dropping message");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_overflow_is_dropped_not_blocking() {
        let (queue, mut rx) = EmailQueue::new(1);

        let first = EmailMessage::room_message("a@example.com", "alice", "general", "one");
        let second = EmailMessage::room_message("b@example.com", "alice", "general", "two");

        assert!(queue.enqueue(first));
        assert!(!queue.enqueue(second));

        let delivered = rx.recv().await.expect("one email queued");
        assert_eq!(delivered.to, "a@example.com");
    }

    #[tokio::test]
    async fn test_enqueue_after_worker_gone() {
        let (queue, rx) = EmailQueue::new(4);
        drop(rx);

        let email = EmailMessage::room_message("a@example.com", "alice", "general", "one");
        assert!(!queue.enqueue(email));
    }
}
