//! Background worker that drains the email queue.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use chathub_core::config::notify::NotifyConfig;

use crate::email::EmailMessage;
use crate::mailer::Mailer;

/// Drains the email queue and hands each message to the mailer.
///
/// Delivery is at-most-once: a failed or timed-out send is logged and the
/// message is gone.
pub struct EmailWorker {
    mailer: Arc<dyn Mailer>,
    rx: mpsc::Receiver<EmailMessage>,
    send_timeout: Duration,
}

impl EmailWorker {
    /// Create a worker for the given queue receiver.
    pub fn new(mailer: Arc<dyn Mailer>, rx: mpsc::Receiver<EmailMessage>, config: &NotifyConfig) -> Self {
        Self {
            mailer,
            rx,
            send_timeout: Duration::from_secs(config.send_timeout_seconds),
        }
    }

    /// Run until the cancel signal fires or the queue closes.
    pub async fn run(mut self, mut cancel: watch::Receiver<bool>) {
        info!("Email worker started");

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        info!("Email worker received shutdown signal");
                        break;
                    }
                }
                next = self.rx.recv() => {
                    match next {
                        Some(email) => self.deliver(email).await,
                        None => {
                            debug!("Email queue closed");
                            break;
                        }
                    }
                }
            }
        }

        // Drain whatever is already queued before exiting.
        while let Ok(email) = self.rx.try_recv() {
            self.deliver(email).await;
        }

        info!("Email worker shut down");
    }

    async fn deliver(&self, email: EmailMessage) {
        match tokio::time::timeout(self.send_timeout, self.mailer.send(&email)).await {
            Ok(Ok(())) => {
                debug!(to = %email.to, subject = %email.subject, "Email delivered to relay");
            }
            Ok(Err(e)) => {
                warn!(to = %email.to, error = %e, "Email delivery failed");
            }
            Err(_) => {
                warn!(to = %email.to, timeout = ?self.send_timeout, "Email delivery timed out");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chathub_core::result::AppResult;

    use super::*;
    use crate::queue::EmailQueue;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<EmailMessage>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &EmailMessage) -> AppResult<()> {
            self.sent
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(email.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_worker_drains_queue_then_stops() {
        let mailer = Arc::new(RecordingMailer::default());
        let (queue, rx) = EmailQueue::new(8);
        let config = NotifyConfig::default();
        let worker = EmailWorker::new(mailer.clone(), rx, &config);

        queue.enqueue(EmailMessage::room_message(
            "b@example.com",
            "alice",
            "general",
            "hi",
        ));
        queue.enqueue(EmailMessage::mention(
            "c@example.com",
            "alice",
            "general",
            "hey @carol",
        ));

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let handle = tokio::spawn(worker.run(cancel_rx));

        // Give the worker a moment to drain, then stop it.
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel_tx.send(true).expect("worker listening");
        handle.await.expect("worker exits cleanly");

        let sent = mailer.sent.lock().unwrap_or_else(|e| e.into_inner());
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "b@example.com");
        assert_eq!(sent[1].to, "c@example.com");
    }
}
