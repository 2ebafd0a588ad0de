//! # chathub-notify
//!
//! The Notifier collaborator boundary. The realtime engine enqueues
//! [`email::EmailMessage`]s onto a bounded in-process queue; a background
//! [`worker::EmailWorker`] drains the queue and hands each message to a
//! [`mailer::Mailer`]. Delivery is best-effort and at-most-once: failures
//! are logged, never retried, and can never reach the message send path.

pub mod email;
pub mod mailer;
pub mod queue;
pub mod worker;

pub use email::EmailMessage;
pub use mailer::{HttpMailer, Mailer, NoopMailer};
pub use queue::EmailQueue;
pub use worker::EmailWorker;
