//! Mailer trait and implementations.
//!
//! Actual delivery is an external concern: the HTTP mailer posts each
//! message to a configured relay endpoint and trusts it from there.

use async_trait::async_trait;
use tracing::info;

use chathub_core::config::notify::NotifyConfig;
use chathub_core::error::AppError;
use chathub_core::result::AppResult;

use crate::email::EmailMessage;

/// Hands a single email to the delivery mechanism.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Attempt delivery of one email. Best-effort; the caller never retries.
    async fn send(&self, email: &EmailMessage) -> AppResult<()>;
}

/// Mailer that posts messages to an external HTTP delivery relay.
#[derive(Debug, Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    relay_url: String,
    relay_token: Option<String>,
    from_address: String,
}

impl HttpMailer {
    /// Build from configuration. Returns None when no relay is configured.
    pub fn from_config(config: &NotifyConfig) -> Option<Self> {
        config.relay_url.as_ref().map(|url| Self {
            client: reqwest::Client::new(),
            relay_url: url.clone(),
            relay_token: config.relay_token.clone(),
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &EmailMessage) -> AppResult<()> {
        let payload = serde_json::json!({
            "from": self.from_address,
            "to": email.to,
            "subject": email.subject,
            "text": email.text,
            "html": email.html,
        });

        let mut request = self.client.post(&self.relay_url).json(&payload);
        if let Some(token) = &self.relay_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::notification(format!("Email relay unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::notification(format!(
                "Email relay returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}

/// Mailer that logs and discards. Used when no relay is configured.
#[derive(Debug, Clone, Default)]
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, email: &EmailMessage) -> AppResult<()> {
        info!(to = %email.to, subject = %email.subject, "Email discarded (no relay configured)");
        Ok(())
    }
}
