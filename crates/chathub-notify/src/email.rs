//! Email message type and body formatting.

use serde::{Deserialize, Serialize};

/// An email ready for hand-off to the delivery relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub text: String,
    /// HTML body.
    pub html: String,
}

impl EmailMessage {
    /// Email sent to a user who was mentioned while offline.
    pub fn mention(to: &str, sender: &str, room_name: &str, content: &str) -> Self {
        let excerpt = excerpt(content);
        Self {
            to: to.to_string(),
            subject: format!("{sender} mentioned you in {room_name}"),
            text: format!("{sender} mentioned you in {room_name}:\n\n{excerpt}"),
            html: format!(
                "<p><strong>{sender}</strong> mentioned you in <strong>{room_name}</strong>:</p><blockquote>{excerpt}</blockquote>"
            ),
        }
    }

    /// Email sent to an offline room member under the `all` preference.
    pub fn room_message(to: &str, sender: &str, room_name: &str, content: &str) -> Self {
        let excerpt = excerpt(content);
        Self {
            to: to.to_string(),
            subject: format!("New message in {room_name}"),
            text: format!("{sender} wrote in {room_name}:\n\n{excerpt}"),
            html: format!(
                "<p><strong>{sender}</strong> wrote in <strong>{room_name}</strong>:</p><blockquote>{excerpt}</blockquote>"
            ),
        }
    }
}

/// Truncate long message bodies for email.
fn excerpt(content: &str) -> String {
    const MAX: usize = 280;
    if content.chars().count() <= MAX {
        content.to_string()
    } else {
        let truncated: String = content.chars().take(MAX).collect();
        format!("{truncated}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mention_subject_names_sender_and_room() {
        let email = EmailMessage::mention("bob@example.com", "alice", "general", "hey @bob");
        assert_eq!(email.subject, "alice mentioned you in general");
        assert!(email.text.contains("hey @bob"));
    }

    #[test]
    fn test_long_content_is_truncated() {
        let long = "x".repeat(500);
        let email = EmailMessage::room_message("bob@example.com", "alice", "general", &long);
        assert!(email.text.chars().count() < 400);
        assert!(email.text.ends_with('…'));
    }
}
