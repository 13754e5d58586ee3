//! Transcript types shared by the chat core and the terminal front-end.

use serde::{Deserialize, Serialize};

/// Greeting placed at the top of every fresh transcript.
pub const SEED_GREETING: &str =
    "Welcome to Stress2Health 👋\nI'm your AI assistant. Tell me a bit about how you're feeling today.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// One rendered conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
    /// Local wall-clock time at append, formatted for display (`HH:MM`).
    pub timestamp: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
            timestamp: display_time(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Bot,
            timestamp: display_time(),
        }
    }

    pub fn seed() -> Self {
        Self::bot(SEED_GREETING)
    }
}

/// Current local time as `HH:MM`.
pub fn display_time() -> String {
    chrono::Local::now().format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_is_bot_greeting() {
        let msg = Message::seed();
        assert_eq!(msg.sender, Sender::Bot);
        assert_eq!(msg.text, SEED_GREETING);
    }

    #[test]
    fn display_time_is_hours_and_minutes() {
        let t = display_time();
        assert_eq!(t.len(), 5);
        assert_eq!(&t[2..3], ":");
    }

    #[test]
    fn message_wire_shape() {
        let msg = Message {
            text: "hi".into(),
            sender: Sender::User,
            timestamp: "09:30".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["sender"], "user");
        assert_eq!(json["text"], "hi");
        assert_eq!(json["timestamp"], "09:30");
    }
}
