//! Session data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    /// Client-generated notices such as request failures
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chat message. Immutable once appended to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Stable id for rendering
    pub id: String,
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new message stamped with the current time
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }
}

/// The single logical chat session observed by all surfaces
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// Messages in arrival order
    pub messages: Vec<Message>,
    /// Selected persona; empty means the server default
    pub persona_id: String,
    /// Backend-issued conversation token
    pub conversation_id: Option<String>,
    /// A request is in flight
    pub loading: bool,
    /// Last failure reported to the user
    pub last_error: Option<String>,
}

impl SessionState {
    /// Create an empty session with the given persona selection
    pub fn new(persona_id: impl Into<String>) -> Self {
        Self {
            persona_id: persona_id.into(),
            ..Self::default()
        }
    }

    /// Persona to send with a request, `None` when the server default applies
    pub fn effective_persona(&self) -> Option<&str> {
        Some(self.persona_id.as_str()).filter(|id| !id.trim().is_empty())
    }

    /// Get the last `max_messages` messages
    pub fn get_history(&self, max_messages: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(max_messages);
        &self.messages[start..]
    }

    /// Drop the log and conversation, keeping the persona selection
    pub fn clear(&mut self) {
        self.messages.clear();
        self.conversation_id = None;
        self.loading = false;
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_roles_serialize_lowercase() {
        let msg = Message::assistant("Hi there");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["text"], "Hi there");
    }

    #[test]
    fn test_message_ids_are_unique() {
        let a = Message::user("a");
        let b = Message::user("a");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_effective_persona() {
        assert_eq!(SessionState::new("").effective_persona(), None);
        assert_eq!(SessionState::new("  ").effective_persona(), None);
        assert_eq!(
            SessionState::new("starter_guide").effective_persona(),
            Some("starter_guide")
        );
    }

    #[test]
    fn test_get_history() {
        let mut state = SessionState::default();
        for i in 0..60 {
            state.messages.push(Message::user(format!("Message {}", i)));
        }

        let history = state.get_history(50);
        assert_eq!(history.len(), 50);
        assert_eq!(history[0].text, "Message 10");
    }

    #[test]
    fn test_clear_keeps_persona() {
        let mut state = SessionState::new("weekend_curator");
        state.messages.push(Message::user("Hello"));
        state.conversation_id = Some("c1".to_string());
        state.last_error = Some("boom".to_string());

        state.clear();

        assert!(state.messages.is_empty());
        assert_eq!(state.conversation_id, None);
        assert_eq!(state.last_error, None);
        assert_eq!(state.persona_id, "weekend_curator");
    }
}
