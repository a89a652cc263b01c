//! Event types for the change bus

use crate::session::Message;
use serde::{Deserialize, Serialize};

/// What triggered a persona change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSource {
    /// A surface called `set_persona_id`
    User,
    /// The backend reported a different persona on a reply
    Server,
    /// The backend rejected the persona and suggested another
    Fallback,
    /// Another process changed the persisted selection
    Storage,
}

/// Session change notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    PersonaChanged { id: String, source: ChangeSource },
    MessageAppended { message: Message },
    ConversationChanged { id: Option<String> },
    LoadingChanged { loading: bool },
    ErrorRaised { message: String },
    Reset,
}

impl SessionEvent {
    pub fn persona_changed(id: impl Into<String>, source: ChangeSource) -> Self {
        Self::PersonaChanged {
            id: id.into(),
            source,
        }
    }

    pub fn message_appended(message: Message) -> Self {
        Self::MessageAppended { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persona_event_wire_shape() {
        let event = SessionEvent::persona_changed("weekend_curator", ChangeSource::Server);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "persona_changed");
        assert_eq!(value["id"], "weekend_curator");
        assert_eq!(value["source"], "server");
    }
}
