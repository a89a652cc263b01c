//! Session options and results

use ncuacg_chat_core::config::AssistantConfig;

/// Behaviour switches for a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Persona used when storage holds none
    pub default_persona: String,
    /// On a 400 listing available personas, switch to the first one
    pub persona_fallback: bool,
    /// Adopt the persona the backend reports on each reply
    pub adopt_server_persona: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            default_persona: String::new(),
            persona_fallback: true,
            adopt_server_persona: true,
        }
    }
}

impl From<&AssistantConfig> for SessionOptions {
    fn from(config: &AssistantConfig) -> Self {
        Self {
            default_persona: config.default_persona.clone(),
            persona_fallback: config.persona_fallback,
            adopt_server_persona: config.adopt_server_persona,
        }
    }
}

/// Per-message overrides for [`crate::ChatSession::send_message`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendOptions {
    pub persona_id: Option<String>,
    pub conversation_id: Option<String>,
}

impl SendOptions {
    /// Persona for this message only; blank ids are ignored
    pub fn with_persona(mut self, id: Option<String>) -> Self {
        self.persona_id = id.filter(|id| !id.trim().is_empty());
        self
    }

    /// Continue a specific backend conversation; blank ids are ignored
    pub fn with_conversation(mut self, id: Option<String>) -> Self {
        self.conversation_id = id.filter(|id| !id.trim().is_empty());
        self
    }
}

/// How a send ended. Failures are already reflected in session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input, nothing happened
    Ignored,
    /// An assistant reply was appended
    Replied,
    /// The backend refused the request; `last_error` holds its detail
    Rejected,
    /// Transport or server failure; a system message was appended
    Failed,
    /// Cancelled by a newer send, `abort` or `reset`; nothing was appended
    Superseded,
}
