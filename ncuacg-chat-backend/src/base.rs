//! Backend trait and wire types

use async_trait::async_trait;
use ncuacg_chat_core::persona::Persona;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for backend operations
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP 400: the backend refused the request, usually an unknown persona
    #[error("{detail}")]
    Rejected {
        detail: String,
        available_personas: Vec<AvailablePersona>,
    },

    #[error("API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Body of `POST <chat-endpoint>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            persona: None,
            conversation_id: None,
        }
    }

    pub fn with_persona(mut self, persona: Option<String>) -> Self {
        self.persona = persona;
        self
    }

    pub fn with_conversation(mut self, conversation_id: Option<String>) -> Self {
        self.conversation_id = conversation_id;
        self
    }
}

/// Successful chat response
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub persona: Option<String>,
    /// Newer backends echo the persona actually used under this key as well
    #[serde(default, rename = "personaUsed")]
    pub persona_used: Option<String>,
}

impl ChatReply {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            ..Self::default()
        }
    }

    pub fn with_conversation(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    pub fn with_persona(mut self, id: impl Into<String>) -> Self {
        self.persona = Some(id.into());
        self
    }

    /// Persona the backend answered with, if it reported one
    pub fn effective_persona(&self) -> Option<&str> {
        self.persona_used
            .as_deref()
            .or(self.persona.as_deref())
            .filter(|id| !id.trim().is_empty())
    }

    /// Conversation id the backend returned, if any
    pub fn effective_conversation(&self) -> Option<&str> {
        self.conversation_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }
}

/// Persona the backend accepts, listed on a 400 response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailablePersona {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Body of a 400 response
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RejectionBody {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub available_personas: Vec<AvailablePersona>,
}

/// Entry of `GET <personas-endpoint>`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemotePersona {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<RemotePersona> for Persona {
    fn from(remote: RemotePersona) -> Self {
        let mut persona = Persona::new(
            remote.id,
            remote.name,
            remote.description.unwrap_or_default(),
        );
        persona.avatar = remote.avatar.filter(|a| !a.is_empty());
        persona
    }
}

/// Trait for assistant backends
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one chat message and wait for the reply
    async fn send(&self, request: ChatRequest) -> BackendResult<ChatReply>;

    /// List the personas the backend serves.
    ///
    /// Backends without a listing endpoint report none.
    async fn list_personas(&self) -> BackendResult<Vec<RemotePersona>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_omits_absent_fields() {
        let request = ChatRequest::new("Hello");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({ "message": "Hello" })
        );

        let request = ChatRequest::new("Hello")
            .with_persona(Some("starter_guide".to_string()))
            .with_conversation(Some("c1".to_string()));
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "message": "Hello",
                "persona": "starter_guide",
                "conversation_id": "c1"
            })
        );
    }

    #[test]
    fn test_reply_accepts_persona_and_persona_used() {
        let reply: ChatReply = serde_json::from_str(
            r#"{"reply":"Hi","persona":"starter_guide","personaUsed":"weekend_curator","usage":{"tokens":3}}"#,
        )
        .unwrap();
        assert_eq!(reply.effective_persona(), Some("weekend_curator"));

        let reply: ChatReply =
            serde_json::from_str(r#"{"reply":"Hi","persona":"","conversation_id":null}"#).unwrap();
        assert_eq!(reply.effective_persona(), None);
        assert_eq!(reply.effective_conversation(), None);
    }

    #[test]
    fn test_reply_requires_reply_field() {
        assert!(serde_json::from_str::<ChatReply>(r#"{"persona":"x"}"#).is_err());
    }

    #[test]
    fn test_remote_persona_into_catalog_entry() {
        let remote = RemotePersona {
            id: "storyboard_coach".to_string(),
            name: "分鏡教練".to_string(),
            avatar: Some(String::new()),
            description: None,
        };
        let persona: Persona = remote.into();
        assert_eq!(persona.display_name, "分鏡教練");
        assert_eq!(persona.avatar, None);
        assert!(!persona.is_hidden());
    }
}
