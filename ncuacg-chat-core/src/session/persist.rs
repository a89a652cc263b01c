//! Mapping of session state onto the key-value persistence port
//!
//! Every operation here fails closed: storage errors are logged and the
//! session carries on in memory.

use super::store::{Message, SessionState};
use crate::storage::KeyValueStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Serialized message log
pub const MESSAGES_KEY: &str = "ncuacg.messages";
/// Selected persona id
pub const PERSONA_KEY: &str = "ncuacg.personaId";
/// Backend conversation id; absent when there is none
pub const CONVERSATION_KEY: &str = "ncuacg.conversationId";

/// Fail-closed view of a [`KeyValueStore`] in terms of session fields
#[derive(Clone)]
pub struct SessionPersistence {
    store: Arc<dyn KeyValueStore>,
}

impl SessionPersistence {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Restore a session, falling back to `default_persona` when none is stored
    pub fn load(&self, default_persona: &str) -> SessionState {
        let messages = self
            .read(MESSAGES_KEY)
            .flatten()
            .and_then(|raw| match serde_json::from_str::<Vec<Message>>(&raw) {
                Ok(messages) => Some(messages),
                Err(e) => {
                    warn!("Discarding unreadable message log: {}", e);
                    None
                }
            })
            .unwrap_or_default();

        // A blank stored persona means "never chosen" on startup.
        let persona_id = self
            .read_persona()
            .flatten()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default_persona.to_string());

        let state = SessionState {
            messages,
            persona_id,
            conversation_id: self.read_conversation().flatten(),
            loading: false,
            last_error: None,
        };
        debug!(
            "Restored session: {} messages, persona '{}', conversation {:?}",
            state.messages.len(),
            state.persona_id,
            state.conversation_id
        );
        state
    }

    /// Stored persona id.
    ///
    /// `None` when the store could not be read, `Some(None)` when no persona
    /// was ever saved. An empty id is returned as is: it selects the server
    /// default.
    pub fn read_persona(&self) -> Option<Option<String>> {
        self.read(PERSONA_KEY)
    }

    /// Stored conversation id; `None` when the store could not be read and
    /// `Some(None)` when there is no conversation
    pub fn read_conversation(&self) -> Option<Option<String>> {
        self.read(CONVERSATION_KEY)
            .map(|value| value.filter(|v| !v.is_empty()))
    }

    pub fn save_messages(&self, messages: &[Message]) -> bool {
        match serde_json::to_string(messages) {
            Ok(raw) => self.write(MESSAGES_KEY, &raw),
            Err(e) => {
                warn!("Failed to serialize message log: {}", e);
                false
            }
        }
    }

    pub fn save_persona(&self, persona_id: &str) -> bool {
        self.write(PERSONA_KEY, persona_id)
    }

    /// Store the conversation id, removing the key when `None`
    pub fn save_conversation(&self, conversation_id: Option<&str>) -> bool {
        match conversation_id {
            Some(id) => self.write(CONVERSATION_KEY, id),
            None => match self.store.remove(CONVERSATION_KEY) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Failed to remove {}: {}", CONVERSATION_KEY, e);
                    false
                }
            },
        }
    }

    /// `None` on a store error, otherwise whether the key holds a value
    fn read(&self, key: &str) -> Option<Option<String>> {
        match self.store.get(key) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Failed to read {}: {}", key, e);
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) -> bool {
        match self.store.set(key, value) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to persist {}: {}", key, e);
                false
            }
        }
    }
}
