//! Session data model
//!
//! The message log, persona selection and conversation id shared by every
//! chat surface, and their mapping onto the persistence port.

pub mod persist;
pub mod store;

pub use persist::{SessionPersistence, CONVERSATION_KEY, MESSAGES_KEY, PERSONA_KEY};
pub use store::{Message, Role, SessionState};
