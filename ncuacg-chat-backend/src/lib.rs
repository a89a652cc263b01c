//! Assistant backend integration
//!
//! The session talks to the backend through the [`ChatBackend`] trait;
//! [`HttpChatBackend`] is the reqwest implementation used in production.

pub mod base;
pub mod http;

pub use base::{
    AvailablePersona, BackendError, BackendResult, ChatBackend, ChatReply, ChatRequest,
    RemotePersona,
};
pub use http::HttpChatBackend;
