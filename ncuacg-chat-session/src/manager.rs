//! The chat session manager

use ncuacg_chat_backend::{BackendError, BackendResult, ChatBackend, ChatReply, ChatRequest};
use ncuacg_chat_core::bus::{ChangeSource, SessionEvent, SessionEvents, SessionObserver};
use ncuacg_chat_core::session::{Message, SessionPersistence, SessionState};
use ncuacg_chat_core::storage::KeyValueStore;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::types::{SendOptions, SendOutcome, SessionOptions};

/// The request currently allowed to write into the session.
///
/// Every send, `abort` and `reset` bumps `generation`; a completing
/// request applies its result only if its generation is still current.
#[derive(Default)]
struct Inflight {
    generation: u64,
    token: Option<CancellationToken>,
}

impl Inflight {
    /// Cancel the current request and retire its generation
    fn cancel(&mut self) -> bool {
        self.generation += 1;
        match self.token.take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

struct Inner {
    state: RwLock<SessionState>,
    // Lock order: `state` before `inflight`.
    inflight: Mutex<Inflight>,
    backend: Arc<dyn ChatBackend>,
    persistence: SessionPersistence,
    events: SessionEvents,
    options: SessionOptions,
}

/// Handle to the process-wide chat session.
///
/// Cloning is cheap; clones share one state, one persistence port and one
/// change bus, which is how the widget and the full chat page stay in sync.
#[derive(Clone)]
pub struct ChatSession {
    inner: Arc<Inner>,
}

impl ChatSession {
    /// Restore the session from `store`, or start an empty one
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        store: Arc<dyn KeyValueStore>,
        options: SessionOptions,
    ) -> Self {
        let persistence = SessionPersistence::new(store);
        let state = persistence.load(&options.default_persona);
        let events = SessionEvents::new(state.persona_id.clone());

        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(state),
                inflight: Mutex::new(Inflight::default()),
                backend,
                persistence,
                events,
                options,
            }),
        }
    }

    /// Attach an observer for a new surface
    pub fn subscribe(&self) -> SessionObserver {
        self.inner.events.subscribe()
    }

    pub fn snapshot(&self) -> SessionState {
        self.inner.state.read().clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.inner.state.read().messages.clone()
    }

    pub fn persona_id(&self) -> String {
        self.inner.state.read().persona_id.clone()
    }

    pub fn conversation_id(&self) -> Option<String> {
        self.inner.state.read().conversation_id.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.read().loading
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.state.read().last_error.clone()
    }

    /// Send a message and append the backend's answer.
    ///
    /// The user message is appended before the request is issued. Any
    /// earlier request still in flight is cancelled and its result dropped.
    /// Failures never surface as errors; they land in `last_error` and, for
    /// transport failures, as a system message in the log.
    pub async fn send_message(&self, text: &str, options: SendOptions) -> SendOutcome {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return SendOutcome::Ignored;
        }

        let (request, generation, token) = {
            let mut state = self.inner.state.write();

            let (generation, token) = {
                let mut inflight = self.inner.inflight.lock();
                if inflight.cancel() {
                    debug!("Cancelled previous chat request");
                }
                let token = CancellationToken::new();
                inflight.token = Some(token.clone());
                (inflight.generation, token)
            };

            let message = Message::user(trimmed);
            state.messages.push(message.clone());
            state.last_error = None;
            self.inner.persistence.save_messages(&state.messages);
            self.inner
                .events
                .publish(SessionEvent::message_appended(message));
            if !state.loading {
                state.loading = true;
                self.inner
                    .events
                    .publish(SessionEvent::LoadingChanged { loading: true });
            }

            let persona = options
                .persona_id
                .filter(|id| !id.trim().is_empty())
                .or_else(|| state.effective_persona().map(ToString::to_string));
            let conversation = options
                .conversation_id
                .filter(|id| !id.trim().is_empty())
                .or_else(|| state.conversation_id.clone());
            let request = ChatRequest::new(trimmed)
                .with_persona(persona)
                .with_conversation(conversation);

            (request, generation, token)
        };

        debug!("Chat request #{} issued", generation);
        let result = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            result = self.inner.backend.send(request) => Some(result),
        };

        self.complete(generation, result)
    }

    fn complete(
        &self,
        generation: u64,
        result: Option<BackendResult<ChatReply>>,
    ) -> SendOutcome {
        let mut state = self.inner.state.write();
        {
            let mut inflight = self.inner.inflight.lock();
            if inflight.generation != generation {
                debug!("Discarding result of superseded chat request #{}", generation);
                return SendOutcome::Superseded;
            }
            inflight.token = None;
        }
        // A cancelled request always has a retired generation.
        let Some(result) = result else {
            return SendOutcome::Superseded;
        };

        state.loading = false;
        self.inner
            .events
            .publish(SessionEvent::LoadingChanged { loading: false });

        match result {
            Ok(reply) => {
                self.apply_reply(&mut state, reply);
                SendOutcome::Replied
            }
            Err(BackendError::Rejected {
                detail,
                available_personas,
            }) => {
                warn!("Backend rejected chat request: {}", detail);
                self.raise_error(&mut state, detail);
                let fallback = available_personas
                    .into_iter()
                    .map(|p| p.id)
                    .find(|id| !id.trim().is_empty());
                if let Some(fallback) = fallback.filter(|_| self.inner.options.persona_fallback) {
                    if fallback != state.persona_id {
                        info!("Falling back to persona '{}'", fallback);
                        self.apply_persona(&mut state, fallback, ChangeSource::Fallback);
                    }
                }
                SendOutcome::Rejected
            }
            Err(err) => {
                let description = describe_failure(&err);
                warn!("Chat request failed: {}", description);
                self.raise_error(&mut state, description.clone());
                self.append(&mut state, Message::system(format!("Error: {}", description)));
                SendOutcome::Failed
            }
        }
    }

    fn apply_reply(&self, state: &mut SessionState, reply: ChatReply) {
        if let Some(conversation) = reply.effective_conversation() {
            if state.conversation_id.as_deref() != Some(conversation) {
                info!("Conversation switched to '{}'", conversation);
                state.conversation_id = Some(conversation.to_string());
                self.inner.persistence.save_conversation(Some(conversation));
                self.inner.events.publish(SessionEvent::ConversationChanged {
                    id: state.conversation_id.clone(),
                });
            }
        }

        if self.inner.options.adopt_server_persona {
            if let Some(persona) = reply.effective_persona() {
                if persona != state.persona_id {
                    info!("Backend switched persona to '{}'", persona);
                    self.apply_persona(state, persona.to_string(), ChangeSource::Server);
                }
            }
        }

        self.append(state, Message::assistant(reply.reply));
    }

    fn append(&self, state: &mut SessionState, message: Message) {
        state.messages.push(message.clone());
        self.inner.persistence.save_messages(&state.messages);
        self.inner
            .events
            .publish(SessionEvent::message_appended(message));
    }

    fn raise_error(&self, state: &mut SessionState, message: String) {
        state.last_error = Some(message.clone());
        self.inner
            .events
            .publish(SessionEvent::ErrorRaised { message });
    }

    fn apply_persona(&self, state: &mut SessionState, id: String, source: ChangeSource) {
        state.persona_id = id.clone();
        self.inner.persistence.save_persona(&id);
        self.inner
            .events
            .publish_persona(SessionEvent::persona_changed(id, source));
    }

    /// Select a persona and tell every attached surface.
    ///
    /// Ids are not checked against any catalog; the backend validates them
    /// on the next send.
    pub fn set_persona_id(&self, id: impl Into<String>) {
        let id = id.into();
        let mut state = self.inner.state.write();
        debug!("Persona set to '{}'", id);
        self.apply_persona(&mut state, id, ChangeSource::User);
    }

    /// Clear the log and conversation, keeping the persona selection.
    ///
    /// An in-flight request is cancelled and will not append anything.
    pub fn reset(&self) {
        let mut state = self.inner.state.write();
        self.inner.inflight.lock().cancel();

        let was_loading = state.loading;
        state.clear();
        self.inner.persistence.save_messages(&state.messages);
        self.inner.persistence.save_conversation(None);

        if was_loading {
            self.inner
                .events
                .publish(SessionEvent::LoadingChanged { loading: false });
        }
        self.inner.events.publish(SessionEvent::Reset);
        info!("Chat session reset");
    }

    /// Cancel the in-flight request, leaving the log untouched
    pub fn abort(&self) {
        let mut state = self.inner.state.write();
        if self.inner.inflight.lock().cancel() {
            debug!("Chat request aborted");
        }
        if state.loading {
            state.loading = false;
            self.inner
                .events
                .publish(SessionEvent::LoadingChanged { loading: false });
        }
    }

    /// Adopt persona and conversation changes another process persisted.
    ///
    /// Best effort: in-flight requests are not reconciled, and a field the
    /// store cannot read keeps its in-memory value. Returns whether anything
    /// changed.
    pub fn sync_from_store(&self) -> bool {
        let stored_persona = self.inner.persistence.read_persona();
        let stored_conversation = self.inner.persistence.read_conversation();

        let mut state = self.inner.state.write();
        let mut changed = false;

        // An absent key means nothing was ever chosen; an empty one is the
        // server default picked elsewhere.
        if let Some(Some(persona)) = stored_persona {
            if persona != state.persona_id {
                info!("Persona changed in storage to '{}'", persona);
                state.persona_id = persona.clone();
                self.inner
                    .events
                    .publish_persona(SessionEvent::persona_changed(persona, ChangeSource::Storage));
                changed = true;
            }
        }

        if let Some(conversation) = stored_conversation {
            if conversation != state.conversation_id {
                debug!("Conversation changed in storage to {:?}", conversation);
                state.conversation_id = conversation;
                self.inner.events.publish(SessionEvent::ConversationChanged {
                    id: state.conversation_id.clone(),
                });
                changed = true;
            }
        }

        changed
    }
}

/// User-facing description of a transport or server failure
fn describe_failure(err: &BackendError) -> String {
    match err {
        BackendError::Http(e) if e.is_timeout() => "request timed out".to_string(),
        BackendError::Http(e) if e.is_connect() => "could not reach the assistant".to_string(),
        BackendError::Api { status, body } if body.is_empty() => format!("HTTP {}", status),
        BackendError::Api { status, body } => format!("HTTP {}: {}", status, body),
        other => other.to_string(),
    }
}
