//! Broadcast channels backing the change bus

use super::events::SessionEvent;
use tokio::sync::{broadcast, watch};
use tracing::debug;

/// Buffered events per observer before slow observers start lagging
const EVENT_CAPACITY: usize = 256;

/// Publishing side of the bus, owned by the session
#[derive(Debug, Clone)]
pub struct SessionEvents {
    events_tx: broadcast::Sender<SessionEvent>,
    persona_tx: watch::Sender<String>,
}

impl SessionEvents {
    /// Create a bus seeded with the current persona selection
    pub fn new(initial_persona: impl Into<String>) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let (persona_tx, _) = watch::channel(initial_persona.into());
        Self {
            events_tx,
            persona_tx,
        }
    }

    /// Attach a new observer
    pub fn subscribe(&self) -> SessionObserver {
        SessionObserver {
            events_rx: self.events_tx.subscribe(),
            persona_rx: self.persona_tx.subscribe(),
        }
    }

    /// Publish a persona change.
    ///
    /// The watch value is replaced before the event is sent, so an observer
    /// woken by the event always reads the new persona.
    pub fn publish_persona(&self, event: SessionEvent) {
        if let SessionEvent::PersonaChanged { id, .. } = &event {
            self.persona_tx.send_replace(id.clone());
        }
        self.publish(event);
    }

    /// Publish any other event; having no observers is fine
    pub fn publish(&self, event: SessionEvent) {
        if self.events_tx.send(event).is_err() {
            debug!("No session observers attached");
        }
    }
}

/// Receiving side of the bus, one per surface
#[derive(Debug)]
pub struct SessionObserver {
    events_rx: broadcast::Receiver<SessionEvent>,
    persona_rx: watch::Receiver<String>,
}

impl SessionObserver {
    /// Latest persona selection, never stale
    pub fn persona_id(&self) -> String {
        self.persona_rx.borrow().clone()
    }

    /// Wait for the next persona change, `None` once the session is gone
    pub async fn persona_changed(&mut self) -> Option<String> {
        self.persona_rx.changed().await.ok()?;
        Some(self.persona_rx.borrow_and_update().clone())
    }

    /// Wait for the next event, skipping over any dropped while lagging.
    /// Returns `None` once the session is gone.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        loop {
            match self.events_rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("Session observer lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next already-queued event without waiting
    pub fn try_recv(&mut self) -> Option<SessionEvent> {
        loop {
            match self.events_rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }

    /// Drain every queued event
    pub fn drain(&mut self) -> Vec<SessionEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}
