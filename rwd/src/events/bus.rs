//! Event Bus - pub/sub channel for participant events
//!
//! Participant tasks emit, front-ends and the event logger subscribe. Backed by
//! a tokio broadcast channel so each subscriber sees every event in emission
//! order.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use super::types::LockEvent;
use crate::participant::{Kind, ParticipantId};

/// Default channel capacity (events)
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Central event bus for participant activity
pub struct EventBus {
    tx: broadcast::Sender<LockEvent>,
}

impl EventBus {
    /// Create a new event bus with the given capacity
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "EventBus::new: creating event bus");
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Create a new event bus with default capacity
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Emit an event to all subscribers
    ///
    /// Fire-and-forget: with no subscribers the event is dropped.
    pub fn emit(&self, event: LockEvent) {
        debug!(event_type = event.event_type(), kind = %event.kind(), id = event.id(), "EventBus::emit");
        let _ = self.tx.send(event);
    }

    /// Subscribe to events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<LockEvent> {
        debug!("EventBus::subscribe: new subscriber");
        self.tx.subscribe()
    }

    /// Create an emitter bound to one participant
    pub fn emitter_for(&self, kind: Kind, id: ParticipantId) -> EventEmitter {
        debug!(%kind, id, "EventBus::emitter_for: creating emitter");
        EventEmitter {
            tx: self.tx.clone(),
            kind,
            id,
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Handle for a participant task to emit its own events
///
/// Keeps the channel open for as long as the task holds it.
#[derive(Clone)]
pub struct EventEmitter {
    tx: broadcast::Sender<LockEvent>,
    kind: Kind,
    id: ParticipantId,
}

impl EventEmitter {
    fn emit(&self, event: LockEvent) {
        debug!(event_type = event.event_type(), kind = %self.kind, id = self.id, "EventEmitter::emit");
        let _ = self.tx.send(event);
    }

    pub fn waiting_for_lock(&self) {
        self.emit(LockEvent::WaitingForLock {
            kind: self.kind,
            id: self.id,
        });
    }

    pub fn holding(&self) {
        self.emit(LockEvent::Holding {
            kind: self.kind,
            id: self.id,
        });
    }

    pub fn exiting(&self) {
        self.emit(LockEvent::Exiting {
            kind: self.kind,
            id: self.id,
        });
    }
}

/// Create an event bus wrapped in an Arc for shared ownership
pub fn create_event_bus(capacity: usize) -> Arc<EventBus> {
    Arc::new(EventBus::new(capacity))
}
