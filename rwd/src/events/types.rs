//! Event types for participant activity
//!
//! Each participant emits exactly three events over its life, in order:
//! `WaitingForLock`, `Holding`, `Exiting`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::participant::{Kind, ParticipantId};

/// Lifecycle notifications published by participant tasks
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LockEvent {
    /// The participant has started and is blocked acquiring the lock
    WaitingForLock { kind: Kind, id: ParticipantId },
    /// The lock was granted; the participant holds it until released
    Holding { kind: Kind, id: ParticipantId },
    /// The participant was released and is about to drop the lock
    Exiting { kind: Kind, id: ParticipantId },
}

impl LockEvent {
    pub fn kind(&self) -> Kind {
        match self {
            Self::WaitingForLock { kind, .. } | Self::Holding { kind, .. } | Self::Exiting { kind, .. } => *kind,
        }
    }

    pub fn id(&self) -> ParticipantId {
        match self {
            Self::WaitingForLock { id, .. } | Self::Holding { id, .. } | Self::Exiting { id, .. } => *id,
        }
    }

    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::WaitingForLock { .. } => "WaitingForLock",
            Self::Holding { .. } => "Holding",
            Self::Exiting { .. } => "Exiting",
        }
    }
}

impl fmt::Display for LockEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WaitingForLock { kind, id } => write!(f, "{} {} is waiting for lock...", kind.label(), id),
            Self::Holding { kind, id } => write!(f, "{} {} is {}...", kind.label(), id, kind.action()),
            Self::Exiting { kind, id } => write!(f, "{} {} is exiting...", kind.label(), id),
        }
    }
}

/// A timestamped event log entry for file persistence
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventLogEntry {
    /// Timestamp of the event
    #[serde(rename = "ts")]
    pub timestamp: DateTime<Utc>,
    /// The event
    pub event: LockEvent,
}

impl EventLogEntry {
    /// Create a new log entry with current timestamp
    pub fn new(event: LockEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_lines_match_demo_wording() {
        let waiting = LockEvent::WaitingForLock {
            kind: Kind::Reader,
            id: 2,
        };
        let writing = LockEvent::Holding {
            kind: Kind::Writer,
            id: 0,
        };
        let reading = LockEvent::Holding {
            kind: Kind::Reader,
            id: 5,
        };
        let exiting = LockEvent::Exiting {
            kind: Kind::Reader,
            id: 1,
        };

        assert_eq!(waiting.to_string(), "Reader 2 is waiting for lock...");
        assert_eq!(writing.to_string(), "Writer 0 is writing...");
        assert_eq!(reading.to_string(), "Reader 5 is reading...");
        assert_eq!(exiting.to_string(), "Reader 1 is exiting...");
    }

    #[test]
    fn test_event_accessors() {
        let event = LockEvent::Exiting {
            kind: Kind::Writer,
            id: 7,
        };
        assert_eq!(event.kind(), Kind::Writer);
        assert_eq!(event.id(), 7);
        assert_eq!(event.event_type(), "Exiting");
    }

    #[test]
    fn test_event_serialization() {
        let event = LockEvent::Holding {
            kind: Kind::Writer,
            id: 3,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"Holding\""));
        assert!(json.contains("Writer"));

        let parsed: LockEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_event_log_entry() {
        let entry = EventLogEntry::new(LockEvent::WaitingForLock {
            kind: Kind::Reader,
            id: 0,
        });
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"ts\""));
        assert!(json.contains("WaitingForLock"));
    }
}
