//! Participant - one reader or writer contending for the shared lock
//!
//! A participant is a tokio task with a two-phase lifecycle:
//!
//! ```text
//! NotStarted ──begin()──▶ Started ──lock granted──▶ HoldingLock
//!                                                        │
//!                          release() signal observed ◀───┘
//!                                   │
//!                        ReleasedPendingExit ──lock dropped──▶ Done
//! ```
//!
//! `begin` spawns the task and returns at once. The task announces itself,
//! blocks on the lock in its kind's mode, announces the hold, then parks on a
//! private release signal. `release` flips that signal and returns without
//! waiting; the task announces its exit and drops the lock.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::events::{EventBus, EventEmitter};
use crate::lock::{LockMode, SharedLock};

/// Sequence number, unique and increasing within a kind
pub type ParticipantId = u64;

/// Reader or writer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Kind {
    Reader,
    Writer,
}

impl Kind {
    pub const ALL: [Kind; 2] = [Kind::Reader, Kind::Writer];

    /// Name used when reporting
    pub fn label(self) -> &'static str {
        match self {
            Self::Reader => "Reader",
            Self::Writer => "Writer",
        }
    }

    /// What the participant is doing while it holds the lock
    pub fn action(self) -> &'static str {
        match self {
            Self::Reader => "reading",
            Self::Writer => "writing",
        }
    }

    pub fn lock_mode(self) -> LockMode {
        match self {
            Self::Reader => LockMode::Shared,
            Self::Writer => LockMode::Exclusive,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle state; transitions only move forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParticipantState {
    NotStarted,
    /// Task spawned, waiting for the lock
    Started,
    HoldingLock,
    /// Release observed, lock about to be dropped
    ReleasedPendingExit,
    Done,
}

impl fmt::Display for ParticipantState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotStarted => "not started",
            Self::Started => "waiting",
            Self::HoldingLock => "holding",
            Self::ReleasedPendingExit => "exiting",
            Self::Done => "done",
        };
        f.write_str(s)
    }
}

/// Misuse of the participant lifecycle by its controller
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantError {
    #[error("duplicate call to begin() on {kind} {id} is not allowed")]
    DuplicateStart { kind: Kind, id: ParticipantId },

    #[error("duplicate call to release() on {kind} {id} is not allowed")]
    DuplicateRelease { kind: Kind, id: ParticipantId },

    #[error("release() called on {kind} {id} before begin()")]
    NotStarted { kind: Kind, id: ParticipantId },
}

/// Move `state` forward to `next`; never moves backwards
fn advance(state: &watch::Sender<ParticipantState>, next: ParticipantState) {
    state.send_if_modified(|current| {
        if next > *current {
            *current = next;
            true
        } else {
            false
        }
    });
}

/// One reader or writer
///
/// Dropping a started participant without calling `release` closes its release
/// signal, which the task treats the same as a release.
pub struct Participant {
    id: ParticipantId,
    kind: Kind,
    lock: SharedLock,
    emitter: EventEmitter,
    state: Arc<watch::Sender<ParticipantState>>,
    release_tx: watch::Sender<bool>,
    started: bool,
    released: bool,
    task: Option<JoinHandle<()>>,
}

impl Participant {
    /// Create a participant in `NotStarted`; no side effects
    pub fn new(kind: Kind, id: ParticipantId, lock: SharedLock, events: &EventBus) -> Self {
        debug!(%kind, id, "Participant::new: called");
        let (state, _) = watch::channel(ParticipantState::NotStarted);
        let (release_tx, _) = watch::channel(false);
        Self {
            id,
            kind,
            lock,
            emitter: events.emitter_for(kind, id),
            state: Arc::new(state),
            release_tx,
            started: false,
            released: false,
            task: None,
        }
    }

    pub fn id(&self) -> ParticipantId {
        self.id
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn lock_mode(&self) -> LockMode {
        self.kind.lock_mode()
    }

    pub fn state(&self) -> ParticipantState {
        *self.state.borrow()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Observer for this participant's state
    pub fn handle(&self) -> ParticipantHandle {
        ParticipantHandle {
            id: self.id,
            kind: self.kind,
            state: self.state.subscribe(),
        }
    }

    /// Spawn the acquisition task
    ///
    /// Must be called from within a tokio runtime. Returns immediately.
    pub fn begin(&mut self) -> Result<(), ParticipantError> {
        debug!(kind = %self.kind, id = self.id, "Participant::begin: called");
        if self.started {
            return Err(ParticipantError::DuplicateStart {
                kind: self.kind,
                id: self.id,
            });
        }
        self.started = true;
        advance(&self.state, ParticipantState::Started);

        let task = AcquisitionTask {
            kind: self.kind,
            id: self.id,
            lock: self.lock.clone(),
            emitter: self.emitter.clone(),
            state: self.state.clone(),
            release_rx: self.release_tx.subscribe(),
        };
        self.task = Some(tokio::spawn(task.run()));
        info!(kind = %self.kind, id = self.id, "Participant started");
        Ok(())
    }

    /// Signal the task to exit once it holds the lock
    ///
    /// Does not wait for the task; use [`Participant::take_task`] for that.
    pub fn release(&mut self) -> Result<(), ParticipantError> {
        debug!(kind = %self.kind, id = self.id, "Participant::release: called");
        if !self.started {
            return Err(ParticipantError::NotStarted {
                kind: self.kind,
                id: self.id,
            });
        }
        if self.released {
            return Err(ParticipantError::DuplicateRelease {
                kind: self.kind,
                id: self.id,
            });
        }
        self.released = true;
        self.release_tx.send_replace(true);
        info!(kind = %self.kind, id = self.id, "Participant released");
        Ok(())
    }

    /// Take the task handle so the caller can await a clean exit
    pub fn take_task(&mut self) -> Option<JoinHandle<()>> {
        self.task.take()
    }
}

impl fmt::Debug for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Participant")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("state", &self.state())
            .field("released", &self.released)
            .finish()
    }
}

/// Everything the spawned task needs, moved out of the participant
struct AcquisitionTask {
    kind: Kind,
    id: ParticipantId,
    lock: SharedLock,
    emitter: EventEmitter,
    state: Arc<watch::Sender<ParticipantState>>,
    release_rx: watch::Receiver<bool>,
}

impl AcquisitionTask {
    async fn run(mut self) {
        self.emitter.waiting_for_lock();

        let guard = self.lock.acquire(self.kind.lock_mode()).await;
        advance(&self.state, ParticipantState::HoldingLock);
        self.emitter.holding();

        // wait_for re-checks the predicate on every wake
        if self.release_rx.wait_for(|released| *released).await.is_err() {
            debug!(kind = %self.kind, id = self.id, "AcquisitionTask: release signal dropped, exiting");
        }

        advance(&self.state, ParticipantState::ReleasedPendingExit);
        self.emitter.exiting();
        drop(guard);
        advance(&self.state, ParticipantState::Done);
        debug!(kind = %self.kind, id = self.id, "AcquisitionTask: done");
    }
}

/// Read-only view of a participant that does not keep it alive
#[derive(Debug, Clone)]
pub struct ParticipantHandle {
    id: ParticipantId,
    kind: Kind,
    state: watch::Receiver<ParticipantState>,
}

impl ParticipantHandle {
    pub fn id(&self) -> ParticipantId {
        self.id
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn state(&self) -> ParticipantState {
        *self.state.borrow()
    }

    /// Wait until the participant reaches `target` or a later state
    ///
    /// Returns the state reached. If the participant and its task are both gone
    /// first, returns the last state they published.
    pub async fn wait_for(&mut self, target: ParticipantState) -> ParticipantState {
        let reached = self.state.wait_for(|s| *s >= target).await.map(|s| *s);
        match reached {
            Ok(state) => state,
            Err(_) => *self.state.borrow(),
        }
    }
}
