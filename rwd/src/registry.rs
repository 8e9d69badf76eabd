//! ParticipantRegistry - owns the live participants of each kind
//!
//! Participants are kept in one container per kind, keyed by id. Ids increase
//! monotonically per kind, so key order is creation order and the first entry
//! is always the oldest live participant.
//!
//! The registry is driven by a single control task and needs no locking of
//! its own. Task handles of released participants are retained so that
//! [`ParticipantRegistry::shutdown`] can wait for them.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::events::EventBus;
use crate::lock::{LockState, SharedLock};
use crate::participant::{Kind, Participant, ParticipantError, ParticipantHandle, ParticipantId};

/// Outcome of a registry shutdown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Live participants released by the shutdown itself
    pub released: usize,
    /// Tasks that ran to completion
    pub completed: usize,
    /// Tasks aborted after the timeout
    pub aborted: usize,
}

struct Exiting {
    kind: Kind,
    id: ParticipantId,
    task: JoinHandle<()>,
}

/// Live readers and writers, oldest first
pub struct ParticipantRegistry {
    lock: SharedLock,
    events: Arc<EventBus>,
    readers: BTreeMap<ParticipantId, Participant>,
    writers: BTreeMap<ParticipantId, Participant>,
    next_reader_id: ParticipantId,
    next_writer_id: ParticipantId,
    exiting: Vec<Exiting>,
}

impl ParticipantRegistry {
    pub fn new(lock: SharedLock, events: Arc<EventBus>) -> Self {
        debug!("ParticipantRegistry::new: called");
        Self {
            lock,
            events,
            readers: BTreeMap::new(),
            writers: BTreeMap::new(),
            next_reader_id: 0,
            next_writer_id: 0,
            exiting: Vec::new(),
        }
    }

    fn live_map(&self, kind: Kind) -> &BTreeMap<ParticipantId, Participant> {
        match kind {
            Kind::Reader => &self.readers,
            Kind::Writer => &self.writers,
        }
    }

    fn live_map_mut(&mut self, kind: Kind) -> &mut BTreeMap<ParticipantId, Participant> {
        match kind {
            Kind::Reader => &mut self.readers,
            Kind::Writer => &mut self.writers,
        }
    }

    fn allocate_id(&mut self, kind: Kind) -> ParticipantId {
        let counter = match kind {
            Kind::Reader => &mut self.next_reader_id,
            Kind::Writer => &mut self.next_writer_id,
        };
        let id = *counter;
        *counter += 1;
        id
    }

    /// Create, start and register a new participant of `kind`
    pub fn spawn(&mut self, kind: Kind) -> Result<ParticipantHandle, ParticipantError> {
        let id = self.allocate_id(kind);
        debug!(%kind, id, "ParticipantRegistry::spawn: called");

        let mut participant = Participant::new(kind, id, self.lock.clone(), &self.events);
        participant.begin()?;
        let handle = participant.handle();
        self.live_map_mut(kind).insert(id, participant);

        debug!(%kind, id, live = self.live_count(kind), "ParticipantRegistry::spawn: registered");
        Ok(handle)
    }

    /// Release the oldest live participant of `kind`
    ///
    /// Returns `Ok(false)` when there is nothing of that kind to release.
    pub fn release_oldest(&mut self, kind: Kind) -> Result<bool, ParticipantError> {
        debug!(%kind, "ParticipantRegistry::release_oldest: called");
        let Some((id, mut participant)) = self.live_map_mut(kind).pop_first() else {
            debug!(%kind, "ParticipantRegistry::release_oldest: nothing to release");
            return Ok(false);
        };

        participant.release()?;
        if let Some(task) = participant.take_task() {
            self.exiting.push(Exiting { kind, id, task });
        }
        Ok(true)
    }

    /// Handles of the live participants of `kind`, oldest first
    pub fn live(&self, kind: Kind) -> Vec<ParticipantHandle> {
        self.live_map(kind).values().map(Participant::handle).collect()
    }

    pub fn live_count(&self, kind: Kind) -> usize {
        self.live_map(kind).len()
    }

    /// Released participants whose tasks have not been reaped yet
    pub fn exiting_count(&self) -> usize {
        self.exiting.len()
    }

    pub fn lock_state(&self) -> LockState {
        self.lock.state()
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Drop handles of released tasks that have finished; returns how many
    pub fn reap(&mut self) -> usize {
        let before = self.exiting.len();
        self.exiting.retain(|e| !e.task.is_finished());
        let reaped = before - self.exiting.len();
        if reaped > 0 {
            debug!(reaped, remaining = self.exiting.len(), "ParticipantRegistry::reap: reaped tasks");
        }
        reaped
    }

    /// Release everything still live and wait for every task to finish
    ///
    /// Readers are released before writers, oldest first. Tasks still running
    /// when `timeout` expires are aborted.
    pub async fn shutdown(mut self, timeout: Duration) -> ShutdownReport {
        info!(
            readers = self.readers.len(),
            writers = self.writers.len(),
            exiting = self.exiting.len(),
            "Shutting down participant registry"
        );
        let mut report = ShutdownReport::default();

        for kind in Kind::ALL {
            loop {
                match self.release_oldest(kind) {
                    Ok(true) => report.released += 1,
                    Ok(false) => break,
                    Err(e) => warn!(error = %e, "shutdown: release failed"),
                }
            }
        }

        let deadline = tokio::time::Instant::now() + timeout;
        for mut exiting in std::mem::take(&mut self.exiting) {
            match tokio::time::timeout_at(deadline, &mut exiting.task).await {
                Ok(Ok(())) => report.completed += 1,
                Ok(Err(e)) => {
                    warn!(kind = %exiting.kind, id = exiting.id, error = %e, "shutdown: participant task failed");
                }
                Err(_) => {
                    warn!(kind = %exiting.kind, id = exiting.id, "shutdown: aborting participant task after timeout");
                    exiting.task.abort();
                    report.aborted += 1;
                }
            }
        }

        info!(?report, "Participant registry shut down");
        report
    }
}
