//! TUI application state
//!
//! Pure data structures for the TUI. No rendering logic here.

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use tracing::debug;

use crate::banner;
use crate::controller::InvalidKeyPolicy;
use crate::events::LockEvent;
use crate::lock::LockState;
use crate::participant::{Kind, ParticipantHandle, ParticipantId, ParticipantState};

/// Oldest log lines are dropped past this many
pub const MAX_LOG_LINES: usize = 500;

/// How a log line should be colored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStyle {
    Waiting,
    Holding(Kind),
    Exiting,
    Notice,
    Error,
}

/// One line of the event log panel
#[derive(Debug, Clone)]
pub struct LogLine {
    pub at: DateTime<Local>,
    pub text: String,
    pub style: LogStyle,
}

impl LogLine {
    pub fn new(text: impl Into<String>, style: LogStyle) -> Self {
        Self {
            at: Local::now(),
            text: text.into(),
            style,
        }
    }
}

impl From<LockEvent> for LogLine {
    fn from(event: LockEvent) -> Self {
        let style = match event {
            LockEvent::WaitingForLock { .. } => LogStyle::Waiting,
            LockEvent::Holding { kind, .. } => LogStyle::Holding(kind),
            LockEvent::Exiting { .. } => LogStyle::Exiting,
        };
        Self::new(event.to_string(), style)
    }
}

/// Snapshot of one live participant for the lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticipantRow {
    pub kind: Kind,
    pub id: ParticipantId,
    pub state: ParticipantState,
}

impl From<&ParticipantHandle> for ParticipantRow {
    fn from(handle: &ParticipantHandle) -> Self {
        Self {
            kind: handle.kind(),
            id: handle.id(),
            state: handle.state(),
        }
    }
}

/// Everything the views need to draw a frame
#[derive(Debug)]
pub struct AppState {
    pub log: VecDeque<LogLine>,
    pub readers: Vec<ParticipantRow>,
    pub writers: Vec<ParticipantRow>,
    pub lock_state: LockState,
    /// Released participants whose tasks are still unwinding
    pub exiting: usize,
    /// Transient message shown in the footer until the next key
    pub status: Option<String>,
    pub key_help: Vec<String>,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(policy: InvalidKeyPolicy) -> Self {
        debug!(?policy, "AppState::new: called");
        Self {
            log: VecDeque::new(),
            readers: Vec::new(),
            writers: Vec::new(),
            lock_state: LockState::Free,
            exiting: 0,
            status: None,
            key_help: banner::key_help(policy),
            should_quit: false,
        }
    }

    pub fn push_log(&mut self, line: LogLine) {
        if self.log.len() == MAX_LOG_LINES {
            self.log.pop_front();
        }
        self.log.push_back(line);
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    pub fn holding_count(&self) -> usize {
        self.readers
            .iter()
            .chain(self.writers.iter())
            .filter(|row| row.state == ParticipantState::HoldingLock)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_is_bounded() {
        let mut state = AppState::new(InvalidKeyPolicy::Exit);
        for i in 0..MAX_LOG_LINES + 10 {
            state.push_log(LogLine::new(format!("line {i}"), LogStyle::Notice));
        }
        assert_eq!(state.log.len(), MAX_LOG_LINES);
        assert_eq!(state.log.front().map(|l| l.text.as_str()), Some("line 10"));
    }

    #[test]
    fn test_log_line_from_event() {
        let line = LogLine::from(LockEvent::Holding {
            kind: Kind::Writer,
            id: 1,
        });
        assert_eq!(line.text, "Writer 1 is writing...");
        assert_eq!(line.style, LogStyle::Holding(Kind::Writer));
    }

    #[test]
    fn test_status_round_trip() {
        let mut state = AppState::new(InvalidKeyPolicy::Ignore);
        state.set_status("No reader to release");
        assert_eq!(state.status.as_deref(), Some("No reader to release"));
        state.clear_status();
        assert!(state.status.is_none());
        assert!(state.key_help.last().unwrap().contains("ignored"));
    }
}
