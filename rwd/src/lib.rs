//! rwdemo - interactive reader-writer lock demonstration
//!
//! An operator spawns readers and writers on demand. Each one is an
//! independent task that contends for a single shared lock: readers take it
//! in shared mode (S), writers in exclusive mode (X). Every participant
//! announces when it starts waiting, when it holds the lock and when it is
//! leaving, so the classic reader-writer guarantees can be watched live.
//!
//! # Core Concepts
//!
//! - **One lock**: many readers together, or one writer alone
//! - **Hold until told**: a participant keeps the lock until released
//! - **Oldest first**: release commands always target the oldest live one
//! - **Visible protocol**: every transition is published on an event bus
//!
//! # Modules
//!
//! - [`lock`] - The shared/exclusive lock and its holder census
//! - [`participant`] - Reader/writer lifecycle and task
//! - [`registry`] - Live participants per kind, oldest first
//! - [`controller`] - Key to command mapping
//! - [`events`] - Event bus and JSONL event log
//! - [`tui`] - Interactive dashboard
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod banner;
pub mod cli;
pub mod config;
pub mod controller;
pub mod events;
pub mod lock;
pub mod participant;
pub mod registry;
pub mod tui;

// Re-export commonly used types
pub use config::Config;
pub use controller::{Command, Controller, InvalidKeyPolicy, Outcome};
pub use events::{EventBus, LockEvent};
pub use lock::{LockGuard, LockMode, LockState, SharedLock};
pub use participant::{Kind, Participant, ParticipantError, ParticipantHandle, ParticipantId, ParticipantState};
pub use registry::{ParticipantRegistry, ShutdownReport};
