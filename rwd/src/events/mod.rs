//! Participant event stream
//!
//! Every participant task reports its progress through the lock protocol on
//! a broadcast bus. The TUI, the script printer and the optional JSONL event
//! logger all subscribe to it.
//!
//! ```text
//!   Reader 0 task        Writer 0 task        Reader 1 task
//!        │                     │                    │
//!        └──── WaitingForLock / Holding / Exiting ──┘
//!                              ↓
//!                  EventBus (tokio broadcast)
//!                  ↓           ↓            ↓
//!                 TUI    script printer   EventLogger (.jsonl)
//! ```

mod bus;
mod logger;
mod types;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventEmitter, create_event_bus};
pub use logger::{EventLogger, read_event_log, spawn_event_logger};
pub use types::{EventLogEntry, LockEvent};
