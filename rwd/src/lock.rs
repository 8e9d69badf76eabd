//! Shared reader-writer lock
//!
//! A thin wrapper over `tokio::sync::RwLock<()>` that hands out owned guards in
//! either mode. The lock carries no data; it exists only to be contended for.
//!
//! The wrapper also keeps a census of current holders so the front-ends can
//! show the lock state. The census is bumped after a grant and dropped before
//! the underlying guard is released, so it never over-reports holders.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use tracing::{debug, trace};

/// Mode in which a participant acquires the lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockMode {
    /// Any number of shared holders may coexist (S)
    Shared,
    /// Requires the lock to be completely free (X)
    Exclusive,
}

impl LockMode {
    /// Single-letter symbol used in the TUI
    pub fn symbol(self) -> char {
        match self {
            Self::Shared => 'S',
            Self::Exclusive => 'X',
        }
    }
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shared => write!(f, "shared"),
            Self::Exclusive => write!(f, "exclusive"),
        }
    }
}

/// Observable state of the lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockState {
    #[default]
    Free,
    /// Held in shared mode by this many holders
    Shared(usize),
    Exclusive,
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Shared(n) => write!(f, "shared ({} holder{})", n, if *n == 1 { "" } else { "s" }),
            Self::Exclusive => write!(f, "exclusive"),
        }
    }
}

#[derive(Debug, Default)]
struct Census {
    shared: usize,
    exclusive: bool,
}

impl Census {
    fn enter(&mut self, mode: LockMode) {
        match mode {
            LockMode::Shared => {
                debug_assert!(!self.exclusive, "shared grant while exclusively held");
                self.shared += 1;
            }
            LockMode::Exclusive => {
                debug_assert!(
                    !self.exclusive && self.shared == 0,
                    "exclusive grant while lock is held"
                );
                self.exclusive = true;
            }
        }
    }

    fn leave(&mut self, mode: LockMode) {
        match mode {
            LockMode::Shared => self.shared = self.shared.saturating_sub(1),
            LockMode::Exclusive => self.exclusive = false,
        }
    }

    fn state(&self) -> LockState {
        if self.exclusive {
            LockState::Exclusive
        } else if self.shared > 0 {
            LockState::Shared(self.shared)
        } else {
            LockState::Free
        }
    }
}

fn with_census<R>(census: &Mutex<Census>, f: impl FnOnce(&mut Census) -> R) -> R {
    let mut guard = census.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard)
}

/// The process-wide reader-writer lock
///
/// Cloning is cheap and every clone refers to the same lock.
#[derive(Clone, Default)]
pub struct SharedLock {
    inner: Arc<RwLock<()>>,
    census: Arc<Mutex<Census>>,
}

impl SharedLock {
    pub fn new() -> Self {
        debug!("SharedLock::new: called");
        Self::default()
    }

    /// Acquire the lock in the given mode, suspending the calling task until granted
    pub async fn acquire(&self, mode: LockMode) -> LockGuard {
        trace!(%mode, "SharedLock::acquire: called");
        let held = match mode {
            LockMode::Shared => Held::Shared(self.inner.clone().read_owned().await),
            LockMode::Exclusive => Held::Exclusive(self.inner.clone().write_owned().await),
        };
        Self::grant(&self.census, mode, held)
    }

    /// Acquire the lock only if it is immediately available
    pub fn try_acquire(&self, mode: LockMode) -> Option<LockGuard> {
        trace!(%mode, "SharedLock::try_acquire: called");
        let held = match mode {
            LockMode::Shared => Held::Shared(self.inner.clone().try_read_owned().ok()?),
            LockMode::Exclusive => Held::Exclusive(self.inner.clone().try_write_owned().ok()?),
        };
        Some(Self::grant(&self.census, mode, held))
    }

    /// Current holders as recorded by the census
    pub fn state(&self) -> LockState {
        with_census(&self.census, |census| census.state())
    }

    fn grant(census: &Arc<Mutex<Census>>, mode: LockMode, held: Held) -> LockGuard {
        with_census(census, |c| c.enter(mode));
        LockGuard {
            mode,
            census: census.clone(),
            _held: held,
        }
    }
}

impl fmt::Debug for SharedLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedLock").field("state", &self.state()).finish()
    }
}

#[derive(Debug)]
#[allow(dead_code)]
enum Held {
    Shared(OwnedRwLockReadGuard<()>),
    Exclusive(OwnedRwLockWriteGuard<()>),
}

/// A granted acquisition; dropping it releases the lock
#[derive(Debug)]
pub struct LockGuard {
    mode: LockMode,
    census: Arc<Mutex<Census>>,
    // Released after Drop::drop has updated the census
    _held: Held,
}

impl LockGuard {
    pub fn mode(&self) -> LockMode {
        self.mode
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        trace!(mode = %self.mode, "LockGuard::drop: releasing");
        with_census(&self.census, |c| c.leave(self.mode));
    }
}
