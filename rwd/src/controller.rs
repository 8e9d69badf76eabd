//! Controller - maps operator keys onto registry operations
//!
//! | key   | command                      |
//! |-------|------------------------------|
//! | `r`   | spawn a reader               |
//! | `w`   | spawn a writer               |
//! | `x`   | release the oldest reader    |
//! | `q`   | release the oldest writer    |
//! | other | exit or ignore, per policy   |

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::participant::{Kind, ParticipantError, ParticipantHandle};
use crate::registry::{ParticipantRegistry, ShutdownReport};

/// What to do with a key that maps to no command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidKeyPolicy {
    /// Leave the demo
    #[default]
    Exit,
    /// Report the key and keep going
    Ignore,
}

/// An operator command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Spawn(Kind),
    Release(Kind),
    Other(char),
}

impl Command {
    pub fn from_key(key: char) -> Self {
        match key {
            'r' => Self::Spawn(Kind::Reader),
            'w' => Self::Spawn(Kind::Writer),
            'x' => Self::Release(Kind::Reader),
            'q' => Self::Release(Kind::Writer),
            other => Self::Other(other),
        }
    }

    /// The key bound to this command
    pub fn key(self) -> char {
        match self {
            Self::Spawn(Kind::Reader) => 'r',
            Self::Spawn(Kind::Writer) => 'w',
            Self::Release(Kind::Reader) => 'x',
            Self::Release(Kind::Writer) => 'q',
            Self::Other(c) => c,
        }
    }
}

/// Result of handling one command
#[derive(Debug, Clone)]
pub enum Outcome {
    Spawned(ParticipantHandle),
    Released(Kind),
    NothingToRelease(Kind),
    Ignored(char),
    Exit,
}

/// Drives a [`ParticipantRegistry`] from operator commands
pub struct Controller {
    registry: ParticipantRegistry,
    invalid_key: InvalidKeyPolicy,
}

impl Controller {
    pub fn new(registry: ParticipantRegistry, invalid_key: InvalidKeyPolicy) -> Self {
        debug!(?invalid_key, "Controller::new: called");
        Self { registry, invalid_key }
    }

    pub fn invalid_key_policy(&self) -> InvalidKeyPolicy {
        self.invalid_key
    }

    pub fn registry(&self) -> &ParticipantRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ParticipantRegistry {
        &mut self.registry
    }

    pub fn handle_key(&mut self, key: char) -> Result<Outcome, ParticipantError> {
        self.handle(Command::from_key(key))
    }

    pub fn handle(&mut self, command: Command) -> Result<Outcome, ParticipantError> {
        debug!(?command, "Controller::handle: called");
        let outcome = match command {
            Command::Spawn(kind) => Outcome::Spawned(self.registry.spawn(kind)?),
            Command::Release(kind) => {
                if self.registry.release_oldest(kind)? {
                    Outcome::Released(kind)
                } else {
                    Outcome::NothingToRelease(kind)
                }
            }
            Command::Other(key) => match self.invalid_key {
                InvalidKeyPolicy::Exit => {
                    info!(?key, "Unmapped key, exiting");
                    Outcome::Exit
                }
                InvalidKeyPolicy::Ignore => Outcome::Ignored(key),
            },
        };
        Ok(outcome)
    }

    /// Release every live participant and wait for their tasks
    pub async fn shutdown(self, timeout: Duration) -> ShutdownReport {
        self.registry.shutdown(timeout).await
    }
}
