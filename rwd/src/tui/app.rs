//! TUI application - key handling and state updates
//!
//! The App owns the Controller and the AppState. It never renders; that is
//! left to the views module.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{debug, warn};

use super::state::{AppState, LogLine, LogStyle, ParticipantRow};
use crate::controller::{Controller, Outcome};
use crate::events::LockEvent;
use crate::participant::Kind;

/// TUI application
pub struct App {
    state: AppState,
    controller: Controller,
}

impl App {
    pub fn new(controller: Controller) -> Self {
        debug!("App::new: called");
        let mut app = Self {
            state: AppState::new(controller.invalid_key_policy()),
            controller,
        };
        app.refresh();
        app
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Give the controller back for shutdown
    pub fn into_controller(self) -> Controller {
        self.controller
    }

    /// Handle a key event
    ///
    /// Returns true if the application should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        debug!(?key, "App::handle_key: called");
        if key.kind != KeyEventKind::Press {
            return false;
        }
        self.state.clear_status();

        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
                debug!("App::handle_key: Ctrl+C force quit");
                self.state.should_quit = true;
            }
            (KeyCode::Esc, _) => {
                self.state.should_quit = true;
            }
            (KeyCode::Char(c), _) => self.dispatch(c),
            (code, _) => {
                self.state.set_status(format!("Unmapped key: {:?}", code));
            }
        }

        self.refresh();
        self.state.should_quit
    }

    fn dispatch(&mut self, key: char) {
        match self.controller.handle_key(key) {
            Ok(Outcome::Spawned(handle)) => {
                debug!(kind = %handle.kind(), id = handle.id(), "App::dispatch: spawned");
            }
            Ok(Outcome::Released(kind)) => {
                debug!(%kind, "App::dispatch: released oldest");
            }
            Ok(Outcome::NothingToRelease(kind)) => {
                let noun = match kind {
                    Kind::Reader => "reader",
                    Kind::Writer => "writer",
                };
                self.state.set_status(format!("No live {} to release", noun));
            }
            Ok(Outcome::Ignored(c)) => {
                self.state.set_status(format!("Invalid key pressed: {:?}", c));
            }
            Ok(Outcome::Exit) => {
                self.state.should_quit = true;
            }
            Err(e) => {
                warn!(error = %e, "App::dispatch: controller rejected command");
                self.state.push_log(LogLine::new(e.to_string(), LogStyle::Error));
            }
        }
    }

    pub fn on_lock_event(&mut self, event: LockEvent) {
        self.state.push_log(LogLine::from(event));
        self.refresh();
    }

    /// The bus dropped events because the UI fell behind
    pub fn on_lagged(&mut self, missed: u64) {
        warn!(missed, "App::on_lagged: event stream lagged");
        self.state
            .push_log(LogLine::new(format!("... {} events not shown", missed), LogStyle::Notice));
    }

    /// Re-read participant and lock state from the registry
    pub fn refresh(&mut self) {
        let registry = self.controller.registry_mut();
        registry.reap();
        let readers = registry.live(Kind::Reader).iter().map(ParticipantRow::from).collect();
        let writers = registry.live(Kind::Writer).iter().map(ParticipantRow::from).collect();
        self.state.readers = readers;
        self.state.writers = writers;
        self.state.lock_state = registry.lock_state();
        self.state.exiting = registry.exiting_count();
    }
}
