//! TUI Runner - main loop that owns the terminal
//!
//! Waits on terminal input and participant events at the same time, feeds
//! both into the App and redraws after each.

use std::time::Duration;

use eyre::Result;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::Tui;
use super::app::App;
use super::events::{Event, EventHandler};
use super::views;
use crate::controller::Controller;
use crate::events::LockEvent;

/// TUI Runner that manages the terminal and event loop
pub struct TuiRunner {
    app: App,
    terminal: Tui,
    event_handler: EventHandler,
    lock_events: broadcast::Receiver<LockEvent>,
}

impl TuiRunner {
    pub fn new(terminal: Tui, controller: Controller, tick_rate: Duration) -> Self {
        debug!(?tick_rate, "TuiRunner::new: called");
        let lock_events = controller.registry().events().subscribe();
        Self {
            app: App::new(controller),
            terminal,
            event_handler: EventHandler::new(tick_rate),
            lock_events,
        }
    }

    /// Run until the operator quits; hands the controller back for shutdown
    pub async fn run(mut self) -> Result<Controller> {
        info!("TUI started");
        loop {
            self.terminal.draw(|frame| views::render(self.app.state(), frame))?;

            tokio::select! {
                event = self.event_handler.next() => {
                    match event? {
                        Event::Tick => self.app.refresh(),
                        Event::Key(key) => {
                            if self.app.handle_key(key) {
                                break;
                            }
                        }
                        Event::Resize(width, height) => {
                            debug!(width, height, "TuiRunner::run: resize");
                        }
                    }
                }
                received = self.lock_events.recv() => {
                    match received {
                        Ok(event) => self.app.on_lock_event(event),
                        Err(broadcast::error::RecvError::Lagged(missed)) => self.app.on_lagged(missed),
                        Err(broadcast::error::RecvError::Closed) => {
                            warn!("TuiRunner::run: event bus closed");
                            break;
                        }
                    }
                }
            }

            if self.app.state().should_quit {
                break;
            }
        }

        info!("TUI exiting");
        Ok(self.app.into_controller())
    }
}
