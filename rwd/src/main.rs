//! rwdemo - reader-writer lock demonstration
//!
//! CLI entry point: the interactive TUI by default, plus a non-interactive
//! script mode that replays a string of keys.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use rwdemo::banner;
use rwdemo::cli::{Cli, Command};
use rwdemo::config::Config;
use rwdemo::controller::{Controller, InvalidKeyPolicy, Outcome};
use rwdemo::events::{LockEvent, create_event_bus, spawn_event_logger};
use rwdemo::lock::SharedLock;
use rwdemo::participant::Kind;
use rwdemo::registry::{ParticipantRegistry, ShutdownReport};
use rwdemo::tui;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rwdemo")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("rwdemo.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(?config, "rwdemo loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Script {
            keys,
            settle_ms,
            ignore_invalid,
        }) => {
            debug!(%keys, ?settle_ms, ignore_invalid, "main: matched Script command");
            let policy = if ignore_invalid {
                InvalidKeyPolicy::Ignore
            } else {
                config.invalid_key
            };
            let settle = settle_ms.map(Duration::from_millis).unwrap_or_else(|| config.settle());
            cmd_script(&config, policy, &keys, settle).await
        }
        Some(Command::Banner) => {
            debug!("main: matched Banner command");
            cmd_banner(&config)
        }
        None => {
            debug!("main: no command specified, launching TUI");
            cmd_tui(&config).await
        }
    }
}

/// Wire the lock, event bus, optional event log and controller together
fn build_demo(config: &Config, policy: InvalidKeyPolicy) -> (Controller, Option<JoinHandle<()>>) {
    debug!(?policy, "build_demo: called");
    let events = create_event_bus(config.event_capacity);

    let logger = config.event_log.as_ref().map(|path| {
        info!(path = %path.display(), "Writing participant events to log");
        spawn_event_logger(events.subscribe(), path)
    });

    let registry = ParticipantRegistry::new(SharedLock::new(), events);
    (Controller::new(registry, policy), logger)
}

/// Shut the controller down and let the event log drain
async fn finish(controller: Controller, logger: Option<JoinHandle<()>>, config: &Config) -> ShutdownReport {
    let report = controller.shutdown(config.shutdown_timeout()).await;
    if let Some(logger) = logger {
        // The logger stops once the last emitter is gone
        if tokio::time::timeout(config.shutdown_timeout(), logger).await.is_err() {
            warn!("finish: event logger did not stop in time");
        }
    }
    report
}

/// Launch the interactive dashboard
async fn cmd_tui(config: &Config) -> Result<()> {
    debug!("cmd_tui: called");
    let (controller, logger) = build_demo(config, config.invalid_key);

    let controller = tui::run(controller, config.tick_rate()).await?;
    let report = finish(controller, logger, config).await;

    println!(
        "rwdemo exited: {} released on exit, {} finished, {} aborted",
        report.released, report.completed, report.aborted
    );
    Ok(())
}

/// Replay `keys` against a fresh demo and print every event
async fn cmd_script(config: &Config, policy: InvalidKeyPolicy, keys: &str, settle: Duration) -> Result<()> {
    debug!(%keys, ?policy, ?settle, "cmd_script: called");
    let (mut controller, logger) = build_demo(config, policy);
    let printer = spawn_printer(controller.registry().events().subscribe());

    for key in keys.chars().filter(|c| !c.is_whitespace()) {
        match controller.handle_key(key) {
            Ok(Outcome::Spawned(handle)) => {
                debug!(kind = %handle.kind(), id = handle.id(), "cmd_script: spawned");
            }
            Ok(Outcome::Released(kind)) => debug!(%kind, "cmd_script: released"),
            Ok(Outcome::NothingToRelease(kind)) => {
                let noun = match kind {
                    Kind::Reader => "reader",
                    Kind::Writer => "writer",
                };
                println!("{}", format!("no live {} to release", noun).dimmed());
            }
            Ok(Outcome::Ignored(c)) => println!("{}", format!("invalid key pressed: {:?}", c).dimmed()),
            Ok(Outcome::Exit) => {
                println!("{}", format!("key {:?} exits", key).dimmed());
                break;
            }
            Err(e) => eprintln!("{} {}", "error:".red(), e),
        }
        tokio::time::sleep(settle).await;
    }

    let report = finish(controller, logger, config).await;
    if tokio::time::timeout(config.shutdown_timeout(), printer).await.is_err() {
        warn!("cmd_script: printer did not stop in time");
    }

    println!(
        "{} {} released on exit, {} finished, {} aborted",
        "done:".bold(),
        report.released,
        report.completed,
        report.aborted
    );
    Ok(())
}

fn paint(event: &LockEvent) -> String {
    let text = event.to_string();
    match event {
        LockEvent::WaitingForLock { .. } => text.dimmed().to_string(),
        LockEvent::Holding { kind: Kind::Reader, .. } => text.green().to_string(),
        LockEvent::Holding { kind: Kind::Writer, .. } => text.yellow().to_string(),
        LockEvent::Exiting { .. } => text.cyan().to_string(),
    }
}

/// Print events as they arrive until the bus closes
fn spawn_printer(mut rx: broadcast::Receiver<LockEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => println!("{}", paint(&event)),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    println!("{}", format!("... {} events not shown", missed).dimmed());
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Print the instruction banner
fn cmd_banner(config: &Config) -> Result<()> {
    debug!("cmd_banner: called");
    for (i, line) in banner::banner(config.invalid_key).into_iter().enumerate() {
        if i == 0 {
            println!("{}", line.bold());
        } else {
            println!("{}", line);
        }
    }
    Ok(())
}
