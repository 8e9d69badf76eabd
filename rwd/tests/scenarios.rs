//! Integration tests for the reader-writer guarantees
//!
//! Each test drives a real registry and watches the event stream.

use std::sync::Arc;
use std::time::Duration;

use rwdemo::controller::{Controller, InvalidKeyPolicy, Outcome};
use rwdemo::events::{EventBus, LockEvent, read_event_log, spawn_event_logger};
use rwdemo::lock::{LockState, SharedLock};
use rwdemo::participant::{Kind, ParticipantHandle, ParticipantState};
use rwdemo::registry::ParticipantRegistry;
use tempfile::TempDir;
use tokio::sync::broadcast;

const WAIT: Duration = Duration::from_secs(5);

/// Long enough for a wrongly granted lock to show up
const SETTLE: Duration = Duration::from_millis(100);

fn registry() -> ParticipantRegistry {
    ParticipantRegistry::new(SharedLock::new(), Arc::new(EventBus::new(256)))
}

async fn reach(handle: &mut ParticipantHandle, target: ParticipantState) {
    let (kind, id) = (handle.kind(), handle.id());
    let reached = tokio::time::timeout(WAIT, handle.wait_for(target))
        .await
        .unwrap_or_else(|_| panic!("{kind} {id} never reached {target}"));
    assert!(reached >= target);
}

/// Receive events until `wanted` arrives; returns everything seen, `wanted` last
async fn recv_until(rx: &mut broadcast::Receiver<LockEvent>, wanted: LockEvent) -> Vec<LockEvent> {
    let mut seen = Vec::new();
    let result = tokio::time::timeout(WAIT, async {
        loop {
            let event = rx.recv().await.expect("event bus closed early");
            seen.push(event);
            if event == wanted {
                break;
            }
        }
    })
    .await;
    assert!(result.is_ok(), "never saw {wanted:?}, saw {seen:?}");
    seen
}

fn position(events: &[LockEvent], wanted: LockEvent) -> usize {
    events
        .iter()
        .position(|e| *e == wanted)
        .unwrap_or_else(|| panic!("{wanted:?} missing from {events:?}"))
}

// =============================================================================
// Exclusion
// =============================================================================

#[tokio::test]
async fn test_reader_blocks_writer_until_released() {
    let mut reg = registry();
    let mut rx = reg.events().subscribe();

    let mut reader = reg.spawn(Kind::Reader).unwrap();
    reach(&mut reader, ParticipantState::HoldingLock).await;

    let mut writer = reg.spawn(Kind::Writer).unwrap();
    tokio::time::sleep(SETTLE).await;
    assert_eq!(writer.state(), ParticipantState::Started);
    assert_eq!(reg.lock_state(), LockState::Shared(1));

    assert!(reg.release_oldest(Kind::Reader).unwrap());
    reach(&mut writer, ParticipantState::HoldingLock).await;

    let writer_holding = LockEvent::Holding {
        kind: Kind::Writer,
        id: 0,
    };
    let events = recv_until(&mut rx, writer_holding).await;
    let reader_exiting = LockEvent::Exiting {
        kind: Kind::Reader,
        id: 0,
    };
    assert!(position(&events, reader_exiting) < position(&events, writer_holding));

    reg.shutdown(WAIT).await;
}

#[tokio::test]
async fn test_writer_blocks_writer_until_released() {
    let mut reg = registry();
    let mut rx = reg.events().subscribe();

    let mut first = reg.spawn(Kind::Writer).unwrap();
    reach(&mut first, ParticipantState::HoldingLock).await;
    let mut second = reg.spawn(Kind::Writer).unwrap();

    tokio::time::sleep(SETTLE).await;
    assert_eq!(second.state(), ParticipantState::Started);
    assert_eq!(reg.lock_state(), LockState::Exclusive);

    assert!(reg.release_oldest(Kind::Writer).unwrap());
    reach(&mut second, ParticipantState::HoldingLock).await;
    reach(&mut first, ParticipantState::Done).await;

    let events = recv_until(
        &mut rx,
        LockEvent::Holding {
            kind: Kind::Writer,
            id: 1,
        },
    )
    .await;
    let holding: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, LockEvent::Holding { .. }))
        .collect();
    assert_eq!(holding.len(), 2, "only the two writers in turn: {events:?}");

    reg.shutdown(WAIT).await;
}

#[tokio::test]
async fn test_writer_blocks_reader_until_released() {
    let mut reg = registry();

    let mut writer = reg.spawn(Kind::Writer).unwrap();
    reach(&mut writer, ParticipantState::HoldingLock).await;
    let mut reader = reg.spawn(Kind::Reader).unwrap();

    tokio::time::sleep(SETTLE).await;
    assert_eq!(reader.state(), ParticipantState::Started);

    assert!(reg.release_oldest(Kind::Writer).unwrap());
    reach(&mut reader, ParticipantState::HoldingLock).await;
    assert_eq!(reg.lock_state(), LockState::Shared(1));

    reg.shutdown(WAIT).await;
}

#[tokio::test]
async fn test_readers_share_the_lock() {
    let mut reg = registry();

    let mut first = reg.spawn(Kind::Reader).unwrap();
    let mut second = reg.spawn(Kind::Reader).unwrap();
    reach(&mut first, ParticipantState::HoldingLock).await;
    reach(&mut second, ParticipantState::HoldingLock).await;

    assert_eq!(reg.lock_state(), LockState::Shared(2));
    assert_eq!(reg.live_count(Kind::Reader), 2);

    reg.shutdown(WAIT).await;
}

// =============================================================================
// Registry behavior
// =============================================================================

#[tokio::test]
async fn test_release_on_empty_is_a_silent_no_op() {
    let registry = registry();
    let mut rx = registry.events().subscribe();
    let mut ctl = Controller::new(registry, InvalidKeyPolicy::Exit);

    assert!(matches!(ctl.handle_key('x').unwrap(), Outcome::NothingToRelease(Kind::Reader)));
    tokio::time::sleep(SETTLE).await;
    assert!(rx.try_recv().is_err());

    let report = ctl.shutdown(WAIT).await;
    assert_eq!(report.released, 0);
}

#[tokio::test]
async fn test_waiting_writer_gets_the_lock_after_exclusive_release() {
    let mut reg = registry();

    let mut holder = reg.spawn(Kind::Writer).unwrap();
    reach(&mut holder, ParticipantState::HoldingLock).await;
    let mut waiting = vec![
        reg.spawn(Kind::Reader).unwrap(),
        reg.spawn(Kind::Writer).unwrap(),
        reg.spawn(Kind::Reader).unwrap(),
    ];

    assert!(reg.release_oldest(Kind::Writer).unwrap());

    tokio::time::timeout(WAIT, async {
        loop {
            if waiting.iter().any(|h| h.state() == ParticipantState::HoldingLock) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("no waiting participant was granted the lock");

    let report = reg.shutdown(WAIT).await;
    assert_eq!(report.aborted, 0);
    for handle in &mut waiting {
        reach(handle, ParticipantState::Done).await;
    }
}

#[tokio::test]
async fn test_released_while_waiting_still_passes_through_holding() {
    let mut reg = registry();
    let mut rx = reg.events().subscribe();

    let mut writer = reg.spawn(Kind::Writer).unwrap();
    reach(&mut writer, ParticipantState::HoldingLock).await;
    let mut reader = reg.spawn(Kind::Reader).unwrap();

    // The reader is released before it ever holds the lock
    assert!(reg.release_oldest(Kind::Reader).unwrap());
    assert_eq!(reader.state(), ParticipantState::Started);

    assert!(reg.release_oldest(Kind::Writer).unwrap());
    reach(&mut reader, ParticipantState::Done).await;

    let events = recv_until(
        &mut rx,
        LockEvent::Exiting {
            kind: Kind::Reader,
            id: 0,
        },
    )
    .await;
    let reader_events: Vec<_> = events.iter().filter(|e| e.kind() == Kind::Reader).collect();
    assert_eq!(
        reader_events,
        vec![
            &LockEvent::WaitingForLock {
                kind: Kind::Reader,
                id: 0
            },
            &LockEvent::Holding {
                kind: Kind::Reader,
                id: 0
            },
            &LockEvent::Exiting {
                kind: Kind::Reader,
                id: 0
            },
        ]
    );

    reg.shutdown(WAIT).await;
}

// =============================================================================
// Event log
// =============================================================================

#[tokio::test]
async fn test_event_log_records_a_session() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("events.jsonl");

    let events = Arc::new(EventBus::new(256));
    let logger = spawn_event_logger(events.subscribe(), &path);
    let mut ctl = Controller::new(
        ParticipantRegistry::new(SharedLock::new(), events),
        InvalidKeyPolicy::Exit,
    );

    let Outcome::Spawned(mut reader) = ctl.handle_key('r').unwrap() else {
        panic!("expected a reader");
    };
    reach(&mut reader, ParticipantState::HoldingLock).await;
    ctl.handle_key('x').unwrap();
    reach(&mut reader, ParticipantState::Done).await;

    ctl.shutdown(WAIT).await;
    tokio::time::timeout(WAIT, logger)
        .await
        .expect("logger did not stop after the bus closed")
        .unwrap();

    let entries = read_event_log(&path).unwrap();
    let types: Vec<_> = entries.iter().map(|e| e.event.event_type()).collect();
    assert_eq!(types, vec!["WaitingForLock", "Holding", "Exiting"]);
    assert!(entries.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}
