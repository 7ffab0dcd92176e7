// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{TimeZone, Utc};
use courier_adapters::{FakeStore, FakeTransport, SharedIdentity, StoreCall, TransportError};
use courier_core::FakeClock;

type Service = SessionService<FakeStore<SessionRecord>, SharedIdentity, FakeClock>;

struct Harness {
    service: Service,
    store: FakeStore<SessionRecord>,
    transport: FakeTransport,
    identity: SharedIdentity,
    clock: FakeClock,
}

fn harness(config: SchedulerConfig) -> Harness {
    let store = FakeStore::new();
    let transport = FakeTransport::new();
    let identity = SharedIdentity::registered("reg-1");
    let clock = FakeClock::starting_at(Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap());
    let service = SessionService::new(
        store.clone(),
        transport.clone(),
        identity.clone(),
        clock.clone(),
        &config,
    );
    service.start();
    Harness {
        service,
        store,
        transport,
        identity,
        clock,
    }
}

async fn heartbeat(h: &Harness) -> Option<Result<(), OperationError>> {
    let handle = h.service.perform_tracking(false);
    handle.wait_finished().await;
    handle.outcome()
}

async fn report(h: &Harness) -> Option<Result<(), OperationError>> {
    let handle = h.service.pipeline().try_report().unwrap();
    handle.wait_finished().await;
    handle.outcome()
}

fn heartbeats(store: &FakeStore<SessionRecord>) -> usize {
    store
        .calls()
        .iter()
        .filter(|c| matches!(c, StoreCall::Append { .. } | StoreCall::Update { .. }))
        .count()
}

#[tokio::test]
async fn first_heartbeat_opens_a_minimum_length_session() {
    let h = harness(SchedulerConfig::for_tests());
    let now = h.clock.utc();

    assert_eq!(heartbeat(&h).await, Some(Ok(())));

    let sessions = h.store.records();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].start, now);
    assert_eq!(sessions[0].end, now + chrono::Duration::seconds(5));
    assert!(!sessions[0].start_reported);
}

#[tokio::test]
async fn heartbeat_within_timeout_extends_the_session() {
    let h = harness(SchedulerConfig::for_tests());
    let start = h.clock.utc();
    heartbeat(&h).await;

    h.clock.advance(Duration::from_secs(20));
    heartbeat(&h).await;

    let sessions = h.store.records();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].start, start);
    assert_eq!(sessions[0].end, start + chrono::Duration::seconds(20));
}

#[tokio::test]
async fn heartbeat_after_timeout_opens_a_new_session() {
    let h = harness(SchedulerConfig::for_tests());
    heartbeat(&h).await;

    h.clock.advance(Duration::from_secs(60));
    heartbeat(&h).await;

    assert_eq!(h.store.records().len(), 2);
}

#[tokio::test]
async fn report_announces_starts_and_closes_finished_sessions() {
    let h = harness(SchedulerConfig::for_tests());
    heartbeat(&h).await;
    assert_eq!(report(&h).await, Some(Ok(())));

    let sent = h.transport.delivered();
    assert_eq!(sent.len(), 1);
    match &sent[0] {
        ReportBatch::Sessions { report, .. } => {
            assert_eq!(report.started.len(), 1);
            assert!(report.finished.is_empty());
        }
        other => panic!("unexpected batch: {:?}", other),
    }
    assert!(h.store.records()[0].start_reported);

    // Idle past the timeout: the session is closed on the next report
    h.clock.advance(Duration::from_secs(40));
    assert_eq!(report(&h).await, Some(Ok(())));

    match &h.transport.delivered()[1] {
        ReportBatch::Sessions { report, .. } => {
            assert!(report.started.is_empty());
            assert_eq!(report.finished.len(), 1);
        }
        other => panic!("unexpected batch: {:?}", other),
    }
    assert!(h.store.records().is_empty());
}

#[tokio::test]
async fn nothing_to_report_skips_the_network() {
    let h = harness(SchedulerConfig::for_tests());

    assert_eq!(report(&h).await, Some(Ok(())));
    assert!(h.transport.attempts().is_empty());
}

#[tokio::test]
async fn failed_report_keeps_sessions_unannounced() {
    let h = harness(SchedulerConfig::for_tests());
    heartbeat(&h).await;
    h.transport.fail_next(TransportError::Status(500));

    assert_eq!(
        report(&h).await,
        Some(Err(OperationError::Transport(TransportError::Status(500))))
    );
    assert!(!h.store.records()[0].start_reported);
    assert!(h.service.pipeline().reporting_needed());
}

#[tokio::test]
async fn current_session_id_combines_registration_and_start() {
    let h = harness(SchedulerConfig::for_tests());
    assert_eq!(h.service.current_session_id().await, Ok(None));

    h.service.perform_tracking(false);
    let id = h.service.current_session_id().await.unwrap();

    let start = h.clock.utc().timestamp();
    assert_eq!(id, Some(format!("reg-1_{}", start)));
}

#[tokio::test]
async fn heartbeat_without_registration_fails() {
    let h = harness(SchedulerConfig::for_tests());
    h.identity.set(None);

    assert_eq!(heartbeat(&h).await, Some(Err(OperationError::NoRegistration)));
    assert!(h.store.records().is_empty());
}

#[tokio::test]
async fn test_mode_never_starts_the_timer() {
    let h = harness(SchedulerConfig::for_tests());
    assert!(!h.service.timer_running());
}

#[tokio::test(start_paused = true)]
async fn timer_drives_heartbeats_and_pauses_in_background() {
    let config = SchedulerConfig {
        test_mode: false,
        ..SchedulerConfig::for_tests()
    };
    let h = harness(config);
    assert!(h.service.timer_running());
    // Reports fail, so every store write below is a heartbeat
    h.transport.set_failing(Some(TransportError::Status(503)));

    tokio::time::sleep(Duration::from_millis(10_500)).await;
    h.service.pipeline().wait_idle().await;
    assert_eq!(heartbeats(&h.store), 2);

    h.service.on_signal(AppSignal::WillResignActive);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(heartbeats(&h.store), 2);

    h.service.on_signal(AppSignal::DidBecomeActive);
    // Resumed at 20.5s; the next tick stays on the 5s grid at 25s
    tokio::time::sleep(Duration::from_millis(4_000)).await;
    assert_eq!(heartbeats(&h.store), 2);
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    h.service.pipeline().wait_idle().await;
    assert_eq!(heartbeats(&h.store), 3);
}

#[tokio::test(start_paused = true)]
async fn first_tick_reports_the_session_it_opens() {
    let config = SchedulerConfig {
        test_mode: false,
        ..SchedulerConfig::for_tests()
    };
    let h = harness(config);
    assert!(h.service.pipeline().reporting_needed());

    tokio::time::sleep(Duration::from_millis(5_500)).await;
    h.service.pipeline().wait_idle().await;

    let sent = h.transport.delivered();
    assert_eq!(sent.len(), 1);
    match &sent[0] {
        ReportBatch::Sessions { report, .. } => assert_eq!(report.started.len(), 1),
        other => panic!("unexpected batch: {:?}", other),
    }
    assert!(h.store.records()[0].start_reported);
    assert!(!h.service.pipeline().reporting_needed());
}

#[tokio::test(start_paused = true)]
async fn foreground_reentry_reports_on_the_next_heartbeat() {
    let config = SchedulerConfig {
        test_mode: false,
        ..SchedulerConfig::for_tests()
    };
    let h = harness(config);

    tokio::time::sleep(Duration::from_millis(5_500)).await;
    h.service.pipeline().wait_idle().await;
    assert!(!h.service.pipeline().reporting_needed());
    let attempts = h.transport.attempts().len();

    // Nothing new: the tick at 10s only extends the session
    tokio::time::sleep(Duration::from_secs(5)).await;
    h.service.pipeline().wait_idle().await;
    assert_eq!(h.transport.attempts().len(), attempts);

    h.clock.advance(Duration::from_secs(60));
    h.service.on_signal(AppSignal::WillEnterForeground);
    assert!(h.service.pipeline().reporting_needed());
    tokio::time::sleep(Duration::from_secs(5)).await;
    h.service.pipeline().wait_idle().await;

    // The stale session is closed and the one opened at 15s announced
    let sent = h.transport.delivered();
    assert_eq!(sent.len(), attempts + 1);
    match sent.last() {
        Some(ReportBatch::Sessions { report, .. }) => {
            assert_eq!(report.finished.len(), 1);
            assert_eq!(report.started.len(), 1);
        }
        other => panic!("unexpected batch: {:?}", other),
    }
}

#[tokio::test]
async fn new_session_marks_reporting_needed() {
    let h = harness(SchedulerConfig::for_tests());
    heartbeat(&h).await;
    assert_eq!(report(&h).await, Some(Ok(())));
    assert!(!h.service.pipeline().reporting_needed());

    // Extending the announced session leaves the flag alone
    h.clock.advance(Duration::from_secs(10));
    heartbeat(&h).await;
    assert!(!h.service.pipeline().reporting_needed());

    h.clock.advance(Duration::from_secs(60));
    heartbeat(&h).await;
    assert!(h.service.pipeline().reporting_needed());
}

#[tokio::test]
async fn suspend_during_a_session_send_does_not_hang_shutdown() {
    let h = harness(SchedulerConfig::for_tests());
    heartbeat(&h).await;
    h.transport.hold();

    let handle = h.service.pipeline().try_report().unwrap();
    h.transport.wait_for_sends(1).await;
    h.service.suspend();
    h.transport.release();

    tokio::time::timeout(Duration::from_secs(5), h.service.shutdown())
        .await
        .unwrap();
    assert_eq!(handle.outcome(), Some(Err(OperationError::Cancelled)));
    assert!(!h.store.records()[0].start_reported);
    assert_eq!(h.service.pipeline().persist_queue().pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn suspend_stops_the_timer() {
    let config = SchedulerConfig {
        test_mode: false,
        ..SchedulerConfig::for_tests()
    };
    let h = harness(config);

    h.service.suspend();
    assert!(!h.service.timer_running());
    tokio::time::sleep(Duration::from_secs(20)).await;

    assert_eq!(heartbeats(&h.store), 0);
    assert_eq!(h.service.state(), ServiceState::Suspended);
}
