//! Session tracking specs
//!
//! Verify the heartbeat grid, pausing in the background, and that sessions
//! are announced and closed through the file store.

use crate::prelude::*;

fn timed() -> SchedulerConfig {
    SchedulerConfig {
        test_mode: false,
        ..SchedulerConfig::for_tests()
    }
}

async fn session_writes(s: &Scheduler) -> Vec<SessionRecord> {
    s.sessions.pipeline().wait_idle().await;
    s.stored_sessions().await
}

#[tokio::test(start_paused = true)]
async fn background_pause_neither_fires_nor_drifts() {
    let s = Scheduler::with_config(timed());

    // Ticks at 5s; nothing yet at 4s
    s.hub.dispatch(AppSignal::DidBecomeActive);
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(session_writes(&s).await.is_empty());

    s.hub.dispatch(AppSignal::WillResignActive);
    tokio::time::sleep(Duration::from_secs(8)).await;
    assert!(session_writes(&s).await.is_empty());

    // Resumed at 12s: the next tick lands on the 15s grid point, not 17s
    s.hub.dispatch(AppSignal::DidBecomeActive);
    tokio::time::sleep(Duration::from_millis(2_900)).await;
    assert!(session_writes(&s).await.is_empty());
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(session_writes(&s).await.len(), 1);
}

#[tokio::test]
async fn sessions_are_announced_then_closed() {
    let s = Scheduler::started();
    s.sessions.perform_tracking(false).wait_finished().await;

    s.sessions.pipeline().try_report().unwrap().wait_finished().await;
    let stored = s.stored_sessions().await;
    assert_eq!(stored.len(), 1);
    assert!(stored[0].start_reported);

    s.clock.advance(Duration::from_secs(60));
    s.sessions.pipeline().try_report().unwrap().wait_finished().await;
    assert!(s.stored_sessions().await.is_empty());
    assert_eq!(s.transport.delivered().len(), 2);
}

#[tokio::test]
async fn session_id_is_registration_and_start() {
    let s = Scheduler::started();
    s.sessions.perform_tracking(false);

    let id = s.sessions.current_session_id().await.unwrap().unwrap();

    let stored = s.stored_sessions().await;
    assert_eq!(id, format!("reg-1_{}", stored[0].start.timestamp()));
}
