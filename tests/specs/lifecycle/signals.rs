//! Lifecycle gating specs
//!
//! Verify start/suspend idempotence, work held while suspended, and that
//! `time_will_expire` resolves outstanding reports at once.

use crate::prelude::*;

#[tokio::test]
async fn suspend_twice_and_start_twice_are_harmless() {
    let s = Scheduler::started();

    s.hub.start_all();
    for service in s.hub.services() {
        assert_eq!(service.state(), ServiceState::Resumed);
    }

    s.hub.suspend_all();
    s.hub.suspend_all();
    for service in s.hub.services() {
        assert_eq!(service.state(), ServiceState::Suspended);
    }
}

#[tokio::test]
async fn work_submitted_while_suspended_waits_for_start() {
    let s = Scheduler::started();
    // Keep the debounced report from clearing the store under us
    s.transport.hold();
    s.hub.suspend_all();

    let submitted = tokio::spawn({
        let events = s.events.clone();
        async move { events.submit(CustomEvent::new("later"), false).await }
    });
    tokio::task::yield_now().await;
    assert!(s.stored_events().await.is_empty());

    s.hub.start_all();
    submitted.await.unwrap().unwrap();
    assert_eq!(s.stored_events().await.len(), 1);
}

#[tokio::test]
async fn time_will_expire_resolves_an_outstanding_report() {
    let s = Scheduler::started();
    s.events.submit(CustomEvent::new("a"), false).await.unwrap();
    s.transport.hold();

    let report = s.events.flush().unwrap();
    s.transport.wait_for_sends(1).await;
    s.hub.dispatch(AppSignal::TimeWillExpire);

    // Resolved before the transport lets go
    assert_eq!(report.outcome(), Some(Err(OperationError::Expired)));

    s.transport.release();
    report.wait_finished().await;
    // Data is kept for a later report unless the send completed
    assert!(s.stored_events().await.len() <= 1);
}

#[tokio::test]
async fn foreground_schedules_a_flush_of_stored_events() {
    let s = Scheduler::started();
    s.transport.set_failing(Some(TransportError::Status(500)));
    s.events.submit(CustomEvent::new("a"), true).await.unwrap_err();
    s.transport.set_failing(None);

    s.hub.dispatch(AppSignal::WillEnterForeground);
    s.transport.wait_for_sends(2).await;
    s.idle().await;

    assert_eq!(event_batch_sizes(&s.transport), vec![1]);
    assert!(s.stored_events().await.is_empty());
}
