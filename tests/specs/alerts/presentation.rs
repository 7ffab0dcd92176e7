//! Alert presentation specs
//!
//! Verify alerts show one at a time in order and that cancellation releases
//! the one on screen.

use crate::prelude::*;

#[tokio::test]
async fn three_alerts_present_in_order_and_cancel_stops_the_third() {
    let s = Scheduler::started();
    let handles: Vec<_> = ["m1", "m2", "m3"]
        .into_iter()
        .map(|id| s.alerts.enqueue_alert(AlertMessage::native(id, "hello")))
        .collect();

    s.surface.wait_for_presentations(1).await;
    assert_eq!(s.surface.on_screen(), vec!["m1"]);
    s.surface.user_dismiss("m1");

    s.surface.wait_for_presentations(2).await;
    assert_eq!(s.surface.on_screen(), vec!["m2"]);
    s.alerts.cancel_all_alerts();

    for handle in &handles {
        handle.wait_finished().await;
    }
    assert_eq!(s.surface.presented(), vec!["m1", "m2"]);
    assert_eq!(handles[1].outcome(), Some(Err(OperationError::Cancelled)));
    assert_eq!(handles[2].outcome(), Some(Err(OperationError::Cancelled)));
    assert!(s.surface.on_screen().is_empty());
}

#[tokio::test]
async fn alerts_hold_while_the_app_is_inactive() {
    let s = Scheduler::started();
    s.hub.dispatch(AppSignal::WillResignActive);

    let handle = s.alerts.enqueue_alert(AlertMessage::native("m1", "hello"));
    tokio::task::yield_now().await;
    assert!(s.surface.presented().is_empty());

    s.hub.dispatch(AppSignal::DidBecomeActive);
    s.surface.wait_for_presentations(1).await;
    s.surface.user_dismiss("m1");
    handle.wait_finished().await;

    assert_eq!(handle.outcome(), Some(Ok(())));
}

#[tokio::test]
async fn expired_message_never_reaches_the_screen() {
    let s = Scheduler::started();
    let message = AlertMessage::native("m1", "stale").expiring_at(s.clock.utc());

    let handle = s.alerts.enqueue_alert(message);
    handle.wait_finished().await;

    assert_eq!(handle.outcome(), Some(Err(OperationError::MessageExpired)));
    assert!(s.surface.presented().is_empty());
}
