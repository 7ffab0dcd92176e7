//! Event reporting specs
//!
//! Verify events are persisted before reporting and stay on disk until a
//! report carrying them succeeds.

use crate::prelude::*;

#[tokio::test]
async fn burst_inside_debounce_window_is_one_report() {
    let s = Scheduler::started();

    for i in 0..5 {
        s.events
            .submit(CustomEvent::new(format!("e{}", i)), false)
            .await
            .unwrap();
    }
    assert!(s.transport.attempts().is_empty());

    s.transport.wait_for_sends(1).await;
    s.idle().await;

    assert_eq!(event_batch_sizes(&s.transport), vec![5]);
    assert!(s.stored_events().await.is_empty());
}

#[tokio::test]
async fn failed_report_leaves_events_on_disk() {
    let s = Scheduler::started();
    s.transport.fail_next(TransportError::Status(503));

    let result = s.events.submit(CustomEvent::new("purchase"), true).await;

    assert_eq!(result, Err(OperationError::Transport(TransportError::Status(503))));
    let stored = s.stored_events().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].definition_id, "purchase");
    assert!(s.events.pipeline().reporting_needed());

    // The next report picks the event up
    s.events.flush().unwrap().wait_finished().await;
    assert_eq!(event_batch_sizes(&s.transport), vec![1]);
    assert!(s.stored_events().await.is_empty());
}

#[tokio::test]
async fn unregistered_installation_writes_nothing() {
    let s = Scheduler::started();
    s.identity.set(None);

    let result = s.events.submit(CustomEvent::new("purchase"), true).await;

    assert_eq!(result, Err(OperationError::NoRegistration));
    assert!(s.stored_events().await.is_empty());
    assert!(s.transport.attempts().is_empty());
}

#[tokio::test]
async fn events_survive_a_restart() {
    let s = Scheduler::started();
    s.transport.set_failing(Some(TransportError::Connection("offline".into())));
    s.events
        .submit(CustomEvent::new("offline").with_property("n", 1), true)
        .await
        .unwrap_err();
    s.hub.shutdown().await;

    let reopened = s.stored_events().await;
    assert_eq!(reopened.len(), 1);
    assert_eq!(reopened[0].properties.get("n"), Some(&serde_json::json!(1)));
}
