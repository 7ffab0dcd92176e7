// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use courier_adapters::{FakeStore, FakeTransport, SharedIdentity, TransportError};
use courier_core::{EventValidationError, FakeClock};
use std::time::Duration;

type Service = EventsService<FakeStore<EventRecord>, SharedIdentity, FakeClock>;

struct Harness {
    service: Service,
    store: FakeStore<EventRecord>,
    transport: FakeTransport,
    identity: SharedIdentity,
}

fn harness(config: SchedulerConfig) -> Harness {
    let store = FakeStore::new();
    let transport = FakeTransport::new();
    let identity = SharedIdentity::registered("reg-1");
    let service = EventsService::new(
        store.clone(),
        transport.clone(),
        identity.clone(),
        FakeClock::new(),
        &config,
    );
    service.start();
    Harness {
        service,
        store,
        transport,
        identity,
    }
}

fn sent_events(transport: &FakeTransport) -> Vec<Vec<String>> {
    transport
        .delivered()
        .iter()
        .map(|batch| match batch {
            ReportBatch::Events { events, .. } => {
                events.iter().map(|e| e.definition_id.clone()).collect()
            }
            other => panic!("unexpected batch: {:?}", other),
        })
        .collect()
}

#[tokio::test]
async fn unregistered_installation_is_rejected_before_persisting() {
    let h = harness(SchedulerConfig::for_tests());
    h.identity.set(None);

    let result = h.service.submit(CustomEvent::new("purchase"), false).await;

    assert_eq!(result, Err(OperationError::NoRegistration));
    assert!(h.store.calls().is_empty());
}

#[tokio::test]
async fn invalid_event_is_rejected() {
    let h = harness(SchedulerConfig::for_tests());
    let event = CustomEvent::new("purchase").with_property("items", vec![1, 2]);

    let result = h.service.submit(event, false).await;

    assert_eq!(
        result,
        Err(OperationError::InvalidEvent(
            EventValidationError::UnsupportedProperty("items".to_string())
        ))
    );
    assert!(h.store.calls().is_empty());
}

#[tokio::test]
async fn immediate_submit_sends_and_clears_the_store() {
    let h = harness(SchedulerConfig::for_tests());

    h.service
        .submit(CustomEvent::new("purchase").with_property("total", 42), true)
        .await
        .unwrap();

    assert_eq!(sent_events(&h.transport), vec![vec!["purchase".to_string()]]);
    assert!(h.store.records().is_empty());
    match &h.transport.delivered()[0] {
        ReportBatch::Events {
            registration_id, ..
        } => assert_eq!(registration_id, "reg-1"),
        other => panic!("unexpected batch: {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn burst_of_deferred_events_is_reported_once() {
    let h = harness(SchedulerConfig::for_tests());

    for i in 0..5 {
        h.service
            .submit(CustomEvent::new(format!("event-{i}")), false)
            .await
            .unwrap();
    }
    assert_eq!(h.store.records().len(), 5);
    tokio::time::sleep(Duration::from_secs(1)).await;
    h.service.pipeline().wait_idle().await;

    assert_eq!(h.transport.delivered().len(), 1);
    assert_eq!(sent_events(&h.transport)[0].len(), 5);
    assert!(h.store.records().is_empty());
}

#[tokio::test]
async fn failed_report_keeps_events_for_the_next_flush() {
    let h = harness(SchedulerConfig::for_tests());
    h.transport.fail_next(TransportError::Status(503));

    let result = h.service.submit(CustomEvent::new("purchase"), true).await;
    assert_eq!(result, Err(OperationError::Transport(TransportError::Status(503))));
    assert_eq!(h.store.records().len(), 1);
    assert!(h.service.pipeline().reporting_needed());

    let handle = h.service.flush().unwrap();
    handle.wait_finished().await;

    assert_eq!(handle.outcome(), Some(Ok(())));
    assert!(h.store.records().is_empty());
    assert_eq!(h.transport.attempts().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn batches_are_bounded_by_max_batch_size() {
    let config = SchedulerConfig {
        max_batch_size: 2,
        ..SchedulerConfig::for_tests()
    };
    let h = harness(config);
    for name in ["a", "b", "c"] {
        h.service.submit(CustomEvent::new(name), false).await.unwrap();
    }

    tokio::time::sleep(Duration::from_secs(1)).await;
    h.service.pipeline().wait_idle().await;

    assert_eq!(
        sent_events(&h.transport)[0],
        vec!["a".to_string(), "b".to_string()]
    );
    assert_eq!(h.store.records().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn foreground_reentry_flushes_unreported_events() {
    let h = harness(SchedulerConfig::for_tests());
    h.transport.fail_next(TransportError::Connection("offline".to_string()));
    let _ = h.service.submit(CustomEvent::new("purchase"), true).await;
    assert_eq!(h.store.records().len(), 1);

    h.service.on_signal(AppSignal::WillEnterForeground);
    tokio::time::sleep(Duration::from_secs(1)).await;
    h.service.pipeline().wait_idle().await;

    assert!(h.store.records().is_empty());
    assert_eq!(h.transport.delivered().len(), 1);
}

#[tokio::test]
async fn time_will_expire_resolves_an_outstanding_report() {
    let h = harness(SchedulerConfig::for_tests());
    h.service.submit(CustomEvent::new("purchase"), false).await.unwrap();
    h.transport.hold();
    let handle = h.service.flush().unwrap();
    h.transport.wait_for_sends(1).await;

    h.service.on_signal(AppSignal::TimeWillExpire);

    assert_eq!(handle.outcome(), Some(Err(OperationError::Expired)));
    assert!(h.service.pipeline().reporting_needed());
    h.transport.release();
    handle.wait_finished().await;
}

#[tokio::test]
async fn submissions_wait_for_start() {
    let store = FakeStore::new();
    let service = EventsService::new(
        store.clone(),
        FakeTransport::new(),
        SharedIdentity::registered("reg-1"),
        FakeClock::new(),
        &SchedulerConfig::for_tests(),
    );
    assert_eq!(service.state(), ServiceState::Suspended);
    let service = std::sync::Arc::new(service);

    let submitter = std::sync::Arc::clone(&service);
    let submitted =
        tokio::spawn(async move { submitter.submit(CustomEvent::new("early"), false).await });
    tokio::task::yield_now().await;
    assert!(store.records().is_empty());

    service.start();
    submitted.await.unwrap().unwrap();
    assert_eq!(store.records().len(), 1);
}

#[tokio::test]
async fn time_will_expire_answers_a_submit_waiting_on_persistence() {
    let store = FakeStore::new();
    let service = std::sync::Arc::new(EventsService::new(
        store.clone(),
        FakeTransport::new(),
        SharedIdentity::registered("reg-1"),
        FakeClock::new(),
        &SchedulerConfig::for_tests(),
    ));

    let submitter = std::sync::Arc::clone(&service);
    let submitted =
        tokio::spawn(async move { submitter.submit(CustomEvent::new("late"), false).await });
    while service.pipeline().persist_queue().pending() == 0 {
        tokio::task::yield_now().await;
    }

    service.on_signal(AppSignal::TimeWillExpire);
    assert_eq!(submitted.await.unwrap(), Err(OperationError::Expired));

    // The accepted write is not dropped
    service.start();
    service.pipeline().persist_queue().wait_idle().await;
    assert_eq!(store.records().len(), 1);
}

#[tokio::test]
async fn suspend_twice_is_harmless() {
    let h = harness(SchedulerConfig::for_tests());
    h.service.suspend();
    h.service.suspend();
    assert_eq!(h.service.state(), ServiceState::Suspended);

    h.service.shutdown().await;
    assert_eq!(h.service.state(), ServiceState::Suspended);
}
