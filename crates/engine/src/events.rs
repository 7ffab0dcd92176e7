// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Custom event reporting

use crate::error::OperationError;
use crate::gate::{LifecycleGate, LifecycleService};
use crate::operation::{Operation, OperationContext, OperationHandle};
use crate::pipeline::ReportPipeline;
use async_trait::async_trait;
use courier_adapters::{InstallationIdentity, RecordStore, ReportTransport};
use courier_core::{
    AppSignal, Clock, CustomEvent, EventRecord, GateEffect, GateEvent, Query, ReportBatch,
    SchedulerConfig, ServiceState,
};

/// Writes one event record
struct PersistEvent<S> {
    store: S,
    record: Option<EventRecord>,
}

#[async_trait]
impl<S: RecordStore<EventRecord>> Operation for PersistEvent<S> {
    fn name(&self) -> &str {
        "persist-event"
    }

    async fn execute(&mut self, _ctx: &OperationContext) -> Result<(), OperationError> {
        if let Some(record) = self.record.take() {
            self.store.append(record).await?;
        }
        Ok(())
    }
}

/// Sends stored events oldest first and deletes what the backend accepted
struct ReportEvents<S, T, I> {
    store: S,
    transport: T,
    identity: I,
    max_batch: usize,
}

#[async_trait]
impl<S, T, I> Operation for ReportEvents<S, T, I>
where
    S: RecordStore<EventRecord>,
    T: ReportTransport,
    I: InstallationIdentity,
{
    fn name(&self) -> &str {
        "report-events"
    }

    async fn execute(&mut self, ctx: &OperationContext) -> Result<(), OperationError> {
        let registration_id = self
            .identity
            .registration_id()
            .ok_or(OperationError::NoRegistration)?;
        let events = self
            .store
            .find(&Query::all().limit(self.max_batch))
            .await?;
        if events.is_empty() {
            return Ok(());
        }
        if ctx.is_cancelled() {
            return Err(OperationError::Cancelled);
        }

        let ids: Vec<String> = events.iter().map(|e| e.id.clone()).collect();
        let batch = ReportBatch::Events {
            registration_id,
            events,
        };
        self.transport.send(&batch).await?;

        let removed = self.store.delete(&ids).await?;
        tracing::info!(reported = ids.len(), removed, "events reported");
        Ok(())
    }
}

/// Event pipeline: validates, persists and reports custom events
pub struct EventsService<S, I, C> {
    gate: LifecycleGate,
    pipeline: ReportPipeline,
    store: S,
    identity: I,
    clock: C,
}

impl<S, I, C> EventsService<S, I, C>
where
    S: RecordStore<EventRecord>,
    I: InstallationIdentity,
    C: Clock,
{
    pub fn new<T: ReportTransport>(
        store: S,
        transport: T,
        identity: I,
        clock: C,
        config: &SchedulerConfig,
    ) -> Self {
        let pipeline = {
            let store = store.clone();
            let identity = identity.clone();
            let max_batch = config.max_batch_size;
            ReportPipeline::new("events", config.report_debounce, move |_| {
                Box::new(ReportEvents {
                    store: store.clone(),
                    transport: transport.clone(),
                    identity: identity.clone(),
                    max_batch,
                }) as Box<dyn Operation>
            })
        };
        let gate = LifecycleGate::new(
            "events",
            vec![pipeline.persist_queue().clone(), pipeline.report_queue().clone()],
        );
        Self {
            gate,
            pipeline,
            store,
            identity,
            clock,
        }
    }

    pub fn pipeline(&self) -> &ReportPipeline {
        &self.pipeline
    }

    /// Record a custom event.
    ///
    /// Rejected before anything is written when the event is invalid or the
    /// installation is not registered. Work submitted while the service is
    /// suspended waits for `start`.
    pub async fn submit(
        &self,
        event: CustomEvent,
        report_immediately: bool,
    ) -> Result<(), OperationError> {
        event.validate()?;
        let registration_id = self
            .identity
            .registration_id()
            .ok_or(OperationError::NoRegistration)?;

        tracing::debug!(
            definition_id = %event.definition_id,
            report_immediately,
            "submitting event"
        );
        let record = EventRecord::new(event, registration_id, self.clock.utc());
        self.pipeline
            .submit(
                PersistEvent {
                    store: self.store.clone(),
                    record: Some(record),
                },
                report_immediately,
            )
            .await
    }

    /// Admit a report now unless one is already in flight
    pub fn flush(&self) -> Option<OperationHandle> {
        self.pipeline.try_report()
    }
}

#[async_trait]
impl<S, I, C> LifecycleService for EventsService<S, I, C>
where
    S: RecordStore<EventRecord>,
    I: InstallationIdentity,
    C: Clock,
{
    fn name(&self) -> &str {
        self.gate.name()
    }

    fn state(&self) -> ServiceState {
        self.gate.state()
    }

    fn start(&self) {
        self.gate.handle(GateEvent::Start);
    }

    fn suspend(&self) {
        self.gate.handle(GateEvent::Suspend);
    }

    fn on_signal(&self, signal: AppSignal) {
        for effect in self.gate.handle(GateEvent::App(signal)) {
            match effect {
                // No timer here; foreground re-entry flushes through the debounce
                GateEffect::MarkReportingNeeded => {
                    self.pipeline.mark_reporting_needed();
                    self.pipeline.report_eventually();
                }
                GateEffect::ExpireReports => self.pipeline.expire_reports(),
                _ => {}
            }
        }
    }

    async fn shutdown(&self) {
        self.suspend();
        self.gate.wait_idle().await;
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
