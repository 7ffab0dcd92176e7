// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User session tracking
//!
//! A heartbeat timer extends the current session or opens a new one. Reports
//! announce sessions that started and close the ones idle past the timeout.

use crate::error::OperationError;
use crate::gate::{LifecycleGate, LifecycleService};
use crate::operation::{Operation, OperationContext, OperationHandle, Submission};
use crate::pipeline::ReportPipeline;
use crate::queue::OperationQueue;
use crate::timer::RepeatingTimer;
use async_trait::async_trait;
use courier_adapters::{InstallationIdentity, RecordStore, ReportTransport};
use courier_core::{
    AppSignal, Clock, GateEffect, GateEvent, Heartbeat, Order, Query, ReportBatch,
    SchedulerConfig, ServiceState, SessionPolicy, SessionRecord,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::sync::oneshot;

/// Extends the current session or opens one
struct SessionHeartbeat<S, I, C> {
    store: S,
    identity: I,
    clock: C,
    policy: SessionPolicy,
    /// Set when a session nobody has announced yet is opened
    reporting_needed: Arc<AtomicBool>,
}

#[async_trait]
impl<S, I, C> Operation for SessionHeartbeat<S, I, C>
where
    S: RecordStore<SessionRecord>,
    I: InstallationIdentity,
    C: Clock,
{
    fn name(&self) -> &str {
        "session-heartbeat"
    }

    async fn execute(&mut self, _ctx: &OperationContext) -> Result<(), OperationError> {
        let registration_id = self
            .identity
            .registration_id()
            .ok_or(OperationError::NoRegistration)?;
        let now = self.clock.utc();
        let policy = self.policy;
        let current = self
            .store
            .find(&Query::matching(move |s: &SessionRecord| policy.is_current(s, now)))
            .await?;

        match policy.heartbeat(current, &registration_id, now) {
            Heartbeat::Extend(sessions) => {
                for session in sessions {
                    self.store.update(session).await?;
                }
            }
            Heartbeat::Open(session) => {
                let id = self.store.append(session).await?;
                self.reporting_needed.store(true, Ordering::SeqCst);
                tracing::info!(session = %id, "session opened");
            }
        }
        Ok(())
    }
}

/// Announces started sessions and closes finished ones
struct ReportSessions<S, T, I, C> {
    store: S,
    transport: T,
    identity: I,
    clock: C,
    policy: SessionPolicy,
    /// Post-report writes go through here to stay ordered with heartbeats
    persist: OperationQueue,
}

#[async_trait]
impl<S, T, I, C> Operation for ReportSessions<S, T, I, C>
where
    S: RecordStore<SessionRecord>,
    T: ReportTransport,
    I: InstallationIdentity,
    C: Clock,
{
    fn name(&self) -> &str {
        "report-sessions"
    }

    async fn execute(&mut self, ctx: &OperationContext) -> Result<(), OperationError> {
        let registration_id = self
            .identity
            .registration_id()
            .ok_or(OperationError::NoRegistration)?;
        let sessions = self.store.find(&Query::all()).await?;
        let report = self.policy.report(&sessions, self.clock.utc());
        if report.is_empty() {
            return Ok(());
        }
        if ctx.is_cancelled() {
            return Err(OperationError::Cancelled);
        }

        let started: Vec<String> = report.started.iter().map(|s| s.id.clone()).collect();
        let finished: Vec<String> = report.finished.iter().map(|s| s.id.clone()).collect();
        let batch = ReportBatch::Sessions {
            registration_id,
            report,
        };
        self.transport.send(&batch).await?;
        // Sends do not watch the token; a suspended persist queue would
        // never run the write-back
        if ctx.is_cancelled() {
            return Err(OperationError::Cancelled);
        }

        let (tx, rx) = oneshot::channel();
        let write_back = self.persist.enqueue(
            Submission::new(ApplySessionReport {
                store: self.store.clone(),
                started,
                finished: finished.clone(),
            })
            .on_complete(move |result| {
                let _ = tx.send(result);
            }),
        );
        tokio::select! {
            result = rx => result.unwrap_or(Err(OperationError::Closed))?,
            _ = ctx.cancelled() => {
                write_back.cancel();
                return Err(OperationError::Cancelled);
            }
        }
        tracing::info!(closed = finished.len(), "sessions reported");
        Ok(())
    }
}

/// Marks announced sessions and removes closed ones
struct ApplySessionReport<S> {
    store: S,
    started: Vec<String>,
    finished: Vec<String>,
}

#[async_trait]
impl<S: RecordStore<SessionRecord>> Operation for ApplySessionReport<S> {
    fn name(&self) -> &str {
        "apply-session-report"
    }

    async fn execute(&mut self, _ctx: &OperationContext) -> Result<(), OperationError> {
        let started = std::mem::take(&mut self.started);
        let current = self
            .store
            .find(&Query::matching(move |s: &SessionRecord| started.contains(&s.id)))
            .await?;
        for mut session in current {
            session.start_reported = true;
            self.store.update(session).await?;
        }
        if !self.finished.is_empty() {
            self.store.delete(&self.finished).await?;
        }
        Ok(())
    }
}

/// Reads the id of the current session in persist order
struct ReadCurrentSession<S, C> {
    store: S,
    clock: C,
    policy: SessionPolicy,
    reply: Option<oneshot::Sender<Option<String>>>,
}

#[async_trait]
impl<S: RecordStore<SessionRecord>, C: Clock> Operation for ReadCurrentSession<S, C> {
    fn name(&self) -> &str {
        "read-current-session"
    }

    async fn execute(&mut self, _ctx: &OperationContext) -> Result<(), OperationError> {
        let now = self.clock.utc();
        let policy = self.policy;
        let current = self
            .store
            .find(
                &Query::matching(move |s: &SessionRecord| policy.is_current(s, now))
                    .order(Order::NewestFirst)
                    .limit(1),
            )
            .await?;
        if let Some(reply) = self.reply.take() {
            let _ = reply.send(current.first().map(SessionRecord::session_id));
        }
        Ok(())
    }
}

struct Inner<S, I, C> {
    gate: LifecycleGate,
    pipeline: ReportPipeline,
    store: S,
    identity: I,
    clock: C,
    policy: SessionPolicy,
    test_mode: bool,
    timer: Mutex<Option<RepeatingTimer>>,
}

/// Session pipeline driven by a heartbeat timer
pub struct SessionService<S, I, C> {
    inner: Arc<Inner<S, I, C>>,
}

impl<S, I, C> Clone for SessionService<S, I, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, I, C> SessionService<S, I, C>
where
    S: RecordStore<SessionRecord>,
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
        let policy = config.session_policy();
        let pipeline = {
            let store = store.clone();
            let identity = identity.clone();
            let clock = clock.clone();
            ReportPipeline::new("sessions", config.report_debounce, move |persist| {
                Box::new(ReportSessions {
                    store: store.clone(),
                    transport: transport.clone(),
                    identity: identity.clone(),
                    clock: clock.clone(),
                    policy,
                    persist: persist.clone(),
                }) as Box<dyn Operation>
            })
        };
        // Sessions left by an earlier run may still be unannounced
        pipeline.mark_reporting_needed();
        let gate = LifecycleGate::new(
            "sessions",
            vec![pipeline.persist_queue().clone(), pipeline.report_queue().clone()],
        );
        Self {
            inner: Arc::new(Inner {
                gate,
                pipeline,
                store,
                identity,
                clock,
                policy,
                test_mode: config.test_mode,
                timer: Mutex::new(None),
            }),
        }
    }

    pub fn pipeline(&self) -> &ReportPipeline {
        &self.inner.pipeline
    }

    pub fn save_interval(&self) -> Duration {
        self.inner.policy.save_interval
    }

    /// Persist a heartbeat and, if asked, try to admit a report
    pub fn perform_tracking(&self, do_reporting: bool) -> OperationHandle {
        Inner::perform_tracking(&self.inner, do_reporting)
    }

    /// Id of the session in progress, read after every queued heartbeat
    pub async fn current_session_id(&self) -> Result<Option<String>, OperationError> {
        let (tx, rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();
        self.inner.pipeline.persist_queue().enqueue(
            Submission::new(ReadCurrentSession {
                store: self.inner.store.clone(),
                clock: self.inner.clock.clone(),
                policy: self.inner.policy,
                reply: Some(tx),
            })
            .on_complete(move |result| {
                let _ = done_tx.send(result);
            }),
        );
        done_rx.await.unwrap_or(Err(OperationError::Closed))?;
        rx.await.map_err(|_| OperationError::Closed)
    }

    pub fn timer_running(&self) -> bool {
        self.inner
            .timer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(RepeatingTimer::is_running)
    }
}

impl<S, I, C> Inner<S, I, C>
where
    S: RecordStore<SessionRecord>,
    I: InstallationIdentity,
    C: Clock,
{
    fn perform_tracking(self: &Arc<Self>, do_reporting: bool) -> OperationHandle {
        let handle = self.pipeline.persist(SessionHeartbeat {
            store: self.store.clone(),
            identity: self.identity.clone(),
            clock: self.clock.clone(),
            policy: self.policy,
            reporting_needed: self.pipeline.reporting_flag(),
        });
        if do_reporting {
            self.pipeline.try_report_after(&handle);
        }
        handle
    }

    fn apply(self: &Arc<Self>, effects: Vec<GateEffect>) {
        for effect in effects {
            match effect {
                GateEffect::StartTimer => self.start_timer(),
                GateEffect::StopTimer => {
                    self.timer.lock().unwrap_or_else(|e| e.into_inner()).take();
                }
                GateEffect::ResumeTimer => {
                    if let Some(timer) = self.timer.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
                        timer.resume();
                    }
                }
                GateEffect::SuspendTimer => {
                    if let Some(timer) = self.timer.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
                        timer.suspend();
                    }
                }
                GateEffect::MarkReportingNeeded => self.pipeline.mark_reporting_needed(),
                GateEffect::ExpireReports => self.pipeline.expire_reports(),
                GateEffect::ResumeQueues | GateEffect::SuspendQueues | GateEffect::CancelQueues => {}
            }
        }
    }

    fn start_timer(self: &Arc<Self>) {
        if self.test_mode {
            tracing::debug!("test mode: session timer not started");
            return;
        }
        let mut slot = self.timer.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(timer) = slot.as_ref() {
            timer.resume();
            return;
        }
        let inner: Weak<Self> = Arc::downgrade(self);
        *slot = Some(RepeatingTimer::start(self.policy.save_interval, move || {
            if let Some(inner) = inner.upgrade() {
                let needed = inner.pipeline.reporting_needed();
                Inner::perform_tracking(&inner, needed);
            }
        }));
    }
}

#[async_trait]
impl<S, I, C> LifecycleService for SessionService<S, I, C>
where
    S: RecordStore<SessionRecord>,
    I: InstallationIdentity,
    C: Clock,
{
    fn name(&self) -> &str {
        self.inner.gate.name()
    }

    fn state(&self) -> ServiceState {
        self.inner.gate.state()
    }

    fn start(&self) {
        let effects = self.inner.gate.handle(GateEvent::Start);
        self.inner.apply(effects);
    }

    fn suspend(&self) {
        let effects = self.inner.gate.handle(GateEvent::Suspend);
        self.inner.apply(effects);
    }

    fn on_signal(&self, signal: AppSignal) {
        let effects = self.inner.gate.handle(GateEvent::App(signal));
        self.inner.apply(effects);
    }

    async fn shutdown(&self) {
        self.suspend();
        self.inner.gate.wait_idle().await;
    }
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
