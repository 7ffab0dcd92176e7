// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persist-then-report pipeline shared by the events and sessions services
//!
//! Writes go through a serial persist queue. Reports go through a serial
//! reporting queue where only one report of the pipeline's kind may be
//! pending or executing. Report requests that are not urgent are debounced.

use crate::error::OperationError;
use crate::operation::{Operation, OperationHandle, Submission};
use crate::postponer::Postponer;
use crate::queue::OperationQueue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::oneshot;

type ReportFactory = Box<dyn Fn(&OperationQueue) -> Box<dyn Operation> + Send + Sync>;

struct Core {
    kind: String,
    persist: OperationQueue,
    report: OperationQueue,
    postponer: Postponer,
    reporting_needed: Arc<AtomicBool>,
    make_report: ReportFactory,
}

impl Core {
    /// Completion for admitted reports: failures leave data to report, and
    /// data that arrived mid-report gets another debounced flush
    fn report_completion(
        self: &Arc<Self>,
    ) -> impl FnOnce(Result<(), OperationError>) + Send + 'static {
        let core = Arc::downgrade(self);
        move |result| {
            let Some(core) = core.upgrade() else {
                return;
            };
            match result {
                Ok(()) => {
                    if core.reporting_needed.load(Ordering::SeqCst) {
                        Core::report_eventually(&core);
                    }
                }
                Err(e) => {
                    tracing::debug!(kind = %core.kind, error = %e, "report did not complete");
                    core.reporting_needed.store(true, Ordering::SeqCst);
                }
            }
        }
    }

    fn try_report(self: &Arc<Self>, after: Option<&OperationHandle>) -> Option<OperationHandle> {
        let mut submission =
            Submission::boxed((self.make_report)(&self.persist)).on_complete(self.report_completion());
        if let Some(dep) = after {
            submission = submission.depends_on(dep);
        }
        let handle = self.report.try_enqueue_exclusive(submission, &self.kind)?;
        // Cleared on admission, not on completion
        self.reporting_needed.store(false, Ordering::SeqCst);
        Some(handle)
    }

    fn report_eventually(self: &Arc<Self>) {
        let core: Weak<Core> = Arc::downgrade(self);
        self.postponer.postpone(move || {
            if let Some(core) = core.upgrade() {
                Core::try_report(&core, None);
            }
        });
    }
}

/// Durable local write followed by a coalesced, exclusive network flush
#[derive(Clone)]
pub struct ReportPipeline {
    core: Arc<Core>,
}

impl ReportPipeline {
    /// `make_report` builds a fresh report operation for each admission. It
    /// gets the persist queue so reports can route store writes through it.
    pub fn new(
        name: &str,
        debounce: Duration,
        make_report: impl Fn(&OperationQueue) -> Box<dyn Operation> + Send + Sync + 'static,
    ) -> Self {
        Self {
            core: Arc::new(Core {
                kind: format!("{}-report", name),
                persist: OperationQueue::serial(format!("{}-persist", name)),
                report: OperationQueue::serial(format!("{}-report", name)),
                postponer: Postponer::new(debounce),
                reporting_needed: Arc::new(AtomicBool::new(false)),
                make_report: Box::new(make_report),
            }),
        }
    }

    pub fn persist_queue(&self) -> &OperationQueue {
        &self.core.persist
    }

    pub fn report_queue(&self) -> &OperationQueue {
        &self.core.report
    }

    /// Exclusivity tag of this pipeline's reports
    pub fn report_kind(&self) -> &str {
        &self.core.kind
    }

    pub fn reporting_needed(&self) -> bool {
        self.core.reporting_needed.load(Ordering::SeqCst)
    }

    pub fn mark_reporting_needed(&self) {
        self.core.reporting_needed.store(true, Ordering::SeqCst);
    }

    /// The flag itself, for writes that discover unreported data
    pub(crate) fn reporting_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.core.reporting_needed)
    }

    /// Persist `item`, then report.
    ///
    /// With `immediately` the caller gets the report's result; the report
    /// waits for the write. Otherwise a debounced flush is scheduled and the
    /// caller resolves once the write is durable.
    pub async fn submit(
        &self,
        persist: impl Operation,
        immediately: bool,
    ) -> Result<(), OperationError> {
        let (persisted_tx, persisted_rx) = oneshot::channel();
        let persisted = self.core.persist.enqueue(Submission::new(persist).on_complete(
            move |result| {
                let _ = persisted_tx.send(result);
            },
        ));
        self.mark_reporting_needed();

        if !immediately {
            Core::report_eventually(&self.core);
            return persisted_rx.await.unwrap_or(Err(OperationError::Closed));
        }

        // Untagged, so it may queue next to a debounced report of the same kind
        let (reported_tx, reported_rx) = oneshot::channel();
        let on_reported = self.core.report_completion();
        self.core.report.enqueue(
            Submission::boxed((self.core.make_report)(&self.core.persist))
                .depends_on(&persisted)
                .on_complete(move |result| {
                    on_reported(result.clone());
                    let _ = reported_tx.send(result);
                }),
        );
        self.core.reporting_needed.store(false, Ordering::SeqCst);

        persisted_rx.await.unwrap_or(Err(OperationError::Closed))?;
        reported_rx.await.unwrap_or(Err(OperationError::Closed))
    }

    /// Enqueue a write that does not by itself ask for a report
    pub fn persist(&self, op: impl Operation) -> OperationHandle {
        self.core.persist.enqueue(Submission::new(op))
    }

    /// Admit a report unless one is already pending or executing
    pub fn try_report(&self) -> Option<OperationHandle> {
        Core::try_report(&self.core, None)
    }

    /// [`try_report`](Self::try_report), starting only once `write` finished
    pub fn try_report_after(&self, write: &OperationHandle) -> Option<OperationHandle> {
        Core::try_report(&self.core, Some(write))
    }

    /// Schedule a debounced report attempt
    pub fn report_eventually(&self) {
        Core::report_eventually(&self.core);
    }

    /// Resolve every outstanding completion with `Expired`.
    ///
    /// Reports are cancelled and their data stays stored for the next one.
    /// Writes still run so nothing accepted is lost.
    pub fn expire_reports(&self) {
        self.core.report.expire_outstanding();
        self.core.persist.expire_completions();
    }

    /// Wait for both queues to drain
    pub async fn wait_idle(&self) {
        self.core.persist.wait_idle().await;
        self.core.report.wait_idle().await;
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
