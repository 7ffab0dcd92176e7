// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cancellable units of work and their shared handles

use crate::error::OperationError;
use async_trait::async_trait;
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Scheduling state of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Pending,
    Executing,
    /// Cancellation requested while executing; the work has not exited yet
    Cancelled,
    Finished,
}

/// Callback invoked exactly once with the operation's outcome
pub type Completion = Box<dyn FnOnce(Result<(), OperationError>) + Send>;

/// Run by the owning queue when a pending operation finishes without running
type Release = Box<dyn FnOnce() + Send>;

/// What a running operation can see of its own scheduling
#[derive(Clone)]
pub struct OperationContext {
    id: u64,
    token: CancellationToken,
}

impl OperationContext {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the operation is cancelled
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

/// A unit of work run by an [`OperationQueue`](crate::OperationQueue).
///
/// Cancellation is cooperative: long-running work should watch
/// [`OperationContext::cancelled`].
#[async_trait]
pub trait Operation: Send + 'static {
    /// Short name for logs
    fn name(&self) -> &str;

    async fn execute(&mut self, ctx: &OperationContext) -> Result<(), OperationError>;
}

struct Slot {
    state: OperationState,
    completion: Option<Completion>,
    outcome: Option<Result<(), OperationError>>,
}

struct HandleInner {
    id: u64,
    name: String,
    token: CancellationToken,
    slot: Mutex<Slot>,
    finished: watch::Sender<bool>,
    release: Mutex<Option<Release>>,
}

/// Shared view of a submitted operation
#[derive(Clone)]
pub struct OperationHandle {
    inner: Arc<HandleInner>,
}

impl fmt::Debug for OperationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationHandle")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .finish()
    }
}

impl OperationHandle {
    pub(crate) fn new(id: u64, name: String, completion: Option<Completion>) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                id,
                name,
                token: CancellationToken::new(),
                slot: Mutex::new(Slot {
                    state: OperationState::Pending,
                    completion,
                    outcome: None,
                }),
                finished: watch::channel(false).0,
                release: Mutex::new(None),
            }),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Slot> {
        self.inner.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn state(&self) -> OperationState {
        self.slot().state
    }

    pub fn is_finished(&self) -> bool {
        self.state() == OperationState::Finished
    }

    /// The outcome delivered to the completion, once there is one
    pub fn outcome(&self) -> Option<Result<(), OperationError>> {
        self.slot().outcome.clone()
    }

    /// Resolves once the operation reaches `Finished`
    pub async fn wait_finished(&self) {
        let mut rx = self.inner.finished.subscribe();
        // The sender lives as long as this handle
        let _ = rx.wait_for(|finished| *finished).await;
    }

    /// Request cancellation.
    ///
    /// A pending operation finishes at once with `Cancelled`. An executing one
    /// sees its token fire and completes with `Cancelled` when its work exits.
    /// No effect once finished.
    pub fn cancel(&self) {
        self.interrupt(OperationError::Cancelled, false);
    }

    /// Resolve the completion with `Expired` now and cancel the work
    pub(crate) fn expire(&self) {
        self.interrupt(OperationError::Expired, true);
    }

    /// Resolve the completion with `Expired` but let the work run to the end
    pub(crate) fn expire_completion(&self) {
        if !self.is_finished() {
            self.resolve(Err(OperationError::Expired));
        }
    }

    fn interrupt(&self, error: OperationError, resolve_now: bool) {
        let mut slot = self.slot();
        match slot.state {
            OperationState::Finished => {}
            OperationState::Pending => {
                slot.state = OperationState::Finished;
                drop(slot);
                self.inner.token.cancel();
                self.resolve(Err(error));
                self.inner.finished.send_replace(true);
                let release = self.inner.release.lock().unwrap_or_else(|e| e.into_inner()).take();
                if let Some(release) = release {
                    release();
                }
            }
            OperationState::Executing | OperationState::Cancelled => {
                slot.state = OperationState::Cancelled;
                drop(slot);
                self.inner.token.cancel();
                if resolve_now {
                    self.resolve(Err(error));
                }
            }
        }
    }

    /// Register how the owning queue drops this operation if it finishes
    /// while still pending. Must not be invoked under the queue's lock.
    pub(crate) fn on_release(&self, release: impl FnOnce() + Send + 'static) {
        *self.inner.release.lock().unwrap_or_else(|e| e.into_inner()) = Some(Box::new(release));
    }

    pub(crate) fn context(&self) -> OperationContext {
        OperationContext {
            id: self.inner.id,
            token: self.inner.token.clone(),
        }
    }

    /// Pending -> Executing. False if the operation was cancelled first.
    pub(crate) fn begin(&self) -> bool {
        let mut slot = self.slot();
        if slot.state != OperationState::Pending {
            return false;
        }
        slot.state = OperationState::Executing;
        true
    }

    /// Record that the work exited with `result`
    pub(crate) fn finish(&self, result: Result<(), OperationError>) {
        let cancelled = {
            let mut slot = self.slot();
            let cancelled = slot.state == OperationState::Cancelled;
            slot.state = OperationState::Finished;
            cancelled
        };
        let outcome = if cancelled {
            Err(OperationError::Cancelled)
        } else {
            result
        };
        self.resolve(outcome);
        self.inner.finished.send_replace(true);
    }

    /// Deliver the first outcome to the completion; later ones are dropped
    fn resolve(&self, outcome: Result<(), OperationError>) {
        let completion = {
            let mut slot = self.slot();
            if slot.outcome.is_some() {
                return;
            }
            slot.outcome = Some(outcome.clone());
            slot.completion.take()
        };
        if let Some(completion) = completion {
            completion(outcome);
        }
    }
}

/// An operation ready to be enqueued, with its dependencies and completion
pub struct Submission {
    pub(crate) op: Box<dyn Operation>,
    pub(crate) deps: Vec<OperationHandle>,
    pub(crate) completion: Option<Completion>,
}

impl Submission {
    pub fn new(op: impl Operation) -> Self {
        Self::boxed(Box::new(op))
    }

    pub fn boxed(op: Box<dyn Operation>) -> Self {
        Self {
            op,
            deps: Vec::new(),
            completion: None,
        }
    }

    /// Do not start before `dependency` has finished, whatever its outcome
    pub fn depends_on(mut self, dependency: &OperationHandle) -> Self {
        self.deps.push(dependency.clone());
        self
    }

    pub fn on_complete(
        mut self,
        completion: impl FnOnce(Result<(), OperationError>) + Send + 'static,
    ) -> Self {
        self.completion = Some(Box::new(completion));
        self
    }
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
