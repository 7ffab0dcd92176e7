// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operation queue with a concurrency cap, suspension and kind exclusivity
//!
//! Scheduling is event driven: every enqueue, resume, finish and satisfied
//! dependency re-runs admission under the queue mutex. Each admitted
//! operation runs as its own Tokio task so a panic only fails that
//! operation.

use crate::error::OperationError;
use crate::operation::{Operation, OperationHandle, OperationState, Submission};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::runtime::Handle;
use tokio::sync::Notify;

struct Entry {
    handle: OperationHandle,
    op: Box<dyn Operation>,
    deps: Vec<OperationHandle>,
}

impl Entry {
    fn is_ready(&self) -> bool {
        self.deps.iter().all(OperationHandle::is_finished)
    }
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<Entry>,
    executing: Vec<OperationHandle>,
    suspended: bool,
    /// Exclusivity tags; a kind is taken while its handle is unfinished
    kinds: HashMap<String, OperationHandle>,
}

impl QueueState {
    fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.executing.is_empty()
    }
}

struct Shared {
    name: String,
    cap: usize,
    state: Mutex<QueueState>,
    idle: Notify,
    next_id: AtomicU64,
    runtime: Handle,
}

impl Shared {
    fn lock(&self) -> std::sync::MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn notify_if_idle(&self, state: &QueueState) {
        if state.is_idle() {
            self.idle.notify_waiters();
        }
    }

    fn push(self: &Arc<Self>, state: &mut QueueState, submission: Submission) -> OperationHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = OperationHandle::new(id, submission.op.name().to_string(), submission.completion);
        let entry = Entry {
            handle: handle.clone(),
            op: submission.op,
            deps: submission.deps,
        };

        if !entry.is_ready() {
            let deps = entry.deps.clone();
            let queue = Arc::downgrade(self);
            self.runtime.spawn(async move {
                for dep in &deps {
                    dep.wait_finished().await;
                }
                if let Some(queue) = Weak::upgrade(&queue) {
                    queue.schedule();
                }
            });
        }

        let queue = Arc::downgrade(self);
        handle.on_release(move || {
            if let Some(queue) = Weak::upgrade(&queue) {
                queue.prune();
            }
        });

        tracing::debug!(queue = %self.name, op = handle.name(), id, "operation enqueued");
        state.pending.push_back(entry);
        handle
    }

    /// Drop pending operations cancelled through their handle
    fn prune(&self) {
        let removed: VecDeque<Entry> = {
            let mut state = self.lock();
            let (keep, removed): (VecDeque<Entry>, VecDeque<Entry>) = state
                .pending
                .drain(..)
                .partition(|e| !e.handle.is_finished());
            state.pending = keep;
            state.kinds.retain(|_, h| !h.is_finished());
            self.notify_if_idle(&state);
            removed
        };
        // Boxed operations may own other queues; drop them unlocked
        drop(removed);
    }

    /// Start every ready operation the cap allows
    fn schedule(self: &Arc<Self>) {
        let mut started = Vec::new();
        {
            let mut state = self.lock();
            // Operations cancelled through their handle never start
            state.pending.retain(|e| !e.handle.is_finished());

            while !state.suspended && state.executing.len() < self.cap {
                let Some(pos) = state.pending.iter().position(Entry::is_ready) else {
                    break;
                };
                let Some(entry) = state.pending.remove(pos) else {
                    break;
                };
                if !entry.handle.begin() {
                    continue;
                }
                state.executing.push(entry.handle.clone());
                started.push(entry);
            }
            self.notify_if_idle(&state);
        }

        for entry in started {
            self.run(entry);
        }
    }

    fn run(self: &Arc<Self>, entry: Entry) {
        let Entry {
            handle, mut op, ..
        } = entry;
        let ctx = handle.context();
        let name = handle.name().to_string();
        tracing::debug!(queue = %self.name, op = %name, id = handle.id(), "operation started");

        let work = self.runtime.spawn(async move { op.execute(&ctx).await });
        let queue = Arc::clone(self);
        self.runtime.spawn(async move {
            let result = match work.await {
                Ok(result) => result,
                Err(e) if e.is_panic() => {
                    let payload = e.into_panic();
                    let panic = payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    tracing::error!(queue = %queue.name, op = %name, panic = %panic, "operation panicked");
                    Err(OperationError::Panicked(panic))
                }
                Err(_) => Err(OperationError::Cancelled),
            };

            match &result {
                Ok(()) => tracing::debug!(queue = %queue.name, op = %name, "operation finished"),
                Err(e) if e.is_interrupted() => {
                    tracing::debug!(queue = %queue.name, op = %name, error = %e, "operation interrupted")
                }
                Err(e) => tracing::warn!(queue = %queue.name, op = %name, error = %e, "operation failed"),
            }

            handle.finish(result);
            {
                let mut state = queue.lock();
                state.executing.retain(|h| h.id() != handle.id());
                state.kinds.retain(|_, h| !h.is_finished());
            }
            queue.schedule();
        });
    }

    /// Take every outstanding operation out of the queue's hands
    fn drain(&self) -> (Vec<OperationHandle>, Vec<OperationHandle>) {
        let mut state = self.lock();
        let pending: Vec<OperationHandle> = state.pending.drain(..).map(|e| e.handle).collect();
        let executing = state.executing.clone();
        self.notify_if_idle(&state);
        (pending, executing)
    }

    fn cancel_all(&self) {
        let (pending, executing) = self.drain();
        if pending.is_empty() && executing.is_empty() {
            return;
        }
        tracing::info!(
            queue = %self.name,
            pending = pending.len(),
            executing = executing.len(),
            "cancelling all operations"
        );
        for handle in pending.iter().chain(executing.iter()) {
            handle.cancel();
        }
    }
}

/// Cancels outstanding work when the last queue clone goes away
struct Owner {
    shared: Arc<Shared>,
}

impl Drop for Owner {
    fn drop(&mut self) {
        self.shared.cancel_all();
    }
}

/// Ordered runner of [`Operation`]s.
///
/// Clones share the same queue. Must be created inside a Tokio runtime;
/// operations run on that runtime whichever thread enqueues them.
#[derive(Clone)]
pub struct OperationQueue {
    owner: Arc<Owner>,
}

impl OperationQueue {
    pub fn new(name: impl Into<String>, cap: usize) -> Self {
        Self {
            owner: Arc::new(Owner {
                shared: Arc::new(Shared {
                    name: name.into(),
                    cap: cap.max(1),
                    state: Mutex::new(QueueState::default()),
                    idle: Notify::new(),
                    next_id: AtomicU64::new(1),
                    runtime: Handle::current(),
                }),
            }),
        }
    }

    /// Queue running one operation at a time
    pub fn serial(name: impl Into<String>) -> Self {
        Self::new(name, 1)
    }

    fn shared(&self) -> &Arc<Shared> {
        &self.owner.shared
    }

    pub fn name(&self) -> &str {
        &self.shared().name
    }

    pub fn enqueue(&self, submission: Submission) -> OperationHandle {
        let shared = self.shared();
        let handle = {
            let mut state = shared.lock();
            shared.push(&mut state, submission)
        };
        shared.schedule();
        handle
    }

    /// Enqueue unless an operation tagged `kind` is pending or executing.
    ///
    /// The check and the tagging happen under one lock, so concurrent callers
    /// cannot both be admitted.
    pub fn try_enqueue_exclusive(
        &self,
        submission: Submission,
        kind: &str,
    ) -> Option<OperationHandle> {
        let shared = self.shared();
        let handle = {
            let mut state = shared.lock();
            if state.kinds.get(kind).is_some_and(|h| !h.is_finished()) {
                tracing::debug!(queue = %shared.name, kind, "refused: kind already in flight");
                return None;
            }
            let handle = shared.push(&mut state, submission);
            state.kinds.insert(kind.to_string(), handle.clone());
            handle
        };
        shared.schedule();
        Some(handle)
    }

    /// [`try_enqueue_exclusive`](Self::try_enqueue_exclusive), reporting only
    /// whether the operation was accepted
    pub fn add_exclusively(&self, submission: Submission, kind: &str) -> bool {
        self.try_enqueue_exclusive(submission, kind).is_some()
    }

    /// True if an operation tagged `kind` is pending or executing
    pub fn has_kind(&self, kind: &str) -> bool {
        self.shared()
            .lock()
            .kinds
            .get(kind)
            .is_some_and(|h| !h.is_finished())
    }

    /// Stop admitting operations. Executing ones keep running.
    pub fn suspend(&self) {
        let mut state = self.shared().lock();
        if !state.suspended {
            state.suspended = true;
            tracing::debug!(queue = %self.name(), "suspended");
        }
    }

    pub fn resume(&self) {
        {
            let mut state = self.shared().lock();
            if !state.suspended {
                return;
            }
            state.suspended = false;
            tracing::debug!(queue = %self.name(), "resumed");
        }
        self.shared().schedule();
    }

    pub fn is_suspended(&self) -> bool {
        self.shared().lock().suspended
    }

    /// Cancel every pending and executing operation
    pub fn cancel_all(&self) {
        self.shared().cancel_all();
    }

    /// Resolve every outstanding completion with `Expired` and cancel the work
    pub fn expire_outstanding(&self) {
        let (pending, executing) = self.shared().drain();
        let outstanding: Vec<&OperationHandle> = pending
            .iter()
            .chain(executing.iter())
            .filter(|h| h.state() != OperationState::Finished)
            .collect();
        if !outstanding.is_empty() {
            tracing::info!(queue = %self.name(), count = outstanding.len(), "expiring outstanding operations");
        }
        for handle in outstanding {
            handle.expire();
        }
    }

    /// Resolve every outstanding completion with `Expired`. Unlike
    /// [`expire_outstanding`](Self::expire_outstanding) the work stays queued
    /// and still runs.
    pub fn expire_completions(&self) {
        let outstanding: Vec<OperationHandle> = {
            let state = self.shared().lock();
            state
                .pending
                .iter()
                .map(|e| e.handle.clone())
                .chain(state.executing.iter().cloned())
                .collect()
        };
        if !outstanding.is_empty() {
            tracing::info!(queue = %self.name(), count = outstanding.len(), "expiring waiters");
        }
        for handle in outstanding {
            handle.expire_completion();
        }
    }

    /// Number of operations not yet started
    pub fn pending(&self) -> usize {
        self.shared().lock().pending.len()
    }

    pub fn executing(&self) -> usize {
        self.shared().lock().executing.len()
    }

    pub fn is_idle(&self) -> bool {
        self.shared().lock().is_idle()
    }

    /// Resolves when nothing is pending or executing.
    ///
    /// Pending work on a suspended queue keeps this from resolving.
    pub async fn wait_idle(&self) {
        let shared = self.shared();
        loop {
            let notified = shared.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if shared.lock().is_idle() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
