// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serial alert queue that only runs while the app is foreground-active

use crate::alerts::AlertOperation;
use crate::gate::LifecycleService;
use crate::operation::{OperationHandle, Submission};
use crate::queue::OperationQueue;
use async_trait::async_trait;
use courier_adapters::AlertSurface;
use courier_core::{AlertMessage, AppSignal, Clock, ServiceState};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy)]
struct Gate {
    started: bool,
    active: bool,
}

impl Gate {
    fn runnable(&self) -> bool {
        self.started && self.active
    }
}

/// Presents alerts one at a time, in submission order
pub struct AlertQueue<S, C> {
    queue: OperationQueue,
    surface: S,
    clock: C,
    gate: Mutex<Gate>,
}

impl<S: AlertSurface, C: Clock> AlertQueue<S, C> {
    /// `initially_active` is whether the host is foreground-active right now
    pub fn new(surface: S, clock: C, initially_active: bool) -> Self {
        let queue = OperationQueue::serial("alerts");
        queue.suspend();
        Self {
            queue,
            surface,
            clock,
            gate: Mutex::new(Gate {
                started: false,
                active: initially_active,
            }),
        }
    }

    pub fn queue(&self) -> &OperationQueue {
        &self.queue
    }

    pub fn enqueue_alert(&self, message: AlertMessage) -> OperationHandle {
        tracing::debug!(alert = %message.id, "alert queued");
        self.queue.enqueue(Submission::new(AlertOperation::new(
            message,
            self.surface.clone(),
            self.clock.clone(),
        )))
    }

    /// Cancel every queued alert and take the one on screen down
    pub fn cancel_all_alerts(&self) {
        self.queue.cancel_all();
    }

    fn update(&self, change: impl FnOnce(&mut Gate)) {
        let mut gate = self.gate.lock().unwrap_or_else(|e| e.into_inner());
        let was = gate.runnable();
        change(&mut gate);
        let now = gate.runnable();
        if was == now {
            return;
        }
        if now {
            self.queue.resume();
        } else {
            self.queue.suspend();
        }
        tracing::debug!(running = now, "alert queue gate changed");
    }
}

#[async_trait]
impl<S: AlertSurface, C: Clock> LifecycleService for AlertQueue<S, C> {
    fn name(&self) -> &str {
        "alerts"
    }

    fn state(&self) -> ServiceState {
        if self.gate.lock().unwrap_or_else(|e| e.into_inner()).started {
            ServiceState::Resumed
        } else {
            ServiceState::Suspended
        }
    }

    fn start(&self) {
        self.update(|gate| gate.started = true);
    }

    fn suspend(&self) {
        self.update(|gate| gate.started = false);
        self.queue.cancel_all();
    }

    fn on_signal(&self, signal: AppSignal) {
        match signal {
            AppSignal::DidBecomeActive => self.update(|gate| gate.active = true),
            AppSignal::WillResignActive => self.update(|gate| gate.active = false),
            AppSignal::WillEnterForeground | AppSignal::TimeWillExpire => {}
        }
    }

    async fn shutdown(&self) {
        self.suspend();
        self.queue.wait_idle().await;
    }
}

#[cfg(test)]
#[path = "alert_queue_tests.rs"]
mod tests;
