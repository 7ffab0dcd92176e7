// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle gating for schedulable services

use crate::queue::OperationQueue;
use async_trait::async_trait;
use courier_core::{AppSignal, GateEffect, GateEvent, ServiceState};
use std::sync::Mutex;

/// A service driven by SDK start/stop and app lifecycle signals
#[async_trait]
pub trait LifecycleService: Send + Sync {
    fn name(&self) -> &str;

    fn state(&self) -> ServiceState;

    fn start(&self);

    fn suspend(&self);

    fn on_signal(&self, signal: AppSignal);

    /// Suspend and wait for in-flight work to exit
    async fn shutdown(&self);
}

/// Holds a service's gate state and carries out the queue effects.
///
/// Effects on timers and reporting are returned to the service, which owns
/// those resources.
pub struct LifecycleGate {
    name: &'static str,
    state: Mutex<ServiceState>,
    queues: Vec<OperationQueue>,
}

impl LifecycleGate {
    /// Gate starting `Suspended`, with its queues suspended to match
    pub fn new(name: &'static str, queues: Vec<OperationQueue>) -> Self {
        for queue in &queues {
            queue.suspend();
        }
        Self {
            name,
            state: Mutex::new(ServiceState::Suspended),
            queues,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> ServiceState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn queues(&self) -> &[OperationQueue] {
        &self.queues
    }

    /// Apply `event`, returning the effects left for the service
    pub fn handle(&self, event: GateEvent) -> Vec<GateEffect> {
        let (from, to, effects) = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            let from = *state;
            let (to, effects) = from.transition(event);
            *state = to;
            (from, to, effects)
        };
        if from != to {
            tracing::info!(service = self.name, ?from, ?to, "gate transition");
        }

        let mut remaining = Vec::new();
        for effect in effects {
            match effect {
                GateEffect::ResumeQueues => self.queues.iter().for_each(OperationQueue::resume),
                GateEffect::SuspendQueues => self.queues.iter().for_each(OperationQueue::suspend),
                GateEffect::CancelQueues => self.queues.iter().for_each(OperationQueue::cancel_all),
                other => remaining.push(other),
            }
        }
        remaining
    }

    /// Wait until every queue is idle
    pub async fn wait_idle(&self) {
        for queue in &self.queues {
            queue.wait_idle().await;
        }
    }
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
