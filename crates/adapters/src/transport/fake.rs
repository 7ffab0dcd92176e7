// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake transport for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ReportTransport, TransportError};
use async_trait::async_trait;
use courier_core::{Ack, ReportBatch};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

#[derive(Default)]
struct FakeTransportState {
    attempts: Vec<ReportBatch>,
    delivered: Vec<ReportBatch>,
    scripted: VecDeque<TransportError>,
    failing: Option<TransportError>,
    in_flight: usize,
    max_in_flight: usize,
}

/// Fake transport with recording, scripted failures and a hold gate.
///
/// While held, every `send` blocks after it is recorded as an attempt, so
/// tests can observe a report in flight.
#[derive(Clone)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeTransportState>>,
    held: Arc<watch::Sender<bool>>,
    started: Arc<watch::Sender<usize>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeTransportState::default())),
            held: Arc::new(watch::channel(false).0),
            started: Arc::new(watch::channel(0).0),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeTransportState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Every batch passed to `send`, including failed ones
    pub fn attempts(&self) -> Vec<ReportBatch> {
        self.lock().attempts.clone()
    }

    /// Batches that were acknowledged
    pub fn delivered(&self) -> Vec<ReportBatch> {
        self.lock().delivered.clone()
    }

    /// Highest number of sends observed in flight at once
    pub fn max_in_flight(&self) -> usize {
        self.lock().max_in_flight
    }

    /// Fail the next send with `error`; queued failures are used in order
    pub fn fail_next(&self, error: TransportError) {
        self.lock().scripted.push_back(error);
    }

    /// Fail every send with `error` until cleared with `None`
    pub fn set_failing(&self, error: Option<TransportError>) {
        self.lock().failing = error;
    }

    /// Block sends until [`release`](Self::release)
    pub fn hold(&self) {
        self.held.send_replace(true);
    }

    pub fn release(&self) {
        self.held.send_replace(false);
    }

    /// Wait until at least `n` sends have started
    pub async fn wait_for_sends(&self, n: usize) {
        let mut rx = self.started.subscribe();
        // The sender lives in self, so the channel cannot close here
        let _ = rx.wait_for(|count| *count >= n).await;
    }
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportTransport for FakeTransport {
    async fn send(&self, batch: &ReportBatch) -> Result<Ack, TransportError> {
        {
            let mut state = self.lock();
            state.attempts.push(batch.clone());
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
        }
        self.started.send_modify(|count| *count += 1);

        let mut held = self.held.subscribe();
        let _ = held.wait_for(|held| !*held).await;

        let mut state = self.lock();
        state.in_flight -= 1;
        let failure = state.scripted.pop_front().or_else(|| state.failing.clone());
        match failure {
            Some(error) => Err(error),
            None => {
                state.delivered.push(batch.clone());
                Ok(Ack {
                    accepted: batch.len(),
                })
            }
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
