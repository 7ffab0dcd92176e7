// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake alert surface for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{AlertStyle, AlertSurface, PresentationError};
use async_trait::async_trait;
use courier_core::{AlertMessage, DismissSignal};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Recorded surface call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    Preload { id: String },
    Present { id: String, style: AlertStyle },
    Dismiss { id: String },
}

#[derive(Default)]
struct FakeSurfaceState {
    calls: Vec<SurfaceCall>,
    on_screen: HashMap<String, DismissSignal>,
    preload_failure: Option<String>,
    present_failure: Option<PresentationError>,
}

/// Fake surface. Alerts stay on screen until the test ends them.
#[derive(Clone)]
pub struct FakeSurface {
    state: Arc<Mutex<FakeSurfaceState>>,
    presented: Arc<watch::Sender<usize>>,
}

impl FakeSurface {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeSurfaceState::default())),
            presented: Arc::new(watch::channel(0).0),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeSurfaceState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.lock().calls.clone()
    }

    /// Ids of presented messages, in presentation order
    pub fn presented(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                SurfaceCall::Present { id, .. } => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    /// Ids currently on screen
    pub fn on_screen(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().on_screen.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Simulate the user dismissing `id`. Returns false if it is not on screen.
    pub fn user_dismiss(&self, id: &str) -> bool {
        let signal = self.lock().on_screen.remove(id);
        signal.is_some_and(|signal| signal.dismissed())
    }

    /// Simulate the surface failing while `id` is on screen
    pub fn fail_on_screen(&self, id: &str, reason: &str) -> bool {
        let signal = self.lock().on_screen.remove(id);
        signal.is_some_and(|signal| signal.failed(reason))
    }

    pub fn set_preload_failure(&self, reason: Option<&str>) {
        self.lock().preload_failure = reason.map(str::to_string);
    }

    pub fn set_present_failure(&self, error: Option<PresentationError>) {
        self.lock().present_failure = error;
    }

    /// Wait until at least `n` alerts have been presented
    pub async fn wait_for_presentations(&self, n: usize) {
        let mut rx = self.presented.subscribe();
        let _ = rx.wait_for(|count| *count >= n).await;
    }
}

impl Default for FakeSurface {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertSurface for FakeSurface {
    async fn preload(&self, message: &AlertMessage) -> Result<(), PresentationError> {
        let mut state = self.lock();
        state.calls.push(SurfaceCall::Preload {
            id: message.id.clone(),
        });
        match &state.preload_failure {
            Some(reason) => Err(PresentationError::LoadFailed(reason.clone())),
            None => Ok(()),
        }
    }

    async fn present(
        &self,
        message: &AlertMessage,
        style: AlertStyle,
        signal: DismissSignal,
    ) -> Result<(), PresentationError> {
        {
            let mut state = self.lock();
            if let Some(error) = state.present_failure.clone() {
                return Err(error);
            }
            state.calls.push(SurfaceCall::Present {
                id: message.id.clone(),
                style,
            });
            state.on_screen.insert(message.id.clone(), signal);
        }
        self.presented.send_modify(|count| *count += 1);
        Ok(())
    }

    async fn dismiss(&self, message_id: &str) {
        let mut state = self.lock();
        state.calls.push(SurfaceCall::Dismiss {
            id: message_id.to_string(),
        });
        state.on_screen.remove(message_id);
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
