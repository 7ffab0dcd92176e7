// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fan-out of SDK start/stop and app lifecycle signals to every service

use crate::gate::LifecycleService;
use courier_core::AppSignal;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Registered services, driven together
#[derive(Clone, Default)]
pub struct ServiceHub {
    services: Vec<Arc<dyn LifecycleService>>,
}

impl ServiceHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, service: Arc<dyn LifecycleService>) {
        tracing::debug!(service = service.name(), "service registered");
        self.services.push(service);
    }

    pub fn services(&self) -> &[Arc<dyn LifecycleService>] {
        &self.services
    }

    pub fn start_all(&self) {
        for service in &self.services {
            service.start();
        }
        tracing::info!(services = self.services.len(), "services started");
    }

    pub fn suspend_all(&self) {
        for service in &self.services {
            service.suspend();
        }
        tracing::info!(services = self.services.len(), "services suspended");
    }

    /// Deliver `signal` to every service in registration order
    pub fn dispatch(&self, signal: AppSignal) {
        tracing::info!(signal = signal.name(), "app signal");
        for service in &self.services {
            service.on_signal(signal);
        }
    }

    /// Suspend every service and wait for in-flight work to exit
    pub async fn shutdown(&self) {
        for service in &self.services {
            service.shutdown().await;
        }
        tracing::info!("services shut down");
    }

    /// Dispatch signals from `signals` until it closes or `stop` fires
    pub async fn run(&self, mut signals: mpsc::Receiver<AppSignal>, stop: CancellationToken) {
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                signal = signals.recv() => match signal {
                    Some(signal) => self.dispatch(signal),
                    None => break,
                },
            }
        }
        tracing::debug!("signal loop stopped");
    }
}

#[cfg(test)]
#[path = "hub_tests.rs"]
mod tests;
