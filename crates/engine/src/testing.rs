// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operations and helpers shared by the engine's unit tests

use crate::error::OperationError;
use crate::operation::{Operation, OperationContext};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, watch};

/// Shared, ordered log of what test operations did
#[derive(Clone, Default)]
pub(crate) struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    pub(crate) fn push(&self, line: impl Into<String>) {
        self.0.lock().unwrap().push(line.into());
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Logs its label and succeeds
pub(crate) struct Recorder {
    pub(crate) label: String,
    pub(crate) log: Log,
}

impl Recorder {
    pub(crate) fn new(label: &str, log: &Log) -> Self {
        Self {
            label: label.to_string(),
            log: log.clone(),
        }
    }
}

#[async_trait]
impl Operation for Recorder {
    fn name(&self) -> &str {
        &self.label
    }

    async fn execute(&mut self, _ctx: &OperationContext) -> Result<(), OperationError> {
        self.log.push(self.label.clone());
        Ok(())
    }
}

/// Gate shared by [`Held`] operations
#[derive(Clone)]
pub(crate) struct Latch(Arc<watch::Sender<bool>>);

impl Latch {
    pub(crate) fn new() -> Self {
        Self(Arc::new(watch::channel(false).0))
    }

    pub(crate) fn open(&self) {
        self.0.send_replace(true);
    }
}

/// Runs until its latch opens or it is cancelled
pub(crate) struct Held {
    label: String,
    log: Log,
    latch: watch::Receiver<bool>,
    started: Option<oneshot::Sender<()>>,
}

impl Held {
    pub(crate) fn new(label: &str, log: &Log, latch: &Latch) -> Self {
        Self {
            label: label.to_string(),
            log: log.clone(),
            latch: latch.0.subscribe(),
            started: None,
        }
    }

    /// Also report when execution begins
    pub(crate) fn with_started(mut self) -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        self.started = Some(tx);
        (self, rx)
    }
}

#[async_trait]
impl Operation for Held {
    fn name(&self) -> &str {
        &self.label
    }

    async fn execute(&mut self, ctx: &OperationContext) -> Result<(), OperationError> {
        self.log.push(format!("start:{}", self.label));
        if let Some(tx) = self.started.take() {
            let _ = tx.send(());
        }
        tokio::select! {
            _ = self.latch.wait_for(|open| *open) => {
                self.log.push(format!("end:{}", self.label));
                Ok(())
            }
            _ = ctx.cancelled() => {
                self.log.push(format!("cancelled:{}", self.label));
                Err(OperationError::Cancelled)
            }
        }
    }
}

/// Fails with a fixed error
pub(crate) struct Fails(pub(crate) OperationError);

#[async_trait]
impl Operation for Fails {
    fn name(&self) -> &str {
        "fails"
    }

    async fn execute(&mut self, _ctx: &OperationContext) -> Result<(), OperationError> {
        Err(self.0.clone())
    }
}

pub(crate) struct Panics;

#[async_trait]
impl Operation for Panics {
    fn name(&self) -> &str {
        "panics"
    }

    async fn execute(&mut self, _ctx: &OperationContext) -> Result<(), OperationError> {
        panic!("boom")
    }
}

/// Completion that forwards the outcome to a receiver
pub(crate) fn outcome() -> (
    impl FnOnce(Result<(), OperationError>) + Send + 'static,
    oneshot::Receiver<Result<(), OperationError>>,
) {
    let (tx, rx) = oneshot::channel();
    (
        move |result| {
            let _ = tx.send(result);
        },
        rx,
    )
}
