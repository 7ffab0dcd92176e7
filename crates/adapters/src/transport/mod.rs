// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Network transport adapters for reports

mod http;
mod noop;

pub use http::{HttpTransport, HttpTransportConfig};
pub use noop::NoOpTransport;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeTransport;

use async_trait::async_trait;
use courier_core::{Ack, ReportBatch};
use thiserror::Error;

/// Errors from sending a report
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("server responded with status {0}")]
    Status(u16),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("failed to encode report: {0}")]
    Encode(String),
}

/// Sends report batches. One attempt per call; retries are the caller's concern.
#[async_trait]
pub trait ReportTransport: Clone + Send + Sync + 'static {
    async fn send(&self, batch: &ReportBatch) -> Result<Ack, TransportError>;
}
