// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op transport for offline hosts

use super::{ReportTransport, TransportError};
use async_trait::async_trait;
use courier_core::{Ack, ReportBatch};

/// Transport that acknowledges everything without sending it.
///
/// Used when no backend is configured; persisted data is still flushed.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpTransport;

impl NoOpTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ReportTransport for NoOpTransport {
    async fn send(&self, batch: &ReportBatch) -> Result<Ack, TransportError> {
        Ok(Ack {
            accepted: batch.len(),
        })
    }
}
