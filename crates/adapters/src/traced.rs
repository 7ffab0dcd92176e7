// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::store::{RecordStore, StoreError};
use crate::transport::{ReportTransport, TransportError};
use async_trait::async_trait;
use courier_core::{Ack, Query, Record, ReportBatch};
use std::marker::PhantomData;

/// Wrapper that adds tracing to any RecordStore
pub struct TracedStore<S, R> {
    inner: S,
    _record: PhantomData<fn() -> R>,
}

impl<S, R> TracedStore<S, R> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            _record: PhantomData,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: Clone, R> Clone for TracedStore<S, R> {
    fn clone(&self) -> Self {
        Self::new(self.inner.clone())
    }
}

#[async_trait]
impl<S: RecordStore<R>, R: Record> RecordStore<R> for TracedStore<S, R> {
    async fn append(&self, record: R) -> Result<String, StoreError> {
        let span = tracing::info_span!("store.append", collection = R::COLLECTION);
        let _guard = span.enter();

        let start = std::time::Instant::now();
        let result = self.inner.append(record).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(id) => tracing::debug!(id, elapsed_ms = elapsed.as_millis() as u64, "appended"),
            Err(e) => tracing::error!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "append failed"
            ),
        }

        result
    }

    async fn find(&self, query: &Query<R>) -> Result<Vec<R>, StoreError> {
        let result = self.inner.find(query).await;
        tracing::trace!(
            collection = R::COLLECTION,
            count = result.as_ref().map(|v| v.len()).ok(),
            "found"
        );
        result
    }

    async fn update(&self, record: R) -> Result<(), StoreError> {
        let span = tracing::info_span!("store.update", collection = R::COLLECTION, id = record.id());
        let _guard = span.enter();

        let result = self.inner.update(record).await;
        match &result {
            Ok(()) => tracing::debug!("updated"),
            Err(e) => tracing::error!(error = %e, "update failed"),
        }

        result
    }

    async fn delete(&self, ids: &[String]) -> Result<usize, StoreError> {
        let span = tracing::info_span!("store.delete", collection = R::COLLECTION);
        let _guard = span.enter();

        let result = self.inner.delete(ids).await;
        match &result {
            Ok(removed) => tracing::debug!(requested = ids.len(), removed, "deleted"),
            Err(e) => tracing::error!(error = %e, "delete failed"),
        }

        result
    }
}

/// Wrapper that adds tracing to any ReportTransport
#[derive(Clone)]
pub struct TracedTransport<T> {
    inner: T,
}

impl<T> TracedTransport<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: ReportTransport> ReportTransport for TracedTransport<T> {
    async fn send(&self, batch: &ReportBatch) -> Result<Ack, TransportError> {
        let span = tracing::info_span!(
            "transport.send",
            kind = batch.kind(),
            registration_id = batch.registration_id()
        );
        let _guard = span.enter();

        tracing::info!(records = batch.len(), "sending report");

        let start = std::time::Instant::now();
        let result = self.inner.send(batch).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(ack) => tracing::info!(
                accepted = ack.accepted,
                elapsed_ms = elapsed.as_millis() as u64,
                "report accepted"
            ),
            // Data stays persisted and is retried on the next flush
            Err(e) => tracing::warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "report failed"
            ),
        }

        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
