// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake record store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{MemoryStore, RecordStore, StoreError};
use async_trait::async_trait;
use courier_core::{Query, Record, SequentialIdGen};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Append { collection: &'static str },
    Find { collection: &'static str },
    Update { id: String },
    Delete { ids: Vec<String> },
}

/// Fake store with call recording and failure injection
#[derive(Clone)]
pub struct FakeStore<R> {
    inner: MemoryStore<R, SequentialIdGen>,
    calls: Arc<Mutex<Vec<StoreCall>>>,
    fail_writes: Arc<AtomicBool>,
}

impl<R: Record> FakeStore<R> {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::with_id_gen(SequentialIdGen::new(R::COLLECTION)),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Snapshot of stored records
    pub fn records(&self) -> Vec<R> {
        self.inner.records()
    }

    /// Make append/update/delete fail until reset
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn record(&self, call: StoreCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected write failure".to_string()));
        }
        Ok(())
    }
}

impl<R: Record> Default for FakeStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for FakeStore<R> {
    async fn append(&self, record: R) -> Result<String, StoreError> {
        self.record(StoreCall::Append {
            collection: R::COLLECTION,
        });
        self.check_writable()?;
        self.inner.append(record).await
    }

    async fn find(&self, query: &Query<R>) -> Result<Vec<R>, StoreError> {
        self.record(StoreCall::Find {
            collection: R::COLLECTION,
        });
        self.inner.find(query).await
    }

    async fn update(&self, record: R) -> Result<(), StoreError> {
        self.record(StoreCall::Update {
            id: record.id().to_string(),
        });
        self.check_writable()?;
        self.inner.update(record).await
    }

    async fn delete(&self, ids: &[String]) -> Result<usize, StoreError> {
        self.record(StoreCall::Delete { ids: ids.to_vec() });
        self.check_writable()?;
        self.inner.delete(ids).await
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
