// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable record store adapters

mod memory;

pub use memory::MemoryStore;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeStore, StoreCall};

use async_trait::async_trait;
use courier_core::{Query, Record};
use thiserror::Error;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable storage for one record type
///
/// Implementations keep insertion order; [`Query`] ordering is relative to it.
#[async_trait]
pub trait RecordStore<R: Record>: Clone + Send + Sync + 'static {
    /// Persist a new record, assigning its id
    async fn append(&self, record: R) -> Result<String, StoreError>;

    /// Look up records
    async fn find(&self, query: &Query<R>) -> Result<Vec<R>, StoreError>;

    /// Replace the record with the same id
    async fn update(&self, record: R) -> Result<(), StoreError>;

    /// Remove records by id, returning how many existed
    async fn delete(&self, ids: &[String]) -> Result<usize, StoreError>;
}
