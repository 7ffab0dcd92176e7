// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process record store

use super::{RecordStore, StoreError};
use async_trait::async_trait;
use courier_core::{IdGen, Query, Record, UuidIdGen};
use std::sync::{Arc, Mutex};

/// Record store kept in memory. Clones share the same records.
///
/// Nothing survives a restart; hosts that need durability use the file store.
#[derive(Clone)]
pub struct MemoryStore<R, G = UuidIdGen> {
    records: Arc<Mutex<Vec<R>>>,
    ids: G,
}

impl<R: Record> MemoryStore<R, UuidIdGen> {
    pub fn new() -> Self {
        Self::with_id_gen(UuidIdGen::with_prefix(R::COLLECTION))
    }
}

impl<R: Record> Default for MemoryStore<R, UuidIdGen> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record, G: IdGen> MemoryStore<R, G> {
    pub fn with_id_gen(ids: G) -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            ids,
        }
    }

    /// Snapshot of every stored record, oldest first
    pub fn records(&self) -> Vec<R> {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl<R: Record, G: IdGen> RecordStore<R> for MemoryStore<R, G> {
    async fn append(&self, mut record: R) -> Result<String, StoreError> {
        let id = self.ids.next();
        record.set_id(id.clone());
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record);
        Ok(id)
    }

    async fn find(&self, query: &Query<R>) -> Result<Vec<R>, StoreError> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(query.select(records.iter()))
    }

    async fn update(&self, record: R) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        match records.iter_mut().find(|r| r.id() == record.id()) {
            Some(slot) => {
                *slot = record;
                Ok(())
            }
            None => Err(StoreError::NotFound(record.id().to_string())),
        }
    }

    async fn delete(&self, ids: &[String]) -> Result<usize, StoreError> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let before = records.len();
        records.retain(|r| !ids.iter().any(|id| id == r.id()));
        Ok(before - records.len())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
