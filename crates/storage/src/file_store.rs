// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Record store backed by one WAL file per collection

use crate::state::MaterializedRecords;
use crate::wal::{Wal, WalEntry};
use async_trait::async_trait;
use courier_adapters::{RecordStore, StoreError};
use courier_core::{IdGen, Query, Record, UuidIdGen};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Compact once dead entries outnumber live records by this factor
const COMPACT_RATIO: usize = 2;
/// Small logs are never worth compacting
const COMPACT_MIN_DEAD: usize = 64;

struct Inner<R> {
    wal: Wal,
    state: MaterializedRecords<R>,
}

/// Durable store: every write is appended and synced before it is visible.
/// Reads are served from the replayed in-memory state.
pub struct FileStore<R, G = UuidIdGen> {
    path: PathBuf,
    inner: Arc<Mutex<Inner<R>>>,
    ids: G,
}

impl<R, G: Clone> Clone for FileStore<R, G> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            inner: Arc::clone(&self.inner),
            ids: self.ids.clone(),
        }
    }
}

impl<R: Record> FileStore<R, UuidIdGen> {
    /// Open `<dir>/<collection>.jsonl`, creating the directory if needed
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        Self::open_with_id_gen(dir, UuidIdGen::with_prefix(R::COLLECTION))
    }
}

impl<R: Record, G: IdGen> FileStore<R, G> {
    pub fn open_with_id_gen(dir: &Path, ids: G) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.jsonl", R::COLLECTION));

        let entries = Wal::replay::<R>(&path)?;
        let replayed = entries.len();
        let state = MaterializedRecords::from_entries(entries);
        let wal = Wal::open(&path)?;
        tracing::info!(
            path = %path.display(),
            entries = replayed,
            live = state.records().len(),
            "opened record log"
        );

        let store = Self {
            path,
            inner: Arc::new(Mutex::new(Inner { wal, state })),
            ids,
        };
        store.maybe_compact()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the log to hold only live records
    pub fn compact(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Self::compact_locked(&mut inner)
    }

    fn compact_locked(inner: &mut Inner<R>) -> Result<(), StoreError> {
        let dropped = inner.state.dead_entries();
        let snapshot = inner.state.snapshot();
        inner.wal.rewrite(&snapshot)?;
        inner.state.mark_compacted();
        tracing::debug!(
            collection = R::COLLECTION,
            live = snapshot.len(),
            dropped,
            "compacted record log"
        );
        Ok(())
    }

    fn maybe_compact(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let dead = inner.state.dead_entries();
        if dead >= COMPACT_MIN_DEAD && dead > inner.state.records().len() * COMPACT_RATIO {
            Self::compact_locked(&mut inner)?;
        }
        Ok(())
    }

    fn write(&self, entry: WalEntry<R>) -> Result<(), StoreError> {
        {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            inner.wal.append(&entry)?;
            inner.state.apply(entry);
        }
        self.maybe_compact()
    }
}

#[async_trait]
impl<R: Record, G: IdGen> RecordStore<R> for FileStore<R, G> {
    async fn append(&self, mut record: R) -> Result<String, StoreError> {
        let id = self.ids.next();
        record.set_id(id.clone());
        self.write(WalEntry::Put { record })?;
        Ok(id)
    }

    async fn find(&self, query: &Query<R>) -> Result<Vec<R>, StoreError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(query.select(inner.state.records().iter()))
    }

    async fn update(&self, record: R) -> Result<(), StoreError> {
        let exists = {
            let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            inner.state.get(record.id()).is_some()
        };
        if !exists {
            return Err(StoreError::NotFound(record.id().to_string()));
        }
        self.write(WalEntry::Put { record })
    }

    async fn delete(&self, ids: &[String]) -> Result<usize, StoreError> {
        let present = {
            let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            ids.iter().filter(|id| inner.state.get(id).is_some()).count()
        };
        if present == 0 {
            return Ok(0);
        }
        self.write(WalEntry::Delete { ids: ids.to_vec() })?;
        Ok(present)
    }
}

#[cfg(test)]
#[path = "file_store_tests.rs"]
mod tests;
