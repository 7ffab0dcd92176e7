// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized records from WAL replay

use crate::wal::WalEntry;
use courier_core::Record;

/// Live records of one collection, in first-insertion order
#[derive(Debug)]
pub struct MaterializedRecords<R> {
    records: Vec<R>,
    /// Entries applied that no longer describe a live record
    dead: usize,
}

impl<R> Default for MaterializedRecords<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            dead: 0,
        }
    }
}

impl<R: Record> MaterializedRecords<R> {
    pub fn from_entries(entries: impl IntoIterator<Item = WalEntry<R>>) -> Self {
        let mut state = Self::default();
        for entry in entries {
            state.apply(entry);
        }
        state
    }

    /// Apply an entry to update the state
    pub fn apply(&mut self, entry: WalEntry<R>) {
        match entry {
            WalEntry::Put { record } => {
                match self.records.iter_mut().find(|r| r.id() == record.id()) {
                    Some(slot) => {
                        *slot = record;
                        self.dead += 1;
                    }
                    None => self.records.push(record),
                }
            }

            WalEntry::Delete { ids } => {
                let before = self.records.len();
                self.records.retain(|r| !ids.iter().any(|id| id == r.id()));
                // The delete entry itself plus each put it buried
                self.dead += 1 + (before - self.records.len());
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&R> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    /// Number of log entries that compaction would drop
    pub fn dead_entries(&self) -> usize {
        self.dead
    }

    /// Entries that rebuild exactly this state
    pub fn snapshot(&self) -> Vec<WalEntry<R>> {
        self.records
            .iter()
            .cloned()
            .map(|record| WalEntry::Put { record })
            .collect()
    }

    pub fn mark_compacted(&mut self) {
        self.dead = 0;
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
