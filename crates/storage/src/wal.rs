// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead log for durable record storage

use courier_adapters::StoreError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur in WAL operations
#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<WalError> for StoreError {
    fn from(e: WalError) -> Self {
        match e {
            WalError::Io(e) => StoreError::Io(e),
            WalError::Json(e) => StoreError::Json(e),
        }
    }
}

/// One mutation of a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WalEntry<R> {
    /// Insert or replace the record with the same id
    Put { record: R },
    Delete { ids: Vec<String> },
}

#[derive(Serialize, Deserialize)]
struct Line<R> {
    seq: u64,
    #[serde(flatten)]
    entry: WalEntry<R>,
}

/// Append-only log of collection mutations
pub struct Wal {
    path: PathBuf,
    file: File,
    sequence: u64,
}

impl Wal {
    /// Open or create a WAL at the given path
    pub fn open(path: &Path) -> Result<Self, WalError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)?;

        // Count existing entries to set sequence number
        let reader = BufReader::new(File::open(path)?);
        let sequence = reader.lines().count() as u64;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            sequence,
        })
    }

    /// Append an entry to the log
    pub fn append<R: Serialize>(&mut self, entry: &WalEntry<R>) -> Result<u64, WalError> {
        let line = serde_json::to_string(&LineRef {
            seq: self.sequence + 1,
            entry,
        })?;
        writeln!(self.file, "{}", line)?;
        self.file.sync_all()?;
        self.sequence += 1;
        Ok(self.sequence)
    }

    /// Get the current sequence number
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Replay all entries from the log.
    ///
    /// A torn final line (a write cut short by a crash) is dropped; damage
    /// anywhere else is an error.
    pub fn replay<R: DeserializeOwned>(path: &Path) -> Result<Vec<WalEntry<R>>, WalError> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let lines: Vec<String> = BufReader::new(file)
            .lines()
            .collect::<Result<_, _>>()?;
        let last = lines.iter().rposition(|l| !l.is_empty());
        let mut entries = Vec::new();

        for (index, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Line<R>>(line) {
                Ok(parsed) => entries.push(parsed.entry),
                Err(e) if Some(index) == last => {
                    tracing::warn!(path = %path.display(), error = %e, "dropping torn wal tail");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(entries)
    }

    /// Replace the log with `entries`, atomically via a sibling temp file
    pub fn rewrite<R: Serialize>(&mut self, entries: &[WalEntry<R>]) -> Result<(), WalError> {
        let tmp = self.path.with_extension("compact");
        {
            let mut out = File::create(&tmp)?;
            for (index, entry) in entries.iter().enumerate() {
                let line = serde_json::to_string(&LineRef {
                    seq: index as u64 + 1,
                    entry,
                })?;
                writeln!(out, "{}", line)?;
            }
            out.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;

        self.file = OpenOptions::new().append(true).read(true).open(&self.path)?;
        self.sequence = entries.len() as u64;
        Ok(())
    }
}

#[derive(Serialize)]
struct LineRef<'a, R> {
    seq: u64,
    #[serde(flatten)]
    entry: &'a WalEntry<R>,
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
