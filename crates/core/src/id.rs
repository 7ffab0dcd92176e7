// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Record identifier generation

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Generates unique record identifiers
pub trait IdGen: Clone + Send + Sync + 'static {
    fn next(&self) -> String;
}

/// UUID-based generator for production stores
///
/// Ids look like `evt-0b8c...` when a prefix is set, a bare UUID otherwise.
#[derive(Clone, Debug, Default)]
pub struct UuidIdGen {
    prefix: Option<&'static str>,
}

impl UuidIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: &'static str) -> Self {
        Self {
            prefix: Some(prefix),
        }
    }
}

impl IdGen for UuidIdGen {
    fn next(&self) -> String {
        let uuid = uuid::Uuid::new_v4();
        match self.prefix {
            Some(prefix) => format!("{}-{}", prefix, uuid),
            None => uuid.to_string(),
        }
    }
}

/// Sequential generator for tests: `prefix-1`, `prefix-2`, ...
#[derive(Clone)]
pub struct SequentialIdGen {
    prefix: String,
    counter: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::new("rec")
    }
}

impl IdGen for SequentialIdGen {
    fn next(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}", self.prefix, n)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
