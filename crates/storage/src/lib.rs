// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! courier-storage: file-backed record store
//!
//! Each collection is a JSON-lines write-ahead log in the store directory.
//! The log is replayed into memory on open and compacted when it carries
//! more dead entries than live records.

mod file_store;
mod state;
mod wal;

pub use file_store::FileStore;
pub use state::MaterializedRecords;
pub use wal::{Wal, WalEntry, WalError};
