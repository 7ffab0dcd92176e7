// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O

pub mod identity;
pub mod store;
pub mod surface;
pub mod traced;
pub mod transport;

pub use identity::{InstallationIdentity, SharedIdentity};
pub use store::{MemoryStore, RecordStore, StoreError};
pub use surface::{AlertStyle, AlertSurface, HeadlessSurface, PresentationError};
pub use traced::{TracedStore, TracedTransport};
pub use transport::{
    HttpTransport, HttpTransportConfig, NoOpTransport, ReportTransport, TransportError,
};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use store::{FakeStore, StoreCall};
#[cfg(any(test, feature = "test-support"))]
pub use surface::{FakeSurface, SurfaceCall};
#[cfg(any(test, feature = "test-support"))]
pub use transport::FakeTransport;
