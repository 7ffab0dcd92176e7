// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! courier-core: domain types for the courier scheduler
//!
//! This crate provides:
//! - The lifecycle gate state machine shared by every service
//! - Records persisted by the event and session pipelines
//! - Alert messages and the single-use dismissal signal
//! - Clock, id generation and configuration

pub mod alert;
pub mod clock;
pub mod config;
pub mod event;
pub mod id;
pub mod lifecycle;
pub mod record;
pub mod report;
pub mod session;

pub use alert::{dismissal, AlertMessage, DismissSignal, DismissWait, MessageVariant, PresentationEnd};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, SchedulerConfig};
pub use event::{CustomEvent, EventRecord, EventValidationError};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use lifecycle::{AppSignal, GateEffect, GateEvent, ServiceState, UnknownSignal};
pub use record::{Order, Query, Record};
pub use report::{Ack, ReportBatch};
pub use session::{Heartbeat, SessionPolicy, SessionRecord, SessionReport};
