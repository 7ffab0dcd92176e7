// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! courier-engine: lifecycle-gated operation scheduling
//!
//! Operation queues with dependencies and exclusive admission, the
//! persist-then-report pipeline behind the events and sessions services, the
//! serial alert queue, and the hub that fans lifecycle signals out to them.

mod alert_queue;
mod alerts;
mod error;
mod events;
mod gate;
mod hub;
mod operation;
mod pipeline;
mod postponer;
mod queue;
mod sessions;
mod timer;

#[cfg(test)]
mod testing;

pub use alert_queue::AlertQueue;
pub use alerts::{AlertOperation, Presenter};
pub use error::OperationError;
pub use events::EventsService;
pub use gate::{LifecycleGate, LifecycleService};
pub use hub::ServiceHub;
pub use operation::{
    Completion, Operation, OperationContext, OperationHandle, OperationState, Submission,
};
pub use pipeline::ReportPipeline;
pub use postponer::Postponer;
pub use queue::OperationQueue;
pub use sessions::SessionService;
pub use timer::RepeatingTimer;
