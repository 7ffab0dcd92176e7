// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle gating state machine
//!
//! Every schedulable service is either `Suspended` or `Resumed`. Explicit
//! start/suspend gate the whole service (queues and timer); app
//! foreground/background signals only touch the timer so an in-flight report
//! survives a short trip to the background.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Signals delivered by the host application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppSignal {
    WillEnterForeground,
    DidBecomeActive,
    WillResignActive,
    /// The background execution budget is about to run out
    TimeWillExpire,
}

impl AppSignal {
    pub fn name(&self) -> &'static str {
        match self {
            AppSignal::WillEnterForeground => "will_enter_foreground",
            AppSignal::DidBecomeActive => "did_become_active",
            AppSignal::WillResignActive => "will_resign_active",
            AppSignal::TimeWillExpire => "time_will_expire",
        }
    }
}

impl fmt::Display for AppSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown app signal: {0}")]
pub struct UnknownSignal(pub String);

impl FromStr for AppSignal {
    type Err = UnknownSignal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "will_enter_foreground" | "foreground" => Ok(AppSignal::WillEnterForeground),
            "did_become_active" | "active" => Ok(AppSignal::DidBecomeActive),
            "will_resign_active" | "resign" => Ok(AppSignal::WillResignActive),
            "time_will_expire" | "expire" => Ok(AppSignal::TimeWillExpire),
            other => Err(UnknownSignal(other.to_string())),
        }
    }
}

/// Gate state of a service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ServiceState {
    #[default]
    Suspended,
    Resumed,
}

/// Inputs to the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateEvent {
    Start,
    Suspend,
    App(AppSignal),
}

/// Side effects the owning service must carry out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateEffect {
    ResumeQueues,
    SuspendQueues,
    CancelQueues,
    StartTimer,
    ResumeTimer,
    SuspendTimer,
    StopTimer,
    MarkReportingNeeded,
    ExpireReports,
}

impl ServiceState {
    /// Pure transition function - returns new state and effects
    pub fn transition(self, event: GateEvent) -> (ServiceState, Vec<GateEffect>) {
        use GateEffect::*;
        use ServiceState::*;

        match (self, event) {
            (Suspended, GateEvent::Start) => (Resumed, vec![ResumeQueues, StartTimer]),
            (Resumed, GateEvent::Suspend) => {
                (Suspended, vec![StopTimer, SuspendQueues, CancelQueues])
            }
            // Repeated start/suspend are no-ops
            (Resumed, GateEvent::Start) | (Suspended, GateEvent::Suspend) => (self, vec![]),

            (_, GateEvent::App(AppSignal::WillEnterForeground)) => (self, vec![MarkReportingNeeded]),
            (_, GateEvent::App(AppSignal::TimeWillExpire)) => (self, vec![ExpireReports]),
            (Resumed, GateEvent::App(AppSignal::DidBecomeActive)) => (self, vec![ResumeTimer]),
            (Resumed, GateEvent::App(AppSignal::WillResignActive)) => (self, vec![SuspendTimer]),
            (Suspended, GateEvent::App(_)) => (self, vec![]),
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
