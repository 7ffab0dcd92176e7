// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User session windows
//!
//! A session is kept alive by periodic heartbeats. A heartbeat extends any
//! session whose end lies within the timeout window, otherwise it opens a new
//! session with a minimum length of one save interval. Sessions whose end is
//! older than the timeout are finished and get reported once, then deleted.

use crate::record::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A persisted session window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default)]
    pub id: String,
    pub registration_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub start_reported: bool,
}

impl Record for SessionRecord {
    const COLLECTION: &'static str = "sessions";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl SessionRecord {
    /// Identifier reported to the backend: `{registration}_{start epoch secs}`
    pub fn session_id(&self) -> String {
        format!("{}_{}", self.registration_id, self.start.timestamp())
    }
}

/// What a heartbeat does to the stored sessions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Heartbeat {
    /// Push the end of these still-current sessions to now
    Extend(Vec<SessionRecord>),
    /// No current session; open this one
    Open(SessionRecord),
}

/// Session timing rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    /// A session whose end is older than this is finished
    pub timeout: Duration,
    /// Heartbeat period; also the minimum session length
    pub save_interval: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            save_interval: Duration::from_secs(5),
        }
    }
}

impl SessionPolicy {
    fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - chrono::Duration::from_std(self.timeout).unwrap_or_else(|_| chrono::Duration::zero())
    }

    pub fn is_current(&self, record: &SessionRecord, now: DateTime<Utc>) -> bool {
        record.end > self.cutoff(now)
    }

    pub fn is_finished(&self, record: &SessionRecord, now: DateTime<Utc>) -> bool {
        !self.is_current(record, now)
    }

    /// Decide the heartbeat given the sessions that are still current
    pub fn heartbeat(
        &self,
        current: Vec<SessionRecord>,
        registration_id: &str,
        now: DateTime<Utc>,
    ) -> Heartbeat {
        if current.is_empty() {
            let min_len = chrono::Duration::from_std(self.save_interval)
                .unwrap_or_else(|_| chrono::Duration::zero());
            return Heartbeat::Open(SessionRecord {
                id: String::new(),
                registration_id: registration_id.to_string(),
                start: now,
                end: now + min_len,
                start_reported: false,
            });
        }
        Heartbeat::Extend(
            current
                .into_iter()
                .map(|record| SessionRecord {
                    end: now,
                    registration_id: registration_id.to_string(),
                    ..record
                })
                .collect(),
        )
    }

    /// Split stored sessions into what a report must carry
    pub fn report(&self, records: &[SessionRecord], now: DateTime<Utc>) -> SessionReport {
        SessionReport {
            started: records
                .iter()
                .filter(|r| !r.start_reported)
                .cloned()
                .collect(),
            finished: records
                .iter()
                .filter(|r| self.is_finished(r, now))
                .cloned()
                .collect(),
        }
    }
}

/// Sessions to announce: newly started ones and finished ones
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    pub started: Vec<SessionRecord>,
    pub finished: Vec<SessionRecord>,
}

impl SessionReport {
    pub fn is_empty(&self) -> bool {
        self.started.is_empty() && self.finished.is_empty()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
