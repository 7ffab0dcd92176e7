// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Report batches handed to the network transport

use crate::event::EventRecord;
use crate::session::SessionReport;
use chrono::SecondsFormat;
use serde_json::{json, Map, Value};

/// One network report
#[derive(Debug, Clone, PartialEq)]
pub enum ReportBatch {
    Events {
        registration_id: String,
        events: Vec<EventRecord>,
    },
    Sessions {
        registration_id: String,
        report: SessionReport,
    },
}

impl ReportBatch {
    pub fn kind(&self) -> &'static str {
        match self {
            ReportBatch::Events { .. } => "events",
            ReportBatch::Sessions { .. } => "sessions",
        }
    }

    pub fn registration_id(&self) -> &str {
        match self {
            ReportBatch::Events {
                registration_id, ..
            }
            | ReportBatch::Sessions {
                registration_id, ..
            } => registration_id,
        }
    }

    /// Number of records carried
    pub fn len(&self) -> usize {
        match self {
            ReportBatch::Events { events, .. } => events.len(),
            ReportBatch::Sessions { report, .. } => report.started.len() + report.finished.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// JSON request body
    pub fn body(&self) -> Value {
        match self {
            ReportBatch::Events { events, .. } => json!({
                "events": events
                    .iter()
                    .map(|e| json!({
                        "definitionId": e.definition_id,
                        "properties": e.properties,
                        "date": e.event_date.to_rfc3339_opts(SecondsFormat::Millis, true),
                    }))
                    .collect::<Vec<_>>(),
            }),
            ReportBatch::Sessions { report, .. } => {
                let starts: Vec<String> = report
                    .started
                    .iter()
                    .map(|s| s.start.to_rfc3339_opts(SecondsFormat::Millis, true))
                    .collect();
                let bounds: Map<String, Value> = report
                    .finished
                    .iter()
                    .map(|s| {
                        (
                            s.session_id(),
                            json!([
                                s.start.to_rfc3339_opts(SecondsFormat::Millis, true),
                                s.end.to_rfc3339_opts(SecondsFormat::Millis, true),
                            ]),
                        )
                    })
                    .collect();
                json!({ "sessionStarts": starts, "sessionBounds": bounds })
            }
        }
    }
}

/// Server acknowledgement of a report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ack {
    pub accepted: usize,
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
