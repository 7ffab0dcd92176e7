// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Custom events submitted by the host application

use crate::record::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Structural problems with a submitted event. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventValidationError {
    #[error("event definition id is empty")]
    EmptyDefinitionId,
    #[error("property {0:?} must be a string, number or boolean")]
    UnsupportedProperty(String),
}

/// A custom event as submitted by the application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomEvent {
    /// Id of the event definition created on the portal
    pub definition_id: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
}

impl CustomEvent {
    pub fn new(definition_id: impl Into<String>) -> Self {
        Self {
            definition_id: definition_id.into(),
            properties: Map::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Only flat scalar properties are accepted by the backend
    pub fn validate(&self) -> Result<(), EventValidationError> {
        if self.definition_id.trim().is_empty() {
            return Err(EventValidationError::EmptyDefinitionId);
        }
        for (key, value) in &self.properties {
            match value {
                Value::String(_) | Value::Number(_) | Value::Bool(_) => {}
                _ => return Err(EventValidationError::UnsupportedProperty(key.clone())),
            }
        }
        Ok(())
    }
}

/// A persisted, not yet reported event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(default)]
    pub id: String,
    pub definition_id: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
    pub event_date: DateTime<Utc>,
    pub registration_id: String,
}

impl EventRecord {
    pub fn new(event: CustomEvent, registration_id: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: String::new(),
            definition_id: event.definition_id,
            properties: event.properties,
            event_date: at,
            registration_id: registration_id.into(),
        }
    }
}

impl Record for EventRecord {
    const COLLECTION: &'static str = "events";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
