// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line commands read from stdin.
//!
//! ```text
//! foreground | active | resign | expire     app lifecycle signal
//! event <definition-id> [json-object]       record a custom event
//! event! <definition-id> [json-object]      record and report now
//! alert <id> <text>                         native alert
//! web-alert <id> <url> <text>               rich alert
//! cancel-alerts | flush | session | status
//! register <registration-id> | unregister
//! quit
//! ```

use courier_core::{AlertMessage, AppSignal, CustomEvent};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Signal(AppSignal),
    Event { event: CustomEvent, immediately: bool },
    Alert(AlertMessage),
    CancelAlerts,
    Register(Option<String>),
    Flush,
    Session,
    Status,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty line")]
    Empty,
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("missing {0}")]
    Missing(&'static str),
    #[error("properties must be a JSON object: {0}")]
    Properties(String),
}

/// Split off the first whitespace-delimited word
fn word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (input, ""),
    }
}

fn required<'a>(value: &'a str, what: &'static str) -> Result<&'a str, CommandError> {
    if value.is_empty() {
        Err(CommandError::Missing(what))
    } else {
        Ok(value)
    }
}

fn parse_event(rest: &str, immediately: bool) -> Result<Command, CommandError> {
    let (definition_id, properties) = word(rest);
    let mut event = CustomEvent::new(required(definition_id, "definition id")?);
    if !properties.is_empty() {
        let value: serde_json::Value = serde_json::from_str(properties)
            .map_err(|e| CommandError::Properties(e.to_string()))?;
        let serde_json::Value::Object(map) = value else {
            return Err(CommandError::Properties(properties.to_string()));
        };
        for (key, value) in map {
            event = event.with_property(key, value);
        }
    }
    Ok(Command::Event { event, immediately })
}

pub fn parse(line: &str) -> Result<Command, CommandError> {
    let (name, rest) = word(line);
    if name.is_empty() {
        return Err(CommandError::Empty);
    }
    if let Ok(signal) = name.parse::<AppSignal>() {
        return Ok(Command::Signal(signal));
    }

    match name {
        "event" => parse_event(rest, false),
        "event!" => parse_event(rest, true),
        "alert" => {
            let (id, text) = word(rest);
            Ok(Command::Alert(AlertMessage::native(
                required(id, "alert id")?,
                required(text, "alert text")?,
            )))
        }
        "web-alert" => {
            let (id, rest) = word(rest);
            let (url, text) = word(rest);
            Ok(Command::Alert(AlertMessage::web(
                required(id, "alert id")?,
                required(text, "alert text")?,
                required(url, "alert url")?,
            )))
        }
        "cancel-alerts" => Ok(Command::CancelAlerts),
        "register" => Ok(Command::Register(Some(
            required(rest, "registration id")?.to_string(),
        ))),
        "unregister" => Ok(Command::Register(None)),
        "flush" => Ok(Command::Flush),
        "session" => Ok(Command::Session),
        "status" => Ok(Command::Status),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
