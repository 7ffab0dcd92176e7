// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-app alert messages and the single-use dismissal signal

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// How a message wants to be shown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageVariant {
    /// Plain text alert rendered by the platform
    Native,
    /// Rich message whose content is loaded from `url` before it is shown
    Web { url: String },
}

/// A message to present while the app is in the foreground
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertMessage {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub text: String,
    pub variant: MessageVariant,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl AlertMessage {
    pub fn native(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            text: text.into(),
            variant: MessageVariant::Native,
            expires_at: None,
        }
    }

    pub fn web(id: impl Into<String>, text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            variant: MessageVariant::Web { url: url.into() },
            ..Self::native(id, text)
        }
    }

    pub fn expiring_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// How a presentation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentationEnd {
    /// The user (or the surface) dismissed the message
    Dismissed,
    /// The surface could not show the message
    Failed(String),
    /// Presentation was torn down because the alert was cancelled
    Cancelled,
}

/// Sending half of a dismissal. Cloneable; only the first send is delivered.
#[derive(Clone, Debug)]
pub struct DismissSignal {
    tx: Arc<Mutex<Option<oneshot::Sender<PresentationEnd>>>>,
}

impl DismissSignal {
    /// Deliver `end`. Returns false if the signal was already sent.
    pub fn send(&self, end: PresentationEnd) -> bool {
        let tx = self.tx.lock().unwrap_or_else(|e| e.into_inner()).take();
        match tx {
            // The receiver may already be gone; the signal still counts as sent
            Some(tx) => {
                let _ = tx.send(end);
                true
            }
            None => false,
        }
    }

    pub fn dismissed(&self) -> bool {
        self.send(PresentationEnd::Dismissed)
    }

    pub fn failed(&self, reason: impl Into<String>) -> bool {
        self.send(PresentationEnd::Failed(reason.into()))
    }

    pub fn is_signalled(&self) -> bool {
        self.tx.lock().unwrap_or_else(|e| e.into_inner()).is_none()
    }
}

/// Receiving half of a dismissal
#[derive(Debug)]
pub struct DismissWait {
    rx: oneshot::Receiver<PresentationEnd>,
}

impl DismissWait {
    /// Wait for the signal. A signal dropped unsent counts as a failure.
    pub async fn wait(self) -> PresentationEnd {
        self.rx
            .await
            .unwrap_or_else(|_| PresentationEnd::Failed("dismissal signal dropped".to_string()))
    }
}

/// Create a fresh single-use dismissal pair
pub fn dismissal() -> (DismissSignal, DismissWait) {
    let (tx, rx) = oneshot::channel();
    (
        DismissSignal {
            tx: Arc::new(Mutex::new(Some(tx))),
        },
        DismissWait { rx },
    )
}

#[cfg(test)]
#[path = "alert_tests.rs"]
mod tests;
