// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Headless surface for hosts without a screen

use super::{AlertStyle, AlertSurface, PresentationError};
use async_trait::async_trait;
use courier_core::{AlertMessage, DismissSignal};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::AbortHandle;

/// Logs each alert and dismisses it after a fixed display time
#[derive(Clone)]
pub struct HeadlessSurface {
    display: Duration,
    showing: Arc<Mutex<HashMap<String, AbortHandle>>>,
}

impl HeadlessSurface {
    pub fn new(display: Duration) -> Self {
        Self {
            display,
            showing: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of alerts currently on screen
    pub fn showing(&self) -> usize {
        self.showing.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl AlertSurface for HeadlessSurface {
    async fn preload(&self, message: &AlertMessage) -> Result<(), PresentationError> {
        tracing::debug!(message_id = %message.id, "preloading content");
        Ok(())
    }

    async fn present(
        &self,
        message: &AlertMessage,
        style: AlertStyle,
        signal: DismissSignal,
    ) -> Result<(), PresentationError> {
        tracing::info!(
            message_id = %message.id,
            style = style.as_str(),
            title = message.title.as_deref().unwrap_or(""),
            text = %message.text,
            "alert shown"
        );

        let id = message.id.clone();
        let showing = Arc::clone(&self.showing);
        let display = self.display;
        let task = tokio::spawn(async move {
            tokio::time::sleep(display).await;
            showing
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&id);
            tracing::info!(message_id = %id, "alert dismissed after display time");
            signal.dismissed();
        });

        self.showing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(message.id.clone(), task.abort_handle());
        Ok(())
    }

    async fn dismiss(&self, message_id: &str) {
        let handle = self
            .showing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(message_id);
        if let Some(handle) = handle {
            handle.abort();
            tracing::info!(message_id, "alert dismissed");
        }
    }
}

#[cfg(test)]
#[path = "headless_tests.rs"]
mod tests;
