// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Presentation surfaces for in-app alerts

mod headless;

pub use headless::HeadlessSurface;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeSurface, SurfaceCall};

use async_trait::async_trait;
use courier_core::{AlertMessage, DismissSignal};
use thiserror::Error;

/// Errors from presenting an alert
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresentationError {
    #[error("failed to load message content: {0}")]
    LoadFailed(String),
    #[error("no surface available to present on")]
    NoSurface,
    #[error("presentation failed: {0}")]
    Failed(String),
}

/// How the surface should render a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertStyle {
    /// Simple platform alert
    Native,
    /// Rich content view
    Web,
}

impl AlertStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStyle::Native => "native",
            AlertStyle::Web => "web",
        }
    }
}

/// Something that can put an alert in front of the user.
///
/// `present` returns once the alert is on screen. The surface reports the end
/// of the presentation through `signal`; callers may also force it off screen
/// with `dismiss`.
#[async_trait]
pub trait AlertSurface: Clone + Send + Sync + 'static {
    /// Load the content a rich message needs before it can be shown
    async fn preload(&self, message: &AlertMessage) -> Result<(), PresentationError>;

    async fn present(
        &self,
        message: &AlertMessage,
        style: AlertStyle,
        signal: DismissSignal,
    ) -> Result<(), PresentationError>;

    /// Take a message off screen. Dismissing an absent message is a no-op.
    async fn dismiss(&self, message_id: &str);
}
