// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-app alert presentation
//!
//! An alert operation holds its queue's only worker from the moment the
//! message is shown until it leaves the screen, so alerts appear one at a
//! time in submission order.

use crate::error::OperationError;
use crate::operation::{Operation, OperationContext};
use async_trait::async_trait;
use courier_adapters::{AlertStyle, AlertSurface, PresentationError};
use courier_core::{dismissal, AlertMessage, Clock, DismissSignal, MessageVariant, PresentationEnd};

/// How a message is put on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presenter {
    /// Rich content, loaded before presenting
    Web,
    /// Plain platform alert
    Native,
}

impl Presenter {
    pub fn for_message(message: &AlertMessage) -> Self {
        match message.variant {
            MessageVariant::Web { .. } => Presenter::Web,
            MessageVariant::Native => Presenter::Native,
        }
    }

    /// Whether resources must load before presenting
    pub fn loads_async(&self) -> bool {
        matches!(self, Presenter::Web)
    }

    pub fn style(&self) -> AlertStyle {
        match self {
            Presenter::Web => AlertStyle::Web,
            Presenter::Native => AlertStyle::Native,
        }
    }

    async fn load_resources<S: AlertSurface>(
        &self,
        surface: &S,
        message: &AlertMessage,
    ) -> Result<(), PresentationError> {
        match self {
            Presenter::Web => surface.preload(message).await,
            Presenter::Native => Ok(()),
        }
    }

    async fn present<S: AlertSurface>(
        &self,
        surface: &S,
        message: &AlertMessage,
        signal: DismissSignal,
    ) -> Result<(), PresentationError> {
        surface.present(message, self.style(), signal).await
    }

    async fn dismiss<S: AlertSurface>(&self, surface: &S, message: &AlertMessage) {
        surface.dismiss(&message.id).await;
    }
}

/// Presents one message and blocks its worker until the message is gone
pub struct AlertOperation<S, C> {
    message: AlertMessage,
    surface: S,
    clock: C,
}

impl<S: AlertSurface, C: Clock> AlertOperation<S, C> {
    pub fn new(message: AlertMessage, surface: S, clock: C) -> Self {
        Self {
            message,
            surface,
            clock,
        }
    }
}

#[async_trait]
impl<S: AlertSurface, C: Clock> Operation for AlertOperation<S, C> {
    fn name(&self) -> &str {
        "present-alert"
    }

    async fn execute(&mut self, ctx: &OperationContext) -> Result<(), OperationError> {
        let presenter = Presenter::for_message(&self.message);
        let id = self.message.id.clone();

        if ctx.is_cancelled() {
            presenter.dismiss(&self.surface, &self.message).await;
            return Err(OperationError::Cancelled);
        }
        if self.message.is_expired(self.clock.utc()) {
            tracing::info!(alert = %id, "alert expired before presentation");
            presenter.dismiss(&self.surface, &self.message).await;
            return Err(OperationError::MessageExpired);
        }

        if presenter.loads_async() {
            tokio::select! {
                loaded = presenter.load_resources(&self.surface, &self.message) => {
                    if let Err(e) = loaded {
                        tracing::warn!(alert = %id, error = %e, "alert content failed to load");
                        return Err(e.into());
                    }
                }
                _ = ctx.cancelled() => return Err(OperationError::Cancelled),
            }
        }

        let (signal, wait) = dismissal();
        if let Err(e) = presenter
            .present(&self.surface, &self.message, signal.clone())
            .await
        {
            signal.failed(e.to_string());
            tracing::warn!(alert = %id, error = %e, "alert presentation failed");
            return Err(e.into());
        }
        tracing::info!(alert = %id, style = presenter.style().as_str(), "alert on screen");

        let wait = wait.wait();
        tokio::pin!(wait);
        let end = tokio::select! {
            biased;
            end = &mut wait => end,
            _ = ctx.cancelled() => {
                presenter.dismiss(&self.surface, &self.message).await;
                signal.send(PresentationEnd::Cancelled);
                wait.await
            }
        };

        match end {
            PresentationEnd::Dismissed => {
                tracing::info!(alert = %id, "alert dismissed");
                Ok(())
            }
            PresentationEnd::Failed(reason) => {
                tracing::warn!(alert = %id, reason = %reason, "alert failed on screen");
                Err(PresentationError::Failed(reason).into())
            }
            PresentationEnd::Cancelled => {
                tracing::info!(alert = %id, "alert cancelled");
                Err(OperationError::Cancelled)
            }
        }
    }
}

#[cfg(test)]
#[path = "alerts_tests.rs"]
mod tests;
