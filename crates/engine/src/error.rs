// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for scheduled operations

use courier_adapters::{PresentationError, StoreError, TransportError};
use courier_core::EventValidationError;
use thiserror::Error;

/// Outcome of an operation that did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    #[error("operation cancelled")]
    Cancelled,
    #[error("background time expired before the operation finished")]
    Expired,
    #[error("installation is not registered")]
    NoRegistration,
    #[error("invalid event: {0}")]
    InvalidEvent(#[from] EventValidationError),
    #[error("store error: {0}")]
    Store(String),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("presentation error: {0}")]
    Presentation(#[from] PresentationError),
    #[error("message expired before it could be shown")]
    MessageExpired,
    #[error("operation panicked: {0}")]
    Panicked(String),
    #[error("operation result was dropped")]
    Closed,
}

impl From<StoreError> for OperationError {
    fn from(e: StoreError) -> Self {
        OperationError::Store(e.to_string())
    }
}

impl OperationError {
    /// Cancelled or expired rather than failed
    pub fn is_interrupted(&self) -> bool {
        matches!(self, OperationError::Cancelled | OperationError::Expired)
    }
}
