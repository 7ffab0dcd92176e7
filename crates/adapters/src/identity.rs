// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Installation identity

use std::sync::{Arc, RwLock};

/// Source of the push registration id assigned to this installation
pub trait InstallationIdentity: Clone + Send + Sync + 'static {
    /// `None` until the installation has been registered
    fn registration_id(&self) -> Option<String>;
}

/// Identity that can be set and cleared at runtime
#[derive(Clone, Debug, Default)]
pub struct SharedIdentity {
    id: Arc<RwLock<Option<String>>>,
}

impl SharedIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registered(id: impl Into<String>) -> Self {
        let identity = Self::new();
        identity.set(Some(id.into()));
        identity
    }

    pub fn set(&self, id: Option<String>) {
        *self.id.write().unwrap_or_else(|e| e.into_inner()) = id;
    }
}

impl InstallationIdentity for SharedIdentity {
    fn registration_id(&self) -> Option<String> {
        self.id.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
