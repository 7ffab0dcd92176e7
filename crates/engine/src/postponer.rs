// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Debounce for "report needed" signals

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

type Action = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct Window {
    action: Option<Action>,
    open: bool,
}

/// Coalesces bursts of actions into one run after a fixed delay.
///
/// The first `postpone` opens a window; later calls inside it replace the
/// action without extending the window. Dropping the postponer discards an
/// unfired action.
pub struct Postponer {
    delay: Duration,
    window: Arc<Mutex<Window>>,
    shutdown: CancellationToken,
}

impl Postponer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            window: Arc::new(Mutex::new(Window::default())),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn postpone(&self, action: impl FnOnce() + Send + 'static) {
        {
            let mut window = self.window.lock().unwrap_or_else(|e| e.into_inner());
            window.action = Some(Box::new(action));
            if window.open {
                return;
            }
            window.open = true;
        }

        let window = Arc::clone(&self.window);
        let shutdown = self.shutdown.clone();
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.cancelled() => return,
            }
            let action = {
                let mut window = window.lock().unwrap_or_else(|e| e.into_inner());
                window.open = false;
                window.action.take()
            };
            if let Some(action) = action {
                action();
            }
        });
    }

    /// True while a window is open
    pub fn is_pending(&self) -> bool {
        self.window.lock().unwrap_or_else(|e| e.into_inner()).open
    }
}

impl Drop for Postponer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
#[path = "postponer_tests.rs"]
mod tests;
