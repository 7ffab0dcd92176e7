// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Suspendable periodic trigger

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Next tick strictly after `now` on the grid `start + k * interval`
pub(crate) fn next_tick(start: Instant, interval: Duration, now: Instant) -> Instant {
    let step = interval.as_nanos().max(1);
    let elapsed = now.saturating_duration_since(start).as_nanos();
    let ticks = elapsed / step + 1;
    let offset = u64::try_from(ticks * step).unwrap_or(u64::MAX);
    start + Duration::from_nanos(offset)
}

/// Fires a handler every `interval` until dropped.
///
/// Fire times stay on the grid set at start. Ticks that fall while the timer
/// is suspended are skipped rather than replayed.
pub struct RepeatingTimer {
    running: watch::Sender<bool>,
    task: JoinHandle<()>,
    interval: Duration,
}

impl RepeatingTimer {
    pub fn start(interval: Duration, handler: impl Fn() + Send + Sync + 'static) -> Self {
        let (running, mut rx) = watch::channel(true);
        let handler = Arc::new(handler);
        let start = Instant::now();

        let task = tokio::spawn(async move {
            loop {
                if rx.wait_for(|running| *running).await.is_err() {
                    return;
                }
                let due = next_tick(start, interval, Instant::now());
                tokio::select! {
                    _ = tokio::time::sleep_until(due) => {
                        if *rx.borrow() {
                            handler();
                        }
                    }
                    changed = rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                }
            }
        });

        Self {
            running,
            task,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn suspend(&self) {
        self.running.send_replace(false);
    }

    pub fn resume(&self) {
        self.running.send_replace(true);
    }

    pub fn is_running(&self) -> bool {
        *self.running.borrow()
    }
}

impl Drop for RepeatingTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
