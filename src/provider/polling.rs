//! Periodic refresh trigger.
//!
//! # Responsibilities
//! - Invoke the refresh callback on a fixed interval
//! - Stop when shutdown is triggered
//!
//! # Design Decisions
//! - The first tick fires one interval after start, not immediately
//! - Ticks are awaited in sequence, so cycles never overlap; ticks missed
//!   while a cycle runs are skipped, not queued
//! - `stop` aborts a running cycle; a refresh finishing after shutdown would
//!   be discarded anyway

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::lifecycle::Shutdown;

/// Background task driving refresh cycles.
#[derive(Debug)]
pub struct PollingScheduler {
    interval: Duration,
    handle: JoinHandle<()>,
}

impl PollingScheduler {
    /// Spawn the polling loop on the current Tokio runtime.
    pub fn start<F, Fut>(interval: Duration, shutdown: &Shutdown, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut stop = shutdown.subscribe();
        let stopped = shutdown.clone();

        tracing::trace!(interval = ?interval, "Enabling periodic check");

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                if stopped.is_triggered() {
                    break;
                }

                tokio::select! {
                    _ = ticker.tick() => {
                        tick().await;
                    }
                    _ = stop.recv() => {
                        break;
                    }
                }
            }

            tracing::debug!("Polling scheduler stopped");
        });

        Self { interval, handle }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Abort the loop, including a cycle in progress, and wait for it to exit.
    pub async fn stop(self) {
        self.handle.abort();
        match self.handle.await {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => tracing::debug!("Polling scheduler aborted"),
            Err(e) => tracing::warn!(error = %e, "Polling scheduler task failed"),
        }
    }

    /// Wait for the loop to exit after shutdown was triggered.
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "Polling scheduler task failed");
        }
    }
}
