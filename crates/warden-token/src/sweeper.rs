// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Periodic reclamation of expired in-process entries.
//!
//! The sweeper runs on its own timer, independent of request handling, and
//! purges through each target's own write lock. It stops promptly on
//! [`Sweeper::shutdown`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// A structure holding self-expiring entries.
pub trait Sweep: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Removes expired entries and returns how many were removed.
    fn purge_expired(&self) -> usize;
}

/// Background task purging expired entries on a fixed interval.
pub struct Sweeper {
    targets: Vec<Arc<dyn Sweep>>,
    interval: Duration,
    shutdown: Arc<Notify>,
    running: Arc<AtomicBool>,
}

impl Sweeper {
    /// Creates a sweeper with no targets.
    pub fn new(interval: Duration) -> Self {
        Self {
            targets: Vec::new(),
            interval,
            shutdown: Arc::new(Notify::new()),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Adds a sweep target.
    pub fn with_target(mut self, target: Arc<dyn Sweep>) -> Self {
        self.targets.push(target);
        self
    }

    /// Returns the sweep interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns `true` while the sweep loop is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Purges every target once and returns the total removed.
    pub fn sweep_once(&self) -> usize {
        Self::sweep_targets(&self.targets)
    }

    fn sweep_targets(targets: &[Arc<dyn Sweep>]) -> usize {
        targets
            .iter()
            .map(|target| {
                let purged = target.purge_expired();
                if purged > 0 {
                    debug!(target_name = target.name(), purged, "Purged expired entries");
                }
                purged
            })
            .sum()
    }

    /// Starts the sweep loop.
    pub fn start(&self) -> JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);

        let targets = self.targets.clone();
        let period = self.interval;
        let shutdown = self.shutdown.clone();
        let running = self.running.clone();

        tokio::spawn(async move {
            info!(
                interval_secs = period.as_secs(),
                targets = targets.len(),
                "Sweeper started"
            );

            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if !running.load(Ordering::SeqCst) {
                            break;
                        }
                        Self::sweep_targets(&targets);
                    }
                    _ = shutdown.notified() => {
                        break;
                    }
                }
            }

            running.store(false, Ordering::SeqCst);
            info!("Sweeper stopped");
        })
    }

    /// Signals the sweep loop to stop.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.shutdown.notify_one();
    }
}

impl std::fmt::Debug for Sweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sweeper")
            .field(
                "targets",
                &self.targets.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .field("interval", &self.interval)
            .field("running", &self.is_running())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
