// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The three cooperating pollers — Issue Intake, PR Reviewer, Rate-Limit
//! Watcher — plus the shared cooperative-shutdown flag and linear
//! poll-cycle-error backoff.
//!
//! Grounded in `original_source/orchestrator/main.py`'s top-level loop
//! (the `consecutive_errors` backoff) driving the three modules each
//! submodule here is ported from.

mod issue_intake;
mod pr_reviewer;
mod rate_limit_watcher;

use crate::dispatcher::Dispatcher;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use swarm_adapters::ForgeGateway;
use swarm_storage::Store;
use tokio::task::JoinHandle;

/// The subset of [`swarm_core::Config`] the three pollers need.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub issue_label: String,
    pub max_issue_retries: i64,
    pub trigger_mention: String,
    pub poll_interval_seconds: u64,
    pub pr_poll_interval_seconds: u64,
    pub max_pr_fix_retries: i64,
    /// Reserved: the structural review-thread query and the CI-bucket check
    /// together decide when to stop waiting, so no explicit wait timeout is
    /// enforced here. Carried through for parity with the environment
    /// surface in `swarm_core::Config`.
    pub ci_wait_timeout_seconds: u64,
    pub rate_limit_retry_interval: u64,
    pub claude_oauth_token: String,
}

/// Owns the cooperative shutdown flag and spawns the three poller tasks.
pub struct ControlPlane {
    store: Arc<Store>,
    forge: Arc<ForgeGateway>,
    dispatcher: Arc<dyn Dispatcher>,
    config: PollerConfig,
    shutdown: Arc<AtomicBool>,
}

impl ControlPlane {
    pub fn new(store: Arc<Store>, forge: Arc<ForgeGateway>, dispatcher: Arc<dyn Dispatcher>, config: PollerConfig) -> Self {
        Self { store, forge, dispatcher, config, shutdown: Arc::new(AtomicBool::new(false)) }
    }

    /// The flag a signal handler should set to stop all three pollers at
    /// their next wake. Setting it does not touch live Workers — those are
    /// detached subprocesses the pool leaves running (see the daemon's
    /// shutdown handler).
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// Spawns the three pollers as independent tasks and returns their
    /// handles for the caller to await during shutdown.
    pub fn spawn_all(&self) -> Vec<JoinHandle<()>> {
        vec![
            tokio::spawn(issue_intake::run(
                self.store.clone(),
                self.forge.clone(),
                self.dispatcher.clone(),
                self.config.clone(),
                self.shutdown.clone(),
            )),
            tokio::spawn(pr_reviewer::run(
                self.store.clone(),
                self.forge.clone(),
                self.dispatcher.clone(),
                self.config.clone(),
                self.shutdown.clone(),
            )),
            tokio::spawn(rate_limit_watcher::run(self.store.clone(), self.dispatcher.clone(), self.config.clone(), self.shutdown.clone())),
        ]
    }
}

/// Linear poll-cycle-error backoff: after 3 consecutive failed cycles,
/// sleeps `min(consecutive * base_interval, 600s)` instead of the steady
/// poll interval.
struct ErrorBackoff {
    consecutive: u32,
}

impl ErrorBackoff {
    fn new() -> Self {
        Self { consecutive: 0 }
    }

    fn record_success(&mut self) {
        self.consecutive = 0;
    }

    fn record_failure(&mut self) {
        self.consecutive = self.consecutive.saturating_add(1);
    }

    fn next_interval(&self, base: Duration) -> Duration {
        if self.consecutive < 3 {
            return base;
        }
        base.saturating_mul(self.consecutive).min(Duration::from_secs(600))
    }
}

/// Sleeps in short slices so a shutdown request is noticed promptly rather
/// than only at the next full interval boundary.
async fn sleep_or_shutdown(duration: Duration, shutdown: &AtomicBool) {
    const SLICE: Duration = Duration::from_secs(1);
    let mut remaining = duration;
    while remaining > Duration::ZERO {
        if shutdown.load(Ordering::Relaxed) {
            return;
        }
        let step = remaining.min(SLICE);
        tokio::time::sleep(step).await;
        remaining = remaining.saturating_sub(step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_holds_base_interval_under_three_failures() {
        let mut backoff = ErrorBackoff::new();
        let base = Duration::from_secs(300);
        backoff.record_failure();
        backoff.record_failure();
        assert_eq!(backoff.next_interval(base), base);
    }

    #[test]
    fn backoff_scales_linearly_after_three_failures_and_caps_at_600s() {
        let mut backoff = ErrorBackoff::new();
        let base = Duration::from_secs(300);
        for _ in 0..3 {
            backoff.record_failure();
        }
        assert_eq!(backoff.next_interval(base), Duration::from_secs(600));
        backoff.record_success();
        assert_eq!(backoff.next_interval(base), base);
    }
}
