// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Probes the assistant CLI for rate-limit recovery and resumes paused
//! workers in `rate_limited_at` order once it responds.
//!
//! Grounded in `original_source/orchestrator/rate_limit_watcher.py`'s
//! `_probe_claude_available`/`_check_and_resume`.

use super::{sleep_or_shutdown, ErrorBackoff, PollerConfig};
use crate::dispatcher::Dispatcher;
use crate::error::PoolError;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use swarm_adapters::is_rate_limit_message;
use swarm_storage::Store;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

const PROBE_TIMEOUT: Duration = Duration::from_secs(60);

pub(super) async fn run(store: Arc<Store>, dispatcher: Arc<dyn Dispatcher>, config: PollerConfig, shutdown: Arc<AtomicBool>) {
    let interval = Duration::from_secs(config.rate_limit_retry_interval);
    let mut backoff = ErrorBackoff::new();

    while !shutdown.load(Ordering::Relaxed) {
        match poll_once(&store, &dispatcher, &config).await {
            Ok(()) => backoff.record_success(),
            Err(e) => {
                backoff.record_failure();
                error!(error = %e, "rate-limit watcher cycle failed");
            }
        }
        sleep_or_shutdown(backoff.next_interval(interval), &shutdown).await;
    }
}

async fn poll_once(store: &Store, dispatcher: &Arc<dyn Dispatcher>, config: &PollerConfig) -> Result<(), PoolError> {
    let limited = store.list_rate_limited_workers()?;
    if limited.is_empty() {
        return Ok(());
    }

    info!(count = limited.len(), "found rate-limited worker(s), probing assistant availability");

    if !probe_claude_available(&config.claude_oauth_token).await {
        info!("assistant still rate-limited, will retry next cycle");
        return Ok(());
    }

    info!("assistant available again, resuming rate-limited workers");

    for worker in limited {
        if !dispatcher.can_dispatch().await {
            info!("agent pool full, deferring remaining resumes to next cycle");
            break;
        }
        let agent_id = worker.agent_id.clone();
        match dispatcher.resume_rate_limited(&agent_id).await {
            Ok(()) => info!(%agent_id, "resumed rate-limited worker"),
            Err(e) => warn!(%agent_id, error = %e, "failed to resume rate-limited worker"),
        }
    }

    Ok(())
}

/// Sends a trivial one-turn prompt to the assistant CLI and inspects the
/// outcome. Success (exit 0) or a non-zero exit that doesn't match a known
/// rate-limit pattern is treated as "available"; a probe-level timeout or a
/// rate-limit match is treated as "still limited".
async fn probe_claude_available(oauth_token: &str) -> bool {
    let mut cmd = Command::new("claude");
    cmd.arg("-p")
        .arg("Reply with just the word OK")
        .arg("--max-turns")
        .arg("1")
        .env("CLAUDE_CODE_OAUTH_TOKEN", oauth_token)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            debug!(error = %e, "failed to spawn assistant probe, assuming still limited");
            return false;
        }
    };

    match tokio::time::timeout(PROBE_TIMEOUT, child.wait_with_output()).await {
        Ok(Ok(output)) => {
            if output.status.success() {
                return true;
            }
            let stderr = String::from_utf8_lossy(&output.stderr);
            !is_rate_limit_message(&stderr)
        }
        Ok(Err(e)) => {
            debug!(error = %e, "assistant probe failed to complete, assuming still limited");
            false
        }
        Err(_) => {
            debug!("assistant probe timed out, assuming still limited");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn probe_returns_false_when_binary_missing() {
        // `claude` is not on PATH in the test sandbox; spawn fails and the
        // probe should conservatively report "still limited" rather than
        // panic or hang.
        let available = probe_claude_available("test-token").await;
        assert!(!available);
    }
}
