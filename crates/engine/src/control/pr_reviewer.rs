// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Polls `pr_created` issues, escalating stalled PRs to `needs-human` and
//! dispatching fix-review workers when CI fails or review threads are
//! unresolved.
//!
//! Grounded in `original_source/orchestrator/pr_monitor.py`'s `_poll_prs`.

use super::{sleep_or_shutdown, ErrorBackoff, PollerConfig};
use crate::dispatcher::Dispatcher;
use crate::error::PoolError;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use swarm_adapters::{ForgeGateway, ReviewThread, ReviewThreadsResult};
use swarm_core::{AgentType, IssueNumber, IssueStatus, PrNumber, WorkerStatus};
use swarm_storage::Store;
use tracing::{debug, error, info, warn};

const NEEDS_HUMAN_LABEL: &str = "needs-human";

pub(super) async fn run(
    store: Arc<Store>,
    forge: Arc<ForgeGateway>,
    dispatcher: Arc<dyn Dispatcher>,
    config: PollerConfig,
    shutdown: Arc<AtomicBool>,
) {
    let interval = Duration::from_secs(config.pr_poll_interval_seconds);
    let mut backoff = ErrorBackoff::new();

    while !shutdown.load(Ordering::Relaxed) {
        match poll_once(&store, &forge, &dispatcher, &config).await {
            Ok(()) => backoff.record_success(),
            Err(e) => {
                backoff.record_failure();
                error!(error = %e, "PR review poll cycle failed");
            }
        }
        sleep_or_shutdown(backoff.next_interval(interval), &shutdown).await;
    }
}

async fn poll_once(store: &Store, forge: &ForgeGateway, dispatcher: &Arc<dyn Dispatcher>, config: &PollerConfig) -> Result<(), PoolError> {
    let issues = store.list_issues_by_status(IssueStatus::PrCreated)?;
    debug!(count = issues.len(), "reviewing open PRs");

    for issue in issues {
        let Some(pr_number) = issue.pr_number else {
            warn!(issue_number = %issue.issue_number, "issue is pr_created with no pr_number, skipping");
            continue;
        };
        if let Err(e) = review_one(store, forge, dispatcher, config, issue.issue_number, pr_number).await {
            error!(issue_number = %issue.issue_number, %pr_number, error = %e, "failed to review PR");
        }
    }

    Ok(())
}

async fn review_one(
    store: &Store,
    forge: &ForgeGateway,
    dispatcher: &Arc<dyn Dispatcher>,
    config: &PollerConfig,
    issue_number: IssueNumber,
    pr_number: PrNumber,
) -> Result<(), PoolError> {
    let now = Utc::now();
    let latest = store.latest_pr_review_iteration(pr_number)?;
    let iteration_count = latest.as_ref().map(|r| r.iteration).unwrap_or(0);

    if iteration_count >= config.max_pr_fix_retries {
        warn!(%issue_number, %pr_number, iteration_count, "exceeded max fix-review retries, escalating to needs-human");
        store.update_issue(issue_number, IssueStatus::NeedsHuman, None, None, now)?;
        if let Err(e) = forge.add_label(issue_number.0, NEEDS_HUMAN_LABEL).await {
            warn!(%issue_number, error = %e, "failed to apply needs-human label");
        }
        return Ok(());
    }

    let already_running = store
        .list_workers_for_pr(pr_number)?
        .iter()
        .any(|w| w.status == WorkerStatus::Running && w.agent_type == AgentType::FixReview);
    if already_running {
        debug!(%pr_number, "fix-review worker already running for this PR, skipping");
        return Ok(());
    }

    let checks = forge.pr_checks(pr_number.0).await.unwrap_or_default();
    let ci_pending = checks.is_empty() || checks.iter().any(|c| c.bucket == "pending");
    if ci_pending {
        debug!(%pr_number, "CI still pending, waiting");
        return Ok(());
    }
    let ci_failed = checks.iter().any(|c| c.bucket == "fail" || matches!(c.state.as_str(), "FAILURE" | "ERROR"));

    match forge.pr_review_threads(pr_number.0).await {
        ReviewThreadsResult::Structural(threads) => {
            let unresolved: Vec<ReviewThread> = threads.into_iter().filter(|t| !t.is_resolved).collect();
            if unresolved.is_empty() && !ci_failed {
                info!(%issue_number, %pr_number, "PR clean: CI green and no unresolved review threads");
                store.update_issue(issue_number, IssueStatus::Resolved, None, None, now)?;
                return Ok(());
            }

            let comments_json = serde_json::Value::Array(
                unresolved.iter().map(|t| serde_json::json!({"path": t.path, "line": t.line, "isResolved": t.is_resolved})).collect(),
            )
            .to_string();
            store.insert_pr_review_iteration(pr_number, iteration_count + 1, unresolved.len() as i64, &comments_json, None, "dispatched", now)?;
            dispatch_fix(forge, dispatcher, issue_number, pr_number, Some(unresolved)).await;
        }
        ReviewThreadsResult::QueryFailed => {
            let comments = forge.pr_inline_comments(pr_number.0).await.unwrap_or_default();
            let new_count = comments.len() as i64;
            let prev_count = latest.as_ref().map(|r| r.comments_count).unwrap_or(0);

            if new_count == 0 && !ci_failed {
                info!(%issue_number, %pr_number, "PR clean (REST fallback): CI green and no inline comments");
                store.update_issue(issue_number, IssueStatus::Resolved, None, None, now)?;
                return Ok(());
            }

            if new_count > prev_count || ci_failed {
                store.insert_pr_review_iteration(pr_number, iteration_count + 1, new_count, "[]", None, "dispatched", now)?;
                dispatch_fix(forge, dispatcher, issue_number, pr_number, None).await;
            } else {
                debug!(%pr_number, new_count, prev_count, "REST fallback: comment count unchanged, waiting");
            }
        }
    }

    Ok(())
}

async fn dispatch_fix(
    forge: &ForgeGateway,
    dispatcher: &Arc<dyn Dispatcher>,
    issue_number: IssueNumber,
    pr_number: PrNumber,
    unresolved_threads: Option<Vec<ReviewThread>>,
) {
    if !dispatcher.can_dispatch().await {
        info!(%pr_number, "agent pool full, deferring fix-review dispatch to next cycle");
        return;
    }
    let branch_name = match forge.pr_head_branch(pr_number.0).await {
        Ok(Some(branch)) => branch,
        Ok(None) => {
            warn!(%pr_number, "could not determine head branch for PR, skipping fix-review dispatch");
            return;
        }
        Err(e) => {
            warn!(%pr_number, error = %e, "failed to fetch head branch for PR");
            return;
        }
    };

    match dispatcher.dispatch_fix_review(pr_number, branch_name, issue_number, unresolved_threads).await {
        Ok(Some(agent_id)) => info!(%pr_number, %agent_id, "dispatched fix-review worker"),
        Ok(None) => warn!(%pr_number, "fix-review dispatch declined"),
        Err(e) => error!(%pr_number, error = %e, "failed to dispatch fix-review worker"),
    }
}
