// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Discovers labeled issues on the forge and decides which are eligible
//! for an implement dispatch.
//!
//! Grounded in `original_source/orchestrator/issue_poller.py`'s
//! `poll_issues`/`_find_open_pr_for_issue`/`_issue_has_trigger`.

use super::{sleep_or_shutdown, ErrorBackoff, PollerConfig};
use crate::dispatcher::Dispatcher;
use crate::error::PoolError;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use swarm_adapters::ForgeGateway;
use swarm_core::{Issue, IssueNumber, IssueStatus, PrNumber};
use swarm_storage::Store;
use tracing::{debug, error, info, warn};

pub(super) async fn run(
    store: Arc<Store>,
    forge: Arc<ForgeGateway>,
    dispatcher: Arc<dyn Dispatcher>,
    config: PollerConfig,
    shutdown: Arc<AtomicBool>,
) {
    let interval = Duration::from_secs(config.poll_interval_seconds);
    let mut backoff = ErrorBackoff::new();

    while !shutdown.load(Ordering::Relaxed) {
        match poll_once(&store, &forge, &config).await {
            Ok(ready) => {
                backoff.record_success();
                for issue_number in ready {
                    if !dispatcher.can_dispatch().await {
                        info!("agent pool full, deferring remaining issues to next cycle");
                        break;
                    }
                    match dispatcher.dispatch_implement(issue_number).await {
                        Ok(Some(agent_id)) => info!(%issue_number, %agent_id, "dispatched implement worker"),
                        Ok(None) => warn!(%issue_number, "implement dispatch declined"),
                        Err(e) => error!(%issue_number, error = %e, "failed to dispatch implement worker"),
                    }
                }
            }
            Err(e) => {
                backoff.record_failure();
                error!(error = %e, "issue intake poll cycle failed");
            }
        }
        sleep_or_shutdown(backoff.next_interval(interval), &shutdown).await;
    }
}

/// One cycle: discover/triage issues with the configured label, return the
/// ones eligible for an implement dispatch this cycle.
async fn poll_once(store: &Store, forge: &ForgeGateway, config: &PollerConfig) -> Result<Vec<IssueNumber>, PoolError> {
    let issues = forge.list_open_issues_with_label(&config.issue_label).await?;
    debug!(count = issues.len(), label = %config.issue_label, "fetched labeled issues");

    let mut ready = Vec::new();
    let now = Utc::now();

    for issue in issues {
        let issue_number = IssueNumber(issue.number);

        let Some(existing) = store.get_issue(issue_number)? else {
            // Never seen. If the forge already has an open PR for this
            // issue's branch, seed straight into pr_created so the
            // reviewer picks it up instead of dispatching a redundant
            // implement worker.
            let head = format!("fix/issue-{}", issue.number);
            let existing_pr = forge.list_open_prs_by_head(&head).await.unwrap_or_default();
            if let Some(pr) = existing_pr.first() {
                let mut row = Issue::new_pending(issue_number, issue.title.clone(), now);
                row.status = IssueStatus::PrCreated;
                row.pr_number = Some(PrNumber(pr.number));
                store.insert_issue(&row)?;
                info!(%issue_number, pr_number = pr.number, "issue already has an open PR, seeded as pr_created");
                continue;
            }

            store.insert_issue(&Issue::new_pending(issue_number, issue.title.clone(), now))?;
            if issue_has_trigger(forge, issue.number, &config.trigger_mention).await {
                info!(%issue_number, "new issue triggered");
                ready.push(issue_number);
            } else {
                debug!(%issue_number, "new issue discovered but not triggered yet");
            }
            continue;
        };

        match existing.status {
            IssueStatus::Pending => {
                if existing.attempts >= config.max_issue_retries {
                    debug!(%issue_number, attempts = existing.attempts, "issue exceeded max retries, skipping");
                    continue;
                }
                if issue_has_trigger(forge, issue.number, &config.trigger_mention).await {
                    ready.push(issue_number);
                } else {
                    debug!(%issue_number, "issue still waiting for trigger comment");
                }
            }
            IssueStatus::Resolved => {
                if let Some(pr_number) = existing.pr_number {
                    let head = format!("fix/issue-{}", issue.number);
                    if let Ok(open_prs) = forge.list_open_prs_by_head(&head).await {
                        if open_prs.iter().any(|p| p.number == pr_number.0) {
                            warn!(%issue_number, %pr_number, "issue marked resolved but its PR is still open, reverting to pr_created");
                            store.update_issue(issue_number, IssueStatus::PrCreated, None, Some(Some(pr_number)), now)?;
                        }
                    }
                }
            }
            IssueStatus::InProgress | IssueStatus::PrCreated | IssueStatus::NeedsHuman => {
                debug!(%issue_number, status = %existing.status, "issue already in flight, skipping");
            }
        }
    }

    info!(ready = ready.len(), "issue intake cycle complete");
    Ok(ready)
}

async fn issue_has_trigger(forge: &ForgeGateway, issue_number: i64, trigger_mention: &str) -> bool {
    if trigger_mention.is_empty() {
        return true;
    }
    let trigger_lower = trigger_mention.to_lowercase();
    match forge.read_issue_comments(issue_number).await {
        Ok(comments) => comments.iter().any(|c| c.body.to_lowercase().contains(&trigger_lower)),
        Err(e) => {
            warn!(issue_number, error = %e, "failed to read issue comments while checking trigger");
            false
        }
    }
}
