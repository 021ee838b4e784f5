// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The capability the Control Plane pollers depend on, rather than a
//! concrete pool type. `WorkerPool` is the only production implementor;
//! tests can substitute a fake to exercise poller logic without spawning
//! real subprocesses.

use crate::error::PoolError;
use async_trait::async_trait;
use swarm_adapters::ReviewThread;
use swarm_core::{AgentId, AgentType, IssueNumber, PrNumber, WorkerStatus};

/// Snapshot of one live Worker, enough for the dashboard's `/api/agents`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ActiveAgentSummary {
    pub agent_id: AgentId,
    pub issue_number: IssueNumber,
    pub pr_number: Option<PrNumber>,
    pub agent_type: AgentType,
    pub status: WorkerStatus,
    pub elapsed_seconds: u64,
    pub event_count: usize,
    pub recent_events: Vec<String>,
}

#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// True while the count of `running` Workers is below the concurrency cap.
    async fn can_dispatch(&self) -> bool;

    /// Dispatch an implement Worker for `issue_number`. `Ok(None)` means
    /// admission or workspace/spawn preparation failed; the Issue is left
    /// untouched for the caller to retry next cycle.
    async fn dispatch_implement(&self, issue_number: IssueNumber) -> Result<Option<AgentId>, PoolError>;

    /// Dispatch a fix-review Worker for `pr_number` on `branch_name`, tied
    /// to the originating `issue_number`. `unresolved_threads`, when
    /// `Some`, is embedded verbatim in the fix-review prompt.
    async fn dispatch_fix_review(
        &self,
        pr_number: PrNumber,
        branch_name: String,
        issue_number: IssueNumber,
        unresolved_threads: Option<Vec<ReviewThread>>,
    ) -> Result<Option<AgentId>, PoolError>;

    /// Resume a persisted `rate_limited` Worker. No-op (but not an error)
    /// if the Worker has since left that status or vanished.
    async fn resume_rate_limited(&self, agent_id: &AgentId) -> Result<(), PoolError>;

    /// All Workers this pool currently holds a live process handle for.
    async fn active_agents(&self) -> Vec<ActiveAgentSummary>;
}
