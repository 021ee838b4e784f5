// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup recovery (spec.md §4.F.4): reconcile Workers left `running` by a
//! supervisor process that died, and log (but don't touch) Workers left
//! `rate_limited` so the watcher can pick them up.
//!
//! Grounded in `original_source/orchestrator/main.py`'s
//! `_recover_stale_agents`, adapted to the reference design's choice of
//! "leave alive Workers alone" (spec.md §4.F.4, §9 open question 2) rather
//! than unconditionally marking every `running` row stale.

use chrono::Utc;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use swarm_adapters::WorkspaceManager;
use swarm_core::{IssueStatus, WorkerStatus};
use swarm_storage::Store;
use tracing::{info, warn};

/// Inspects Workers left `running` by a previous supervisor process: if the
/// recorded pid is still alive, leaves the Worker alone (its monitor is not
/// reattached — an explicit open question in spec.md §9). If the pid is
/// dead, marks the Worker `failed`, resets its Issue to `pending` if it was
/// an implement worker, and releases the workspace. Workers left
/// `rate_limited` are logged and handed to the Rate-Limit Watcher untouched.
pub async fn recover(store: &Store, workspace: &WorkspaceManager) -> Result<(), swarm_storage::StoreError> {
    let running = store.list_running_workers()?;
    info!(count = running.len(), "startup recovery: inspecting workers left running");

    for mut worker in running {
        let alive = worker.pid.map(pid_is_alive).unwrap_or(false);
        if alive {
            info!(agent_id = %worker.agent_id, pid = ?worker.pid, "worker survived restart, leaving in place");
            continue;
        }

        warn!(agent_id = %worker.agent_id, pid = ?worker.pid, "worker process died during restart, marking failed");
        let now = Utc::now();
        worker.status = WorkerStatus::Failed;
        worker.error_message = Some("process died during restart".to_string());
        worker.finished_at = Some(now);
        let issue_number = worker.issue_number;
        let agent_type = worker.agent_type;
        let worktree_path = worker.worktree_path.clone();
        store.update_worker(&worker)?;
        let _ = workspace.cleanup_worktree(&worktree_path).await;
        if agent_type == swarm_core::AgentType::Implement {
            store.update_issue(issue_number, IssueStatus::Pending, None, None, now)?;
        }
    }

    let rate_limited = store.list_rate_limited_workers()?;
    if !rate_limited.is_empty() {
        info!(count = rate_limited.len(), "startup recovery: rate-limited workers left for the rate-limit watcher");
        for worker in &rate_limited {
            info!(agent_id = %worker.agent_id, worktree_path = %worker.worktree_path, "rate-limited worker preserved across restart");
        }
    }

    Ok(())
}

fn pid_is_alive(pid: i32) -> bool {
    match kill(Pid::from_raw(pid), None) {
        Ok(()) => true,
        Err(nix::errno::Errno::ESRCH) => false,
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pid_is_alive_is_true_for_own_process() {
        let own = std::process::id() as i32;
        assert!(pid_is_alive(own));
    }

    #[test]
    fn pid_is_alive_is_false_for_a_pid_unlikely_to_exist() {
        // PID 1 is always init/alive in any real environment; pick an
        // implausibly large pid instead to exercise the ESRCH path.
        assert!(!pid_is_alive(i32::MAX - 1));
    }
}
