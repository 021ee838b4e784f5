// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admits, spawns, monitors, and reconciles assistant subprocesses, and
//! resumes ones paused by a rate limit.
//!
//! Grounded in `original_source/orchestrator/agent_pool.py`'s `AgentPool`,
//! with its thread-per-agent reader/monitor replaced by tokio tasks and its
//! `dispatch_fix_callback` closure replaced by the [`Dispatcher`] trait.

use crate::dispatcher::{ActiveAgentSummary, Dispatcher};
use crate::error::PoolError;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex as SyncMutex;
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use swarm_adapters::{
    count_turns, extract_pr_number, extract_session_id, is_rate_limit_message, parse_stream_line,
    ForgeGateway, PromptBuilder, ReviewThread, WorkspaceManager,
};
use swarm_core::stream_event::StreamEventKind;
use swarm_core::{
    AgentId, AgentType, IssueNumber, IssueStatus, PrNumber, StreamEvent, Worker, WorkerStatus,
};
use swarm_storage::Store;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, warn};

/// Fixed tool allow-list passed to every dispatch; `Skill` is appended when
/// skills discovery is enabled.
const BASE_ALLOWED_TOOLS: &str = "Read,Edit,Bash,Write,Glob,Grep";

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub claude_oauth_token: String,
    pub forge_token: String,
    pub base_branch: String,
    pub max_concurrent_agents: usize,
    pub agent_timeout_seconds: u64,
    pub max_rate_limit_resumes: i64,
    pub skills_enabled: bool,
}

struct RunningWorker {
    issue_number: IssueNumber,
    pr_number: Option<PrNumber>,
    agent_type: AgentType,
    started_at: Instant,
    events: Arc<AsyncMutex<Vec<StreamEvent>>>,
}

enum ResumeArgs {
    SessionId(String),
    Continue,
}

pub struct WorkerPool {
    store: Arc<Store>,
    forge: Arc<ForgeGateway>,
    workspace: Arc<WorkspaceManager>,
    prompts: Arc<PromptBuilder>,
    config: PoolConfig,
    running: Arc<SyncMutex<HashMap<AgentId, RunningWorker>>>,
}

impl WorkerPool {
    pub fn new(
        store: Arc<Store>,
        forge: Arc<ForgeGateway>,
        workspace: Arc<WorkspaceManager>,
        prompts: Arc<PromptBuilder>,
        config: PoolConfig,
    ) -> Self {
        Self {
            store,
            forge,
            workspace,
            prompts,
            config,
            running: Arc::new(SyncMutex::new(HashMap::new())),
        }
    }

    fn allowed_tools(&self) -> String {
        if self.config.skills_enabled {
            format!("{BASE_ALLOWED_TOOLS},Skill")
        } else {
            BASE_ALLOWED_TOOLS.to_string()
        }
    }

    fn running_count(&self) -> usize {
        self.running.lock().len()
    }

    async fn spawn_subprocess(&self, worktree_path: &str, prompt: &str, resume: Option<ResumeArgs>) -> Result<Child, PoolError> {
        let mut cmd = Command::new("claude");
        cmd.current_dir(worktree_path)
            .arg("-p")
            .arg(prompt)
            .arg("--allowedTools")
            .arg(self.allowed_tools())
            .arg("--output-format")
            .arg("stream-json")
            .arg("--verbose");
        match resume {
            Some(ResumeArgs::SessionId(sid)) => {
                cmd.arg("--resume").arg(sid);
            }
            Some(ResumeArgs::Continue) => {
                cmd.arg("--continue");
            }
            None => {}
        }
        cmd.env("CLAUDE_CODE_OAUTH_TOKEN", &self.config.claude_oauth_token)
            .env("GH_TOKEN", &self.config.forge_token)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0);
        cmd.spawn().map_err(PoolError::Spawn)
    }

    fn register_and_monitor(&self, agent_id: AgentId, issue_number: IssueNumber, pr_number: Option<PrNumber>, agent_type: AgentType, child: Child) {
        let events = Arc::new(AsyncMutex::new(Vec::new()));
        let started_at = Instant::now();
        self.running.lock().insert(
            agent_id.clone(),
            RunningWorker { issue_number, pr_number, agent_type, started_at, events: events.clone() },
        );

        let store = self.store.clone();
        let forge = self.forge.clone();
        let workspace = self.workspace.clone();
        let running = self.running.clone();
        let config = self.config.clone();

        tokio::spawn(monitor(store, forge, workspace, running, config, agent_id, child, started_at, events));
    }

    async fn dispatch_implement_inner(&self, issue_number: IssueNumber) -> Result<Option<AgentId>, PoolError> {
        if self.running_count() >= self.config.max_concurrent_agents {
            warn!(%issue_number, active = %self.running_count(), cap = %self.config.max_concurrent_agents, "agent pool at capacity, cannot dispatch");
            return Ok(None);
        }

        if let Err(e) = self.forge.fetch().await {
            warn!(%issue_number, error = %e, "failed to fetch target repo before dispatch");
        }
        if let Err(e) = self.forge.pull(&self.config.base_branch).await {
            debug!(%issue_number, error = %e, "pull before dispatch did not fast-forward");
        }

        let (worktree_path, branch_name) = match self
            .workspace
            .create_implement_workspace(issue_number.0, &self.config.base_branch)
            .await
        {
            Ok(v) => v,
            Err(e) => {
                warn!(%issue_number, error = %e, "failed to create implement workspace");
                return Ok(None);
            }
        };

        let prompt = self.prompts.implement(issue_number.0);
        let agent_id = AgentId::for_issue(issue_number.0, Utc::now().timestamp());

        let child = match self.spawn_subprocess(&worktree_path, &prompt, None).await {
            Ok(c) => c,
            Err(e) => {
                warn!(%agent_id, error = %e, "failed to spawn implement worker");
                let _ = self.workspace.cleanup_worktree(&worktree_path).await;
                return Ok(None);
            }
        };

        let pid = child.id().map(|p| p as i32);
        let now = Utc::now();
        let worker = Worker {
            agent_id: agent_id.clone(),
            issue_number,
            pr_number: None,
            agent_type: AgentType::Implement,
            status: WorkerStatus::Running,
            worktree_path,
            branch_name,
            pid,
            session_id: None,
            turns_used: 0,
            resume_count: 0,
            rate_limited_at: None,
            started_at: now,
            finished_at: None,
            error_message: None,
        };
        self.store.insert_worker(&worker)?;
        self.store.update_issue(issue_number, IssueStatus::InProgress, Some(Some(&agent_id)), None, now)?;
        self.store.increment_issue_attempts(issue_number, now)?;

        self.register_and_monitor(agent_id.clone(), issue_number, None, AgentType::Implement, child);
        info!(%agent_id, %issue_number, "dispatched implement worker");
        Ok(Some(agent_id))
    }

    async fn dispatch_fix_review_inner(
        &self,
        pr_number: PrNumber,
        branch_name: String,
        issue_number: IssueNumber,
        unresolved_threads: Option<Vec<ReviewThread>>,
    ) -> Result<Option<AgentId>, PoolError> {
        if self.running_count() >= self.config.max_concurrent_agents {
            warn!(%pr_number, active = %self.running_count(), cap = %self.config.max_concurrent_agents, "agent pool at capacity, cannot dispatch fix-review worker");
            return Ok(None);
        }

        if let Err(e) = self.forge.fetch().await {
            warn!(%pr_number, error = %e, "failed to fetch before fix-review dispatch");
        }

        let worktree_path = match self.workspace.create_fix_review_workspace(pr_number.0, &branch_name).await {
            Ok(p) => p,
            Err(e) => {
                warn!(%pr_number, error = %e, "failed to create fix-review workspace");
                return Ok(None);
            }
        };

        let prompt = self.prompts.fix_review(pr_number.0, unresolved_threads.as_deref());
        let agent_id = AgentId::for_pr_fix(pr_number.0, Utc::now().timestamp());

        let child = match self.spawn_subprocess(&worktree_path, &prompt, None).await {
            Ok(c) => c,
            Err(e) => {
                warn!(%agent_id, error = %e, "failed to spawn fix-review worker");
                let _ = self.workspace.cleanup_worktree(&worktree_path).await;
                return Ok(None);
            }
        };

        let pid = child.id().map(|p| p as i32);
        let now = Utc::now();
        let worker = Worker {
            agent_id: agent_id.clone(),
            issue_number,
            pr_number: Some(pr_number),
            agent_type: AgentType::FixReview,
            status: WorkerStatus::Running,
            worktree_path,
            branch_name,
            pid,
            session_id: None,
            turns_used: 0,
            resume_count: 0,
            rate_limited_at: None,
            started_at: now,
            finished_at: None,
            error_message: None,
        };
        self.store.insert_worker(&worker)?;

        self.register_and_monitor(agent_id.clone(), issue_number, Some(pr_number), AgentType::FixReview, child);
        info!(%agent_id, %pr_number, "dispatched fix-review worker");
        Ok(Some(agent_id))
    }

    async fn resume_rate_limited_inner(&self, agent_id: &AgentId) -> Result<(), PoolError> {
        let Some(worker) = self.store.get_worker(agent_id)? else {
            warn!(%agent_id, "resume requested for unknown worker");
            return Ok(());
        };
        if worker.status != WorkerStatus::RateLimited {
            debug!(%agent_id, status = %worker.status, "resume requested but worker is no longer rate_limited, skipping");
            return Ok(());
        }

        let now = Utc::now();

        if worker.resume_count + 1 > self.config.max_rate_limit_resumes {
            warn!(%agent_id, resume_count = worker.resume_count, cap = self.config.max_rate_limit_resumes, "resume ceiling reached, marking failed");
            self.fail_rate_limited(worker, "maximum rate-limit resumes exceeded".to_string(), now).await?;
            return Ok(());
        }

        if !tokio::fs::try_exists(&worker.worktree_path).await.unwrap_or(false) {
            warn!(%agent_id, path = %worker.worktree_path, "worktree lost, cannot resume");
            self.fail_rate_limited(worker, "worktree lost".to_string(), now).await?;
            return Ok(());
        }

        let prompt = match worker.agent_type {
            AgentType::Implement => self.prompts.resume_implement(worker.issue_number.0),
            AgentType::FixReview => {
                let pr_number = worker.pr_number.map(|p| p.0).unwrap_or(0);
                self.prompts.resume_fix_review(pr_number, None)
            }
        };
        let resume_args = match &worker.session_id {
            Some(sid) => ResumeArgs::SessionId(sid.clone()),
            None => ResumeArgs::Continue,
        };

        let child = match self.spawn_subprocess(&worker.worktree_path, &prompt, Some(resume_args)).await {
            Ok(c) => c,
            Err(e) => {
                warn!(%agent_id, error = %e, "failed to spawn resumed worker, leaving rate_limited for next cycle");
                return Ok(());
            }
        };

        let pid = child.id().map(|p| p as i32);
        let new_agent_id = match worker.agent_type {
            AgentType::Implement => AgentId::for_issue(worker.issue_number.0, now.timestamp()),
            AgentType::FixReview => AgentId::for_pr_fix(worker.pr_number.map(|p| p.0).unwrap_or(0), now.timestamp()),
        };

        let mut old_worker = worker.clone();
        old_worker.status = WorkerStatus::Resumed;
        old_worker.finished_at = Some(now);
        self.store.update_worker(&old_worker)?;

        let new_worker = Worker {
            agent_id: new_agent_id.clone(),
            issue_number: worker.issue_number,
            pr_number: worker.pr_number,
            agent_type: worker.agent_type,
            status: WorkerStatus::Running,
            worktree_path: worker.worktree_path.clone(),
            branch_name: worker.branch_name.clone(),
            pid,
            session_id: worker.session_id.clone(),
            turns_used: 0,
            resume_count: worker.resume_count + 1,
            rate_limited_at: None,
            started_at: now,
            finished_at: None,
            error_message: None,
        };
        self.store.insert_worker(&new_worker)?;
        self.store.update_issue(worker.issue_number, IssueStatus::InProgress, Some(Some(&new_agent_id)), None, now)?;

        self.register_and_monitor(new_agent_id.clone(), worker.issue_number, worker.pr_number, worker.agent_type, child);
        info!(old_agent_id = %agent_id, new_agent_id = %new_agent_id, resume_count = new_worker.resume_count, "resumed rate-limited worker");
        Ok(())
    }

    async fn fail_rate_limited(&self, mut worker: Worker, reason: String, now: chrono::DateTime<Utc>) -> Result<(), PoolError> {
        let issue_number = worker.issue_number;
        let agent_type = worker.agent_type;
        let worktree_path = worker.worktree_path.clone();

        worker.status = WorkerStatus::Failed;
        worker.error_message = Some(reason);
        worker.finished_at = Some(now);
        self.store.update_worker(&worker)?;
        let _ = self.workspace.cleanup_worktree(&worktree_path).await;
        if agent_type == AgentType::Implement {
            self.store.update_issue(issue_number, IssueStatus::Pending, None, None, now)?;
        }
        Ok(())
    }
}

#[async_trait]
impl Dispatcher for WorkerPool {
    async fn can_dispatch(&self) -> bool {
        self.running_count() < self.config.max_concurrent_agents
    }

    async fn dispatch_implement(&self, issue_number: IssueNumber) -> Result<Option<AgentId>, PoolError> {
        self.dispatch_implement_inner(issue_number).await
    }

    async fn dispatch_fix_review(
        &self,
        pr_number: PrNumber,
        branch_name: String,
        issue_number: IssueNumber,
        unresolved_threads: Option<Vec<ReviewThread>>,
    ) -> Result<Option<AgentId>, PoolError> {
        self.dispatch_fix_review_inner(pr_number, branch_name, issue_number, unresolved_threads).await
    }

    async fn resume_rate_limited(&self, agent_id: &AgentId) -> Result<(), PoolError> {
        self.resume_rate_limited_inner(agent_id).await
    }

    async fn active_agents(&self) -> Vec<ActiveAgentSummary> {
        let snapshot: Vec<_> = {
            let running = self.running.lock();
            running
                .iter()
                .map(|(id, rw)| (id.clone(), rw.issue_number, rw.pr_number, rw.agent_type, rw.started_at, rw.events.clone()))
                .collect()
        };
        let mut out = Vec::with_capacity(snapshot.len());
        for (agent_id, issue_number, pr_number, agent_type, started_at, events) in snapshot {
            let events = events.lock().await;
            let mut recent: Vec<String> = events.iter().rev().take(5).map(|e| e.summary.clone()).collect();
            recent.reverse();
            out.push(ActiveAgentSummary {
                agent_id,
                issue_number,
                pr_number,
                agent_type,
                status: WorkerStatus::Running,
                elapsed_seconds: started_at.elapsed().as_secs(),
                event_count: events.len(),
                recent_events: recent,
            });
        }
        out
    }
}

async fn monitor(
    store: Arc<Store>,
    forge: Arc<ForgeGateway>,
    workspace: Arc<WorkspaceManager>,
    running: Arc<SyncMutex<HashMap<AgentId, RunningWorker>>>,
    config: PoolConfig,
    agent_id: AgentId,
    mut child: Child,
    started_at: Instant,
    events: Arc<AsyncMutex<Vec<StreamEvent>>>,
) {
    let timeout = Duration::from_secs(config.agent_timeout_seconds);

    let Some(stdout) = child.stdout.take() else {
        error!(%agent_id, "spawned child has no stdout pipe");
        running.lock().remove(&agent_id);
        return;
    };
    let Some(stderr) = child.stderr.take() else {
        error!(%agent_id, "spawned child has no stderr pipe");
        running.lock().remove(&agent_id);
        return;
    };

    let stderr_buf: Arc<AsyncMutex<String>> = Arc::new(AsyncMutex::new(String::new()));
    let reader_handle = tokio::spawn(read_stdout(store.clone(), agent_id.clone(), stdout, events.clone()));
    let stderr_handle = tokio::spawn(read_stderr(stderr, stderr_buf.clone()));

    let mut timed_out = false;
    let exit_status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) => {
                if started_at.elapsed() > timeout {
                    warn!(%agent_id, "worker exceeded timeout, terminating");
                    terminate_child(&mut child).await;
                    timed_out = true;
                    break None;
                }
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            Err(e) => {
                error!(%agent_id, error = %e, "error polling worker liveness");
                break None;
            }
        }
    };

    let _ = reader_handle.await;
    let _ = stderr_handle.await;
    running.lock().remove(&agent_id);

    let Ok(Some(mut worker)) = store.get_worker(&agent_id) else {
        error!(%agent_id, "worker row missing or unreadable when finishing monitor");
        return;
    };

    let snapshot = events.lock().await.clone();
    let stderr_content = stderr_buf.lock().await.clone();
    let now = Utc::now();
    worker.turns_used = count_turns(&snapshot);
    if let Some(sid) = extract_session_id(&snapshot) {
        worker.session_id = Some(sid);
    }

    if timed_out {
        finish_timeout(&store, &workspace, worker, now).await;
        return;
    }

    match exit_status {
        Some(status) if status.success() => {
            match worker.agent_type {
                AgentType::FixReview => finish_fix_review_success(&store, &workspace, worker, now).await,
                AgentType::Implement => {
                    reconcile_implement(&store, &forge, &workspace, worker, &snapshot, &config.base_branch, now).await
                }
            }
        }
        _ => {
            let rate_limited = is_rate_limit_message(&stderr_content)
                || snapshot
                    .iter()
                    .any(|e| matches!(e.kind, StreamEventKind::Error) && is_rate_limit_message(&e.raw.to_string()));
            if rate_limited {
                finish_rate_limited(&store, worker, now).await;
            } else {
                let truncated: String = stderr_content.chars().take(500).collect();
                let reason = if truncated.is_empty() {
                    exit_status.map(|s| format!("exited with status {s}")).unwrap_or_else(|| "liveness check failed".to_string())
                } else {
                    truncated
                };
                finish_failed(&store, &workspace, worker, reason, now).await;
            }
        }
    }
}

async fn finish_timeout(store: &Store, workspace: &WorkspaceManager, mut worker: Worker, now: chrono::DateTime<Utc>) {
    worker.status = WorkerStatus::Timeout;
    worker.finished_at = Some(now);
    worker.error_message = Some("agent exceeded timeout".to_string());
    let issue_number = worker.issue_number;
    let agent_type = worker.agent_type;
    let worktree_path = worker.worktree_path.clone();
    if let Err(e) = store.update_worker(&worker) {
        error!(agent_id = %worker.agent_id, error = %e, "failed to persist timeout");
    }
    let _ = workspace.cleanup_worktree(&worktree_path).await;
    if agent_type == AgentType::Implement {
        if let Err(e) = store.update_issue(issue_number, IssueStatus::Pending, None, None, now) {
            error!(%issue_number, error = %e, "failed to reset issue after worker timeout");
        }
    }
}

async fn finish_fix_review_success(store: &Store, workspace: &WorkspaceManager, mut worker: Worker, now: chrono::DateTime<Utc>) {
    worker.status = WorkerStatus::Completed;
    worker.finished_at = Some(now);
    let worktree_path = worker.worktree_path.clone();
    if let Err(e) = store.update_worker(&worker) {
        error!(agent_id = %worker.agent_id, error = %e, "failed to persist fix-review completion");
    }
    let _ = workspace.cleanup_worktree(&worktree_path).await;
}

async fn finish_rate_limited(store: &Store, mut worker: Worker, now: chrono::DateTime<Utc>) {
    worker.status = WorkerStatus::RateLimited;
    worker.rate_limited_at = Some(now);
    worker.finished_at = None;
    if let Err(e) = store.update_worker(&worker) {
        error!(agent_id = %worker.agent_id, error = %e, "failed to persist rate_limited status");
    }
}

async fn finish_failed(store: &Store, workspace: &WorkspaceManager, mut worker: Worker, reason: String, now: chrono::DateTime<Utc>) {
    worker.status = WorkerStatus::Failed;
    worker.error_message = Some(reason);
    worker.finished_at = Some(now);
    let issue_number = worker.issue_number;
    let agent_type = worker.agent_type;
    let worktree_path = worker.worktree_path.clone();
    if let Err(e) = store.update_worker(&worker) {
        error!(agent_id = %worker.agent_id, error = %e, "failed to persist failed status");
    }
    let _ = workspace.cleanup_worktree(&worktree_path).await;
    if agent_type == AgentType::Implement {
        if let Err(e) = store.update_issue(issue_number, IssueStatus::Pending, None, None, now) {
            error!(%issue_number, error = %e, "failed to reset issue after worker failure");
        }
    }
}

async fn finish_implement_success(store: &Store, workspace: &WorkspaceManager, mut worker: Worker, pr_number: PrNumber, now: chrono::DateTime<Utc>) {
    worker.status = WorkerStatus::Completed;
    worker.pr_number = Some(pr_number);
    worker.finished_at = Some(now);
    let issue_number = worker.issue_number;
    let worktree_path = worker.worktree_path.clone();
    if let Err(e) = store.update_worker(&worker) {
        error!(agent_id = %worker.agent_id, error = %e, "failed to persist implement completion");
    }
    if let Err(e) = store.update_issue(issue_number, IssueStatus::PrCreated, None, Some(Some(pr_number)), now) {
        error!(%issue_number, error = %e, "failed to mark issue pr_created");
    }
    let _ = workspace.cleanup_worktree(&worktree_path).await;
    info!(agent_id = %worker.agent_id, %issue_number, %pr_number, "implement worker produced a pull request");
}

/// The five-step reconciliation chain for a zero-exit implement Worker that
/// did not obviously reference a pull request in its own output.
async fn reconcile_implement(
    store: &Store,
    forge: &ForgeGateway,
    workspace: &WorkspaceManager,
    worker: Worker,
    events: &[StreamEvent],
    base_branch: &str,
    now: chrono::DateTime<Utc>,
) {
    let issue_number = worker.issue_number;
    let head = worker.branch_name.clone();

    // Step 1: PR number surfaced directly in the event stream.
    if let Some(pr) = extract_pr_number(events) {
        finish_implement_success(store, workspace, worker, PrNumber(pr), now).await;
        return;
    }

    // Step 2: forge already has an open PR for this branch.
    match forge.list_open_prs_by_head(&head).await {
        Ok(prs) if !prs.is_empty() => {
            finish_implement_success(store, workspace, worker, PrNumber(prs[0].number), now).await;
            return;
        }
        Ok(_) => {}
        Err(e) => warn!(%issue_number, error = %e, "failed to query open PRs by head during reconciliation"),
    }

    // Step 3: branch already on origin but no PR yet — create one ourselves.
    let branch_on_origin = forge.branch_exists_on_origin(&head).await.unwrap_or(false);
    if branch_on_origin {
        if let Some(pr) = create_recovery_pr(forge, &head, issue_number).await {
            finish_implement_success(store, workspace, worker, pr, now).await;
            return;
        }
    }

    // Step 4: local commits ahead of base, not yet pushed — push, then retry step 3.
    let worktree_path = Path::new(&worker.worktree_path);
    let ahead_of_base = forge.commits_ahead_of_base(worktree_path, base_branch).await.unwrap_or(false);
    if ahead_of_base {
        match forge.push_branch(worktree_path, &head).await {
            Ok(()) => {
                if let Some(pr) = create_recovery_pr(forge, &head, issue_number).await {
                    finish_implement_success(store, workspace, worker, pr, now).await;
                    return;
                }
            }
            Err(e) => warn!(%issue_number, error = %e, "failed to push branch during reconciliation"),
        }
    }

    // Step 5: nothing recoverable.
    finish_failed(
        store,
        workspace,
        worker,
        "implement worker exited cleanly but produced no pull request or pushable commits".to_string(),
        now,
    )
    .await;
}

async fn create_recovery_pr(forge: &ForgeGateway, head_branch: &str, issue_number: IssueNumber) -> Option<PrNumber> {
    let title = format!("Fix #{}: Auto-created from agent work", issue_number.0);
    let body = format!("Closes #{}\n\nAuto-created by the orchestration engine after the agent's worktree had pushable commits but produced no pull request.", issue_number.0);
    match forge.create_pr(head_branch, &title, &body).await {
        Ok(Some(pr)) => Some(PrNumber(pr)),
        Ok(None) => None,
        Err(e) => {
            warn!(%issue_number, error = %e, "failed to create recovery pull request");
            None
        }
    }
}

async fn terminate_child(child: &mut Child) {
    if let Some(pid) = child.id() {
        let _ = nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), nix::sys::signal::Signal::SIGTERM);
    }
    if tokio::time::timeout(Duration::from_secs(10), child.wait()).await.is_err() {
        let _ = child.start_kill();
        let _ = child.wait().await;
    }
}

async fn read_stdout(store: Arc<Store>, agent_id: AgentId, stdout: ChildStdout, events: Arc<AsyncMutex<Vec<StreamEvent>>>) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if let Some(event) = parse_stream_line(&line) {
                    if matches!(event.kind, StreamEventKind::ToolUse) {
                        info!(%agent_id, summary = %event.summary, "tool use");
                    }
                    if let Err(e) = store.insert_worker_event(&agent_id, &event.event_type_str(), &event.raw.to_string(), Utc::now()) {
                        warn!(%agent_id, error = %e, "failed to persist worker event");
                    }
                    events.lock().await.push(event);
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(%agent_id, error = %e, "error reading worker stdout");
                break;
            }
        }
    }
}

async fn read_stderr(stderr: ChildStderr, buf: Arc<AsyncMutex<String>>) {
    let mut lines = BufReader::new(stderr).lines();
    let mut acc = String::new();
    while let Ok(Some(line)) = lines.next_line().await {
        acc.push_str(&line);
        acc.push('\n');
    }
    *buf.lock().await = acc;
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
