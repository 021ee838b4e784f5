// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Creates, identifies, and tears down isolated per-task scratch checkouts,
//! reimplemented with `tokio::process::Command` from
//! `original_source/orchestrator/worktree.py`'s `create_worktree` /
//! `create_worktree_for_pr` / `cleanup_worktree` / `list_worktrees`.

use crate::error::ForgeError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

const GIT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct ActiveWorktree {
    pub path: String,
    pub branch: Option<String>,
}

pub struct WorkspaceManager {
    target_repo_path: PathBuf,
    worktree_dir: PathBuf,
}

impl WorkspaceManager {
    pub fn new(target_repo_path: impl Into<PathBuf>, worktree_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_repo_path: target_repo_path.into(),
            worktree_dir: worktree_dir.into(),
        }
    }

    /// Implement workspace for issue *N*: a new branch `fix/issue-N` off
    /// `base_branch`, checked out at `<worktree_dir>/issue-N`.
    pub async fn create_implement_workspace(&self, issue_number: i64, base_branch: &str) -> Result<(String, String), ForgeError> {
        let branch_name = format!("fix/issue-{issue_number}");
        let path = self.worktree_dir.join(format!("issue-{issue_number}"));
        self.ensure_fresh(&path).await?;
        self.run_git(&["worktree", "add", &path.to_string_lossy(), "-b", &branch_name, base_branch])
            .await?;
        info!(issue_number, path = %path.display(), branch = %branch_name, "created implement workspace");
        Ok((path.to_string_lossy().into_owned(), branch_name))
    }

    /// Fix-review workspace for PR *P* on branch *B*: fetches `B` from
    /// origin, checked out at `<worktree_dir>/pr-fix-P`.
    pub async fn create_fix_review_workspace(&self, pr_number: i64, branch_name: &str) -> Result<String, ForgeError> {
        let path = self.worktree_dir.join(format!("pr-fix-{pr_number}"));
        self.ensure_fresh(&path).await?;
        // Best-effort: the branch may already be reachable locally.
        let _ = self.run_git(&["fetch", "origin", branch_name]).await;
        self.run_git(&["worktree", "add", &path.to_string_lossy(), branch_name]).await?;
        info!(pr_number, path = %path.display(), branch = %branch_name, "created fix-review workspace");
        Ok(path.to_string_lossy().into_owned())
    }

    pub async fn cleanup_worktree(&self, path: &str) -> Result<(), ForgeError> {
        info!(path, "cleaning up worktree");
        let _ = self.run_git(&["worktree", "remove", path, "--force"]).await;
        Ok(())
    }

    pub async fn list_worktrees(&self) -> Result<Vec<ActiveWorktree>, ForgeError> {
        let out = self.run_git(&["worktree", "list", "--porcelain"]).await?;
        Ok(parse_worktree_list(&out))
    }

    async fn ensure_fresh(&self, path: &Path) -> Result<(), ForgeError> {
        tokio::fs::create_dir_all(&self.worktree_dir).await.ok();
        if path.exists() {
            warn!(path = %path.display(), "worktree already exists, removing first");
            self.cleanup_worktree(&path.to_string_lossy()).await?;
        }
        Ok(())
    }

    async fn run_git(&self, args: &[&str]) -> Result<String, ForgeError> {
        let mut cmd = Command::new("git");
        cmd.arg("-C")
            .arg(&self.target_repo_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = cmd.spawn().map_err(|source| ForgeError::Spawn { program: "git", source })?;
        let output = tokio::time::timeout(GIT_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| ForgeError::Timeout { program: "git", timeout_secs: GIT_TIMEOUT.as_secs() })?
            .map_err(|source| ForgeError::Spawn { program: "git", source })?;

        if !output.status.success() {
            return Err(ForgeError::NonZeroExit {
                program: "git",
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn parse_worktree_list(porcelain: &str) -> Vec<ActiveWorktree> {
    let mut worktrees = Vec::new();
    let mut path: Option<String> = None;
    let mut branch: Option<String> = None;
    for line in porcelain.lines() {
        if line.is_empty() {
            if let Some(path) = path.take() {
                worktrees.push(ActiveWorktree { path, branch: branch.take() });
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix("worktree ") {
            path = Some(rest.to_string());
        } else if let Some(rest) = line.strip_prefix("branch ") {
            branch = Some(rest.to_string());
        }
    }
    if let Some(path) = path {
        worktrees.push(ActiveWorktree { path, branch });
    }
    worktrees
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_porcelain_worktree_list() {
        let porcelain = "worktree /repo\nHEAD abcdef\nbranch refs/heads/main\n\nworktree /repo/issue-1\nHEAD 123456\nbranch refs/heads/fix/issue-1\n";
        let worktrees = parse_worktree_list(porcelain);
        assert_eq!(worktrees.len(), 2);
        assert_eq!(worktrees[1].path, "/repo/issue-1");
        assert_eq!(worktrees[1].branch.as_deref(), Some("refs/heads/fix/issue-1"));
    }
}
