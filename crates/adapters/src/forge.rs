// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A thin, stateless adapter over the `gh` and `git` CLIs.
//!
//! Every operation is one subprocess invocation with a bounded timeout (30s
//! typical, 60s for push), grounded in
//! `original_source/orchestrator/issue_poller.py`, `pr_monitor.py`, and
//! `worktree.py`'s `_run_gh`/`_run_git` helpers. The gateway never retries —
//! callers decide — and never raises on a parse failure: malformed CLI
//! output is logged and treated as empty.

use crate::error::ForgeError;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const PUSH_TIMEOUT: Duration = Duration::from_secs(60);

/// Matches the PR number out of the URL `gh pr create` prints on stdout,
/// e.g. `https://github.com/owner/repo/pull/123`.
// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static PR_URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/pull/(\d+)").expect("constant regex pattern is valid"));

#[derive(Debug, Clone, Deserialize)]
pub struct ForgeIssue {
    pub number: i64,
    pub title: String,
    #[serde(default)]
    pub labels: Vec<ForgeLabel>,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgeLabel {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueComment {
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
struct IssueCommentsResponse {
    #[serde(default)]
    comments: Vec<IssueComment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrListItem {
    pub number: i64,
}

#[derive(Debug, Clone, Deserialize)]
struct PrHeadRef {
    #[serde(rename = "headRefName")]
    head_ref_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InlineComment {
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrCheck {
    pub name: String,
    pub state: String,
    #[serde(default)]
    pub bucket: String,
}

#[derive(Debug, Clone)]
pub struct ReviewThread {
    pub is_resolved: bool,
    pub path: String,
    pub line: Option<i64>,
    pub comments: Vec<ReviewComment>,
}

#[derive(Debug, Clone)]
pub struct ReviewComment {
    pub body: String,
    pub author: String,
}

/// Either the authoritative structural thread query succeeded, or it
/// errored and callers should fall back to the REST comment heuristic.
/// The structural result is always preferred when available.
pub enum ReviewThreadsResult {
    Structural(Vec<ReviewThread>),
    QueryFailed,
}

pub struct ForgeGateway {
    forge_token: String,
    github_repo: String,
    target_repo_path: PathBuf,
}

impl ForgeGateway {
    pub fn new(forge_token: impl Into<String>, github_repo: impl Into<String>, target_repo_path: impl Into<PathBuf>) -> Self {
        Self {
            forge_token: forge_token.into(),
            github_repo: github_repo.into(),
            target_repo_path: target_repo_path.into(),
        }
    }

    async fn run_gh(&self, args: &[&str], timeout: Duration) -> Result<String, ForgeError> {
        run_with_timeout("gh", "gh", args, None, &[("GH_TOKEN", &self.forge_token)], timeout).await
    }

    async fn run_git(&self, args: &[&str], timeout: Duration) -> Result<String, ForgeError> {
        run_with_timeout(
            "git",
            "git",
            args,
            Some(&self.target_repo_path),
            &[],
            timeout,
        )
        .await
    }

    fn owner_repo(&self) -> (&str, &str) {
        self.github_repo.split_once('/').unwrap_or((&self.github_repo, ""))
    }

    // ---- Issues -------------------------------------------------------

    pub async fn list_open_issues_with_label(&self, label: &str) -> Result<Vec<ForgeIssue>, ForgeError> {
        let out = self
            .run_gh(
                &[
                    "issue", "list",
                    "--repo", &self.github_repo,
                    "--label", label,
                    "--state", "open",
                    "--json", "number,title,labels,body",
                    "--limit", "50",
                ],
                DEFAULT_TIMEOUT,
            )
            .await?;
        parse_or_empty("gh issue list", &out)
    }

    pub async fn read_issue_comments(&self, issue_number: i64) -> Result<Vec<IssueComment>, ForgeError> {
        let out = self
            .run_gh(
                &[
                    "issue", "view", &issue_number.to_string(),
                    "--repo", &self.github_repo,
                    "--json", "comments",
                ],
                DEFAULT_TIMEOUT,
            )
            .await?;
        let parsed: IssueCommentsResponse = parse_or_empty("gh issue view", &out)?;
        Ok(parsed.comments)
    }

    pub async fn add_label(&self, issue_number: i64, label: &str) -> Result<(), ForgeError> {
        self.run_gh(
            &[
                "issue", "edit", &issue_number.to_string(),
                "--repo", &self.github_repo,
                "--add-label", label,
            ],
            DEFAULT_TIMEOUT,
        )
        .await?;
        Ok(())
    }

    // ---- Pull requests --------------------------------------------------

    pub async fn list_open_prs_by_head(&self, head_branch: &str) -> Result<Vec<PrListItem>, ForgeError> {
        let out = self
            .run_gh(
                &[
                    "pr", "list",
                    "--repo", &self.github_repo,
                    "--head", head_branch,
                    "--state", "open",
                    "--json", "number",
                    "--limit", "1",
                ],
                DEFAULT_TIMEOUT,
            )
            .await?;
        parse_or_empty("gh pr list", &out)
    }

    pub async fn pr_head_branch(&self, pr_number: i64) -> Result<Option<String>, ForgeError> {
        let out = self
            .run_gh(
                &[
                    "pr", "view", &pr_number.to_string(),
                    "--repo", &self.github_repo,
                    "--json", "headRefName",
                ],
                DEFAULT_TIMEOUT,
            )
            .await?;
        let parsed: Option<PrHeadRef> = parse_or_log("gh pr view", &out);
        Ok(parsed.map(|p| p.head_ref_name))
    }

    pub async fn pr_inline_comments(&self, pr_number: i64) -> Result<Vec<InlineComment>, ForgeError> {
        let (owner, repo) = self.owner_repo();
        let out = self
            .run_gh(
                &["api", &format!("repos/{owner}/{repo}/pulls/{pr_number}/comments"), "--paginate"],
                DEFAULT_TIMEOUT,
            )
            .await?;
        parse_or_empty("gh api pulls/comments", &out)
    }

    pub async fn pr_checks(&self, pr_number: i64) -> Result<Vec<PrCheck>, ForgeError> {
        let out = self
            .run_gh(
                &[
                    "pr", "checks", &pr_number.to_string(),
                    "--repo", &self.github_repo,
                    "--json", "name,state,bucket",
                ],
                DEFAULT_TIMEOUT,
            )
            .await?;
        parse_or_empty("gh pr checks", &out)
    }

    /// Primary source of truth for review state: the forge's structured
    /// review-thread query. Returns `QueryFailed` (never an error) so
    /// callers fall back to the REST heuristic.
    pub async fn pr_review_threads(&self, pr_number: i64) -> ReviewThreadsResult {
        let (owner, repo) = self.owner_repo();
        let query = format!(
            "query($owner:String!,$repo:String!,$pr:Int!) {{ repository(owner:$owner,name:$repo) {{ \
             pullRequest(number:$pr) {{ reviewThreads(first:100) {{ nodes {{ isResolved path line \
             comments(first:50) {{ nodes {{ body author {{ login }} }} }} }} }} }} }} }}"
        );
        let result = self
            .run_gh(
                &[
                    "api", "graphql",
                    "-f", &format!("query={query}"),
                    "-f", &format!("owner={owner}"),
                    "-f", &format!("repo={repo}"),
                    "-F", &format!("pr={pr_number}"),
                ],
                DEFAULT_TIMEOUT,
            )
            .await;
        match result {
            Ok(out) => match parse_review_threads(&out) {
                Some(threads) => ReviewThreadsResult::Structural(threads),
                None => ReviewThreadsResult::QueryFailed,
            },
            Err(e) => {
                warn!(error = %e, pr_number, "structural review-thread query failed, falling back to REST");
                ReviewThreadsResult::QueryFailed
            }
        }
    }

    pub async fn create_pr(&self, head_branch: &str, title: &str, body: &str) -> Result<Option<i64>, ForgeError> {
        let out = self
            .run_gh(
                &[
                    "pr", "create",
                    "--repo", &self.github_repo,
                    "--head", head_branch,
                    "--title", title,
                    "--body", body,
                ],
                DEFAULT_TIMEOUT,
            )
            .await?;
        // `gh pr create` has no --json flag; it prints the PR's URL on success.
        match PR_URL_PATTERN.captures(out.trim()).and_then(|c| c[1].parse::<i64>().ok()) {
            Some(number) => Ok(Some(number)),
            None => {
                debug!(output = %out.trim(), "gh pr create did not print a recognizable PR URL, falling back to gh pr view");
                let view_out = self
                    .run_gh(&["pr", "view", head_branch, "--repo", &self.github_repo, "--json", "number"], DEFAULT_TIMEOUT)
                    .await?;
                #[derive(Deserialize)]
                struct Viewed {
                    number: i64,
                }
                let parsed: Option<Viewed> = parse_or_log("gh pr view", &view_out);
                Ok(parsed.map(|v| v.number))
            }
        }
    }

    // ---- Source control -------------------------------------------------

    pub async fn fetch(&self) -> Result<(), ForgeError> {
        self.run_git(&["fetch", "origin"], DEFAULT_TIMEOUT).await?;
        Ok(())
    }

    pub async fn fetch_branch(&self, branch: &str) -> Result<(), ForgeError> {
        let _ = self.run_git(&["fetch", "origin", branch], DEFAULT_TIMEOUT).await;
        Ok(())
    }

    pub async fn pull(&self, base_branch: &str) -> Result<(), ForgeError> {
        let _ = self.run_git(&["pull", "origin", base_branch], DEFAULT_TIMEOUT).await;
        Ok(())
    }

    pub async fn branch_exists_on_origin(&self, branch: &str) -> Result<bool, ForgeError> {
        let out = self.run_git(&["ls-remote", "--heads", "origin", branch], DEFAULT_TIMEOUT).await?;
        Ok(!out.trim().is_empty())
    }

    pub async fn commits_ahead_of_base(&self, worktree_path: &Path, base_branch: &str) -> Result<bool, ForgeError> {
        let out = run_with_timeout(
            "git",
            "git",
            &["-C", &worktree_path.to_string_lossy(), "log", &format!("{base_branch}..HEAD"), "--oneline"],
            None,
            &[],
            DEFAULT_TIMEOUT,
        )
        .await?;
        Ok(!out.trim().is_empty())
    }

    pub async fn push_branch(&self, worktree_path: &Path, branch: &str) -> Result<(), ForgeError> {
        run_with_timeout(
            "git",
            "git",
            &["-C", &worktree_path.to_string_lossy(), "push", "-u", "origin", branch],
            None,
            &[],
            PUSH_TIMEOUT,
        )
        .await?;
        Ok(())
    }
}

fn parse_or_empty<T: Default + for<'de> Deserialize<'de>>(program: &'static str, out: &str) -> Result<T, ForgeError> {
    let trimmed = out.trim();
    if trimmed.is_empty() {
        return Ok(T::default());
    }
    match serde_json::from_str(trimmed) {
        Ok(v) => Ok(v),
        Err(e) => {
            warn!(program, error = %e, "failed to parse forge CLI output, treating as empty");
            Ok(T::default())
        }
    }
}

fn parse_or_log<T: for<'de> Deserialize<'de>>(program: &'static str, out: &str) -> Option<T> {
    let trimmed = out.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str(trimmed) {
        Ok(v) => Some(v),
        Err(e) => {
            debug!(program, error = %e, "failed to parse forge CLI output");
            None
        }
    }
}

fn parse_review_threads(raw: &str) -> Option<Vec<ReviewThread>> {
    let value: serde_json::Value = serde_json::from_str(raw.trim()).ok()?;
    let nodes = value
        .pointer("/data/repository/pullRequest/reviewThreads/nodes")?
        .as_array()?;
    let mut threads = Vec::with_capacity(nodes.len());
    for node in nodes {
        let is_resolved = node.get("isResolved")?.as_bool().unwrap_or(false);
        let path = node.get("path").and_then(|v| v.as_str()).unwrap_or("unknown").to_string();
        let line = node.get("line").and_then(|v| v.as_i64());
        let comments = node
            .pointer("/comments/nodes")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .map(|c| ReviewComment {
                        body: c.get("body").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
                        author: c
                            .pointer("/author/login")
                            .and_then(|v| v.as_str())
                            .unwrap_or("unknown")
                            .to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        threads.push(ReviewThread { is_resolved, path, line, comments });
    }
    Some(threads)
}

async fn run_with_timeout(
    label: &'static str,
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
    env: &[(&str, &str)],
    timeout: Duration,
) -> Result<String, ForgeError> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(cwd) = cwd {
        cmd.current_dir(cwd);
    }
    for (key, value) in env {
        cmd.env(key, value);
    }

    debug!(program, args = ?args, "running forge CLI command");

    let child = cmd.spawn().map_err(|source| ForgeError::Spawn { program: label, source })?;
    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| ForgeError::Timeout { program: label, timeout_secs: timeout.as_secs() })?
        .map_err(|source| ForgeError::Spawn { program: label, source })?;

    if !output.status.success() {
        return Err(ForgeError::NonZeroExit {
            program: label,
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
