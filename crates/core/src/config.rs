// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime configuration, loaded from the environment (optionally via a
//! `.env` file) and validated at startup.
//!
//! Variable names (`CLAUDE_CODE_OAUTH_TOKEN`, `GH_TOKEN`, `GITHUB_REPO`,
//! `POLL_INTERVAL_SECONDS`, ...) are kept stable across releases so
//! deployed `.env` files never need editing on upgrade.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("environment variable {name} has invalid value {value:?}: {reason}")]
    InvalidVar {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("{0} repo must be in owner/repo form, got {1:?}")]
    BadRepoForm(&'static str, String),
    #[error("required executable {0:?} not found on PATH")]
    MissingExecutable(&'static str),
}

/// Full runtime configuration for the supervisor.
#[derive(Debug, Clone)]
pub struct Config {
    pub claude_oauth_token: String,
    pub forge_token: String,
    pub github_repo: String,
    pub base_branch: String,
    pub target_repo_path: PathBuf,

    pub poll_interval_seconds: u64,
    pub issue_label: String,
    pub max_issue_retries: i64,
    pub trigger_mention: String,

    pub max_concurrent_agents: usize,
    pub agent_max_turns_implement: u32,
    pub agent_max_turns_fix: u32,
    pub agent_timeout_seconds: u64,

    pub pr_poll_interval_seconds: u64,
    pub max_pr_fix_retries: i64,
    pub ci_wait_timeout_seconds: u64,

    pub rate_limit_retry_interval: u64,
    pub max_rate_limit_resumes: i64,

    pub dashboard_port: u16,
    pub worktree_dir: PathBuf,
    pub db_path: PathBuf,
    pub skills_enabled: bool,
}

impl Config {
    /// Load from the process environment, after attempting to load a
    /// `.env` file via `dotenvy` (a no-op if none is present).
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            claude_oauth_token: require_var("CLAUDE_CODE_OAUTH_TOKEN")?,
            forge_token: require_var("GH_TOKEN")?,
            github_repo: require_var("GITHUB_REPO")?,
            base_branch: env_or("BASE_BRANCH", "main"),
            target_repo_path: PathBuf::from(env_or("TARGET_REPO_PATH", ".")),

            poll_interval_seconds: env_parse_or("POLL_INTERVAL_SECONDS", 300)?,
            issue_label: env_or("ISSUE_LABEL", "agent"),
            max_issue_retries: env_parse_or("MAX_ISSUE_RETRIES", 3)?,
            trigger_mention: env_or("TRIGGER_MENTION", "@claude-swarm"),

            max_concurrent_agents: env_parse_or("MAX_CONCURRENT_AGENTS", 3)?,
            agent_max_turns_implement: env_parse_or("AGENT_MAX_TURNS_IMPLEMENT", 30)?,
            agent_max_turns_fix: env_parse_or("AGENT_MAX_TURNS_FIX", 20)?,
            agent_timeout_seconds: env_parse_or("AGENT_TIMEOUT_SECONDS", 1800)?,

            pr_poll_interval_seconds: env_parse_or("PR_POLL_INTERVAL_SECONDS", 120)?,
            max_pr_fix_retries: env_parse_or("MAX_PR_FIX_RETRIES", 5)?,
            ci_wait_timeout_seconds: env_parse_or("CI_WAIT_TIMEOUT_SECONDS", 600)?,

            rate_limit_retry_interval: env_parse_or("RATE_LIMIT_RETRY_INTERVAL", 300)?,
            max_rate_limit_resumes: env_parse_or("MAX_RATE_LIMIT_RESUMES", 5)?,

            dashboard_port: env_parse_or("DASHBOARD_PORT", 8420)?,
            worktree_dir: PathBuf::from(env_or("WORKTREE_DIR", "./worktrees")),
            db_path: PathBuf::from(env_or("DB_PATH", "./swarm.db")),
            skills_enabled: env_parse_or("SKILLS_ENABLED", false)?,
        })
    }

    /// Checks the repo form, base branch, and presence of the forge and
    /// source-control CLIs on `PATH`. Fatal at startup on any failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.github_repo.split('/').count() != 2 {
            return Err(ConfigError::BadRepoForm("GITHUB_REPO", self.github_repo.clone()));
        }
        if self.base_branch.trim().is_empty() {
            return Err(ConfigError::InvalidVar {
                name: "BASE_BRANCH",
                value: self.base_branch.clone(),
                reason: "must not be empty".to_string(),
            });
        }
        for exe in ["gh", "git", "claude"] {
            if which_on_path(exe).is_none() {
                return Err(ConfigError::MissingExecutable(exe));
            }
        }
        Ok(())
    }
}

fn require_var(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse_or<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => raw.parse::<T>().map_err(|e| ConfigError::InvalidVar {
            name,
            value: raw,
            reason: e.to_string(),
        }),
    }
}

fn which_on_path(exe: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var).find_map(|dir| {
        let candidate = dir.join(exe);
        candidate.is_file().then_some(candidate)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parse_or_falls_back_to_default() {
        std::env::remove_var("SWARM_TEST_UNSET_VAR");
        let v: u64 = env_parse_or("SWARM_TEST_UNSET_VAR", 42).unwrap();
        assert_eq!(v, 42);
    }

    #[test]
    fn env_parse_or_rejects_bad_value() {
        std::env::set_var("SWARM_TEST_BAD_VAR", "not-a-number");
        let result: Result<u64, ConfigError> = env_parse_or("SWARM_TEST_BAD_VAR", 1);
        assert!(result.is_err());
        std::env::remove_var("SWARM_TEST_BAD_VAR");
    }
}
