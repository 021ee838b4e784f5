// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker (assistant subprocess instance) record, status, and event log.

use crate::id::AgentId;
use crate::issue::IssueNumber;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Forge-assigned pull request number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PrNumber(pub i64);

impl fmt::Display for PrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for PrNumber {
    fn from(n: i64) -> Self {
        Self(n)
    }
}

/// What kind of task a Worker is performing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    Implement,
    FixReview,
}

crate::simple_display! {
    AgentType {
        Implement => "implement",
        FixReview => "fix_review",
    }
}

impl AgentType {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "implement" => Self::Implement,
            "fix_review" => Self::FixReview,
            _ => return None,
        })
    }
}

/// Lifecycle state of a Worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    Running,
    Completed,
    Failed,
    Timeout,
    RateLimited,
    Resumed,
}

crate::simple_display! {
    WorkerStatus {
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Timeout => "timeout",
        RateLimited => "rate_limited",
        Resumed => "resumed",
    }
}

impl WorkerStatus {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "running" => Self::Running,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "timeout" => Self::Timeout,
            "rate_limited" => Self::RateLimited,
            "resumed" => Self::Resumed,
            _ => return None,
        })
    }

    /// True for statuses that hold an Issue in `in_progress` (invariant 3).
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Running | Self::RateLimited)
    }
}

/// One instance of the assistant subprocess working on one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub agent_id: AgentId,
    pub issue_number: IssueNumber,
    pub pr_number: Option<PrNumber>,
    pub agent_type: AgentType,
    pub status: WorkerStatus,
    pub worktree_path: String,
    pub branch_name: String,
    pub pid: Option<i32>,
    pub session_id: Option<String>,
    pub turns_used: i64,
    pub resume_count: i64,
    pub rate_limited_at: Option<DateTime<Utc>>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

/// One row of a Worker's append-only event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerEvent {
    pub id: i64,
    pub agent_id: AgentId,
    pub event_type: String,
    pub event_data: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
