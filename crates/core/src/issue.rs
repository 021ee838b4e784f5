// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Issue identifier, status, and record.

use crate::id::AgentId;
use crate::worker::PrNumber;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Forge-assigned issue number; also the Issue table's primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IssueNumber(pub i64);

impl fmt::Display for IssueNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for IssueNumber {
    fn from(n: i64) -> Self {
        Self(n)
    }
}

/// Lifecycle state of an Issue.
///
/// `Resolved` is terminal except for the forge-driven self-healing
/// transition back to `PrCreated` when the forge shows the PR reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Pending,
    InProgress,
    PrCreated,
    Resolved,
    NeedsHuman,
}

crate::simple_display! {
    IssueStatus {
        Pending => "pending",
        InProgress => "in_progress",
        PrCreated => "pr_created",
        Resolved => "resolved",
        NeedsHuman => "needs_human",
    }
}

impl IssueStatus {
    /// Parse the column value written by [`IssueStatus`]'s `Display` impl.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "pending" => Self::Pending,
            "in_progress" => Self::InProgress,
            "pr_created" => Self::PrCreated,
            "resolved" => Self::Resolved,
            "needs_human" => Self::NeedsHuman,
            _ => return None,
        })
    }
}

/// An issue tracked from the forge through to resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub issue_number: IssueNumber,
    pub title: String,
    pub status: IssueStatus,
    pub agent_id: Option<AgentId>,
    pub pr_number: Option<PrNumber>,
    pub attempts: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Issue {
    /// A freshly-discovered issue, not yet dispatched.
    pub fn new_pending(issue_number: IssueNumber, title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            issue_number,
            title: title.into(),
            status: IssueStatus::Pending,
            agent_id: None,
            pr_number: None,
            attempts: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
#[path = "issue_tests.rs"]
mod tests;
