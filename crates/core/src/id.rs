// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent identifier.
//!
//! `AgentId` is distinct from the assistant's own session id (opaque,
//! captured from the stream and used only for `--resume`) and from the
//! workspace path. It is the primary key callers use to address a Worker
//! across the Store, the in-memory pool map, and the dashboard.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Unique identifier for a worker (assistant subprocess) instance.
///
/// Generated as `agent-issue-{n}-{unix_ts}` for implement workers and
/// `agent-pr-fix-{n}-{unix_ts}` for fix-review workers; opaque to consumers
/// beyond that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    /// Create an AgentId from any string-like value (e.g. read back from storage).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// `agent-issue-{n}-{unix_ts}`, the implement-worker id shape.
    pub fn for_issue(issue_number: i64, unix_ts: i64) -> Self {
        Self(format!("agent-issue-{issue_number}-{unix_ts}"))
    }

    /// `agent-pr-fix-{n}-{unix_ts}`, the fix-review-worker id shape.
    pub fn for_pr_fix(pr_number: i64, unix_ts: i64) -> Self {
        Self(format!("agent-pr-fix-{pr_number}-{unix_ts}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for AgentId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for AgentId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Borrow<str> for AgentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
