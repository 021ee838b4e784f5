// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One dispatch decision against a pull request's review feedback.

use crate::id::AgentId;
use crate::worker::PrNumber;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single iteration of the PR-review loop: one decision to dispatch (or
/// not dispatch) a fix-review Worker against a PR's outstanding feedback.
///
/// `iteration` is 1-based and forms a contiguous, non-decreasing sequence
/// per `pr_number` (invariant 6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrReviewIteration {
    pub id: i64,
    pub pr_number: PrNumber,
    pub iteration: i64,
    pub comments_count: i64,
    /// Opaque serialized snapshot of the review-thread (or raw comment) state.
    pub comments_json: String,
    pub agent_id: Option<AgentId>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
