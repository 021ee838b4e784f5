// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn for_issue_produces_expected_shape() {
    let id = AgentId::for_issue(42, 1_700_000_000);
    assert_eq!(id.as_str(), "agent-issue-42-1700000000");
}

#[test]
fn for_pr_fix_produces_expected_shape() {
    let id = AgentId::for_pr_fix(7, 1_700_000_000);
    assert_eq!(id.as_str(), "agent-pr-fix-7-1700000000");
}

#[test]
fn equality_compares_against_str_and_string() {
    let id = AgentId::new("agent-issue-1-1");
    assert_eq!(id, "agent-issue-1-1");
    assert_eq!(id, *&"agent-issue-1-1");
}

#[test]
fn borrow_as_str_matches_inner_value() {
    use std::borrow::Borrow;
    let id = AgentId::new("agent-issue-1-1");
    let borrowed: &str = id.borrow();
    assert_eq!(borrowed, "agent-issue-1-1");
}

#[test]
fn display_matches_as_str() {
    let id = AgentId::new("agent-issue-1-1");
    assert_eq!(id.to_string(), id.as_str());
}
