// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

fn arb_issue_status() -> impl Strategy<Value = IssueStatus> {
    prop_oneof![
        Just(IssueStatus::Pending),
        Just(IssueStatus::InProgress),
        Just(IssueStatus::PrCreated),
        Just(IssueStatus::Resolved),
        Just(IssueStatus::NeedsHuman),
    ]
}

#[test]
fn issue_number_display_matches_inner_value() {
    assert_eq!(IssueNumber(123).to_string(), "123");
}

#[test]
fn issue_status_parse_rejects_unknown_strings() {
    assert!(IssueStatus::parse("bogus").is_none());
}

#[test]
fn new_pending_starts_with_zero_attempts_and_no_worker_or_pr() {
    let now = Utc::now();
    let issue = Issue::new_pending(IssueNumber(1), "fix the bug", now);
    assert_eq!(issue.status, IssueStatus::Pending);
    assert_eq!(issue.attempts, 0);
    assert!(issue.agent_id.is_none());
    assert!(issue.pr_number.is_none());
    assert_eq!(issue.created_at, now);
    assert_eq!(issue.updated_at, now);
}

proptest! {
    #[test]
    fn issue_status_display_parse_roundtrip(status in arb_issue_status()) {
        let parsed = IssueStatus::parse(&status.to_string());
        prop_assert_eq!(parsed, Some(status));
    }

    #[test]
    fn issue_number_roundtrips_through_i64(n: i64) {
        let issue_number: IssueNumber = n.into();
        prop_assert_eq!(issue_number.0, n);
    }
}
