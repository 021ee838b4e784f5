// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

fn arb_agent_type() -> impl Strategy<Value = AgentType> {
    prop_oneof![Just(AgentType::Implement), Just(AgentType::FixReview)]
}

fn arb_worker_status() -> impl Strategy<Value = WorkerStatus> {
    prop_oneof![
        Just(WorkerStatus::Running),
        Just(WorkerStatus::Completed),
        Just(WorkerStatus::Failed),
        Just(WorkerStatus::Timeout),
        Just(WorkerStatus::RateLimited),
        Just(WorkerStatus::Resumed),
    ]
}

#[test]
fn pr_number_display_matches_inner_value() {
    assert_eq!(PrNumber(42).to_string(), "42");
}

#[test]
fn pr_number_from_i64() {
    let n: PrNumber = 7i64.into();
    assert_eq!(n, PrNumber(7));
}

#[test]
fn worker_status_is_live_only_for_running_and_rate_limited() {
    assert!(WorkerStatus::Running.is_live());
    assert!(WorkerStatus::RateLimited.is_live());
    assert!(!WorkerStatus::Completed.is_live());
    assert!(!WorkerStatus::Failed.is_live());
    assert!(!WorkerStatus::Timeout.is_live());
    assert!(!WorkerStatus::Resumed.is_live());
}

#[test]
fn worker_status_parse_rejects_unknown_strings() {
    assert!(WorkerStatus::parse("bogus").is_none());
}

#[test]
fn agent_type_parse_rejects_unknown_strings() {
    assert!(AgentType::parse("bogus").is_none());
}

proptest! {
    #[test]
    fn agent_type_display_parse_roundtrip(agent_type in arb_agent_type()) {
        let parsed = AgentType::parse(&agent_type.to_string());
        prop_assert_eq!(parsed, Some(agent_type));
    }

    #[test]
    fn worker_status_display_parse_roundtrip(status in arb_worker_status()) {
        let parsed = WorkerStatus::parse(&status.to_string());
        prop_assert_eq!(parsed, Some(status));
    }

    #[test]
    fn pr_number_roundtrips_through_i64(n: i64) {
        let pr: PrNumber = n.into();
        prop_assert_eq!(pr.0, n);
        prop_assert_eq!(pr.to_string(), n.to_string());
    }
}
