// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn event_type_str_returns_the_raw_tag_for_other() {
    let event = StreamEvent {
        kind: StreamEventKind::Other("system".to_string()),
        summary: String::new(),
        raw: serde_json::json!({"type": "system"}),
    };
    assert_eq!(event.event_type_str(), "system");
}

#[test]
fn event_type_str_matches_known_variants() {
    let cases = [
        (StreamEventKind::Assistant, "assistant"),
        (StreamEventKind::ToolUse, "tool_use"),
        (StreamEventKind::ToolResult, "tool_result"),
        (StreamEventKind::Result, "result"),
        (StreamEventKind::Error, "error"),
    ];
    for (kind, expected) in cases {
        let event = StreamEvent { kind, summary: String::new(), raw: serde_json::Value::Null };
        assert_eq!(event.event_type_str(), expected);
    }
}

#[test]
fn display_is_always_the_literal_other_regardless_of_tag() {
    assert_eq!(StreamEventKind::Other("anything".to_string()).to_string(), "other");
}
