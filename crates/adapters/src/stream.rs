// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Decodes the assistant's line-delimited stdout into [`StreamEvent`]s, and
//! the PR-number / session-id / rate-limit extraction helpers.
//!
//! Ported in meaning from `original_source/orchestrator/stream_parser.py`'s
//! `parse_stream_line`/`extract_pr_number`/`extract_session_id`, and the
//! rate-limit pattern list from `agent_pool.py`'s `_RATE_LIMIT_PATTERNS`
//! (referenced, not retrieved verbatim, by `rate_limit_watcher.py`).

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use swarm_core::{StreamEvent, StreamEventKind};
use tracing::debug;

/// Case-insensitive substrings that indicate the assistant hit a rate or
/// usage limit.
pub const RATE_LIMIT_PATTERNS: &[&str] = &[
    "rate limit",
    "usage limit",
    "too many requests",
    "429",
    "token limit exceeded",
    "exceeded your",
    "capacity",
    "overloaded",
    "try again later",
    "rate_limit",
    "throttl",
];

pub fn is_rate_limit_message(text: &str) -> bool {
    let lower = text.to_lowercase();
    RATE_LIMIT_PATTERNS.iter().any(|pattern| lower.contains(pattern))
}

/// Decode one line of `claude -p --output-format stream-json` stdout.
/// A line that fails structural parsing yields no event (logged at debug).
pub fn parse_stream_line(line: &str) -> Option<StreamEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let data: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, line = &line[..line.len().min(200)], "non-JSON line from stream");
            return None;
        }
    };

    let msg_type = data.get("type").and_then(Value::as_str).unwrap_or("unknown");

    let (kind, summary) = match msg_type {
        "assistant" => (StreamEventKind::Assistant, summarize_assistant(&data)),
        "tool_use" => (StreamEventKind::ToolUse, summarize_tool_use(&data)),
        "tool_result" => (StreamEventKind::ToolResult, "(tool result)".to_string()),
        "result" => (StreamEventKind::Result, summarize_result(&data)),
        "error" => (StreamEventKind::Error, summarize_error(&data)),
        other => (StreamEventKind::Other(other.to_string()), truncate(&data.to_string(), 200)),
    };

    Some(StreamEvent { kind, summary, raw: data })
}

fn summarize_assistant(data: &Value) -> String {
    let blocks = data.pointer("/message/content").and_then(Value::as_array);
    let mut parts = Vec::new();
    if let Some(blocks) = blocks {
        for block in blocks {
            if let Some(block_type) = block.get("type").and_then(Value::as_str) {
                match block_type {
                    "text" => {
                        if let Some(text) = block.get("text").and_then(Value::as_str) {
                            parts.push(text.to_string());
                        }
                    }
                    "tool_use" => parts.push(tool_use_marker(
                        block.get("name").and_then(Value::as_str).unwrap_or("tool"),
                        block.get("input").unwrap_or(&Value::Null),
                    )),
                    "thinking" => {
                        let thinking = block.get("thinking").and_then(Value::as_str).unwrap_or("");
                        if !thinking.is_empty() {
                            parts.push(format!("(thinking) {thinking}"));
                        } else if parts.is_empty() {
                            parts.push("(thinking...)".to_string());
                        }
                    }
                    _ => {}
                }
            } else if let Some(s) = block.as_str() {
                parts.push(s.to_string());
            }
        }
    }
    let joined = parts.join(" ");
    if joined.is_empty() {
        "(thinking...)".to_string()
    } else {
        joined
    }
}

fn tool_use_marker(tool_name: &str, input: &Value) -> String {
    match tool_name {
        "Bash" => format!("[$ {}]", truncate(input.get("command").and_then(Value::as_str).unwrap_or(""), 80)),
        "Read" => format!("[Read {}]", input.get("file_path").and_then(Value::as_str).unwrap_or("?")),
        "Edit" | "Write" => format!("[{tool_name} {}]", input.get("file_path").and_then(Value::as_str).unwrap_or("?")),
        "Skill" => format!("[Skill: {}]", input.get("skill").and_then(Value::as_str).unwrap_or("?")),
        _ => format!("[{tool_name}]"),
    }
}

fn summarize_tool_use(data: &Value) -> String {
    let tool_name = data
        .get("tool")
        .or_else(|| data.get("name"))
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let input = data.get("input").cloned().unwrap_or(Value::Null);
    match tool_name {
        "Bash" => format!("Bash: {}", truncate(input.get("command").and_then(Value::as_str).unwrap_or(""), 100)),
        "Read" => format!("Read: {}", input.get("file_path").and_then(Value::as_str).unwrap_or("?")),
        "Edit" | "Write" => format!("{tool_name}: {}", input.get("file_path").and_then(Value::as_str).unwrap_or("?")),
        _ => format!("{tool_name}: {}", truncate(&input.to_string(), 100)),
    }
}

fn summarize_result(data: &Value) -> String {
    let result = data.get("result").cloned().unwrap_or(Value::Null);
    let text = match &result {
        Value::String(s) => truncate(s, 200),
        Value::Null => String::new(),
        other => truncate(&other.to_string(), 200),
    };
    if text.is_empty() {
        "Agent finished".to_string()
    } else {
        text
    }
}

fn summarize_error(data: &Value) -> String {
    let error = data.get("error").cloned().unwrap_or(Value::Null);
    let text = match &error {
        Value::Object(_) => error.get("message").and_then(Value::as_str).map(str::to_string).unwrap_or_else(|| error.to_string()),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    truncate(&text, 200)
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static PR_NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:pull/|pr #|pull request #?)(\d+)").expect("constant regex pattern is valid"));

/// Scan events newest-first; return the last (i.e. most recently emitted,
/// scanned first here since we iterate in reverse) regex match over each
/// event's serialized raw record.
pub fn extract_pr_number(events: &[StreamEvent]) -> Option<i64> {
    for event in events.iter().rev() {
        let raw_str = event.raw.to_string();
        if let Some(captures) = PR_NUMBER_PATTERN.captures_iter(&raw_str).last() {
            if let Ok(n) = captures[1].parse::<i64>() {
                return Some(n);
            }
        }
    }
    None
}

/// Scan events and any nested `message`/`result`/`metadata` sub-records for
/// a `session_id` or `sessionId` field; return the first found.
pub fn extract_session_id(events: &[StreamEvent]) -> Option<String> {
    for event in events {
        if let Some(sid) = session_id_from(&event.raw) {
            return Some(sid);
        }
        for key in ["message", "result", "metadata"] {
            if let Some(nested) = event.raw.get(key) {
                if let Some(sid) = session_id_from(nested) {
                    return Some(sid);
                }
            }
        }
    }
    None
}

fn session_id_from(value: &Value) -> Option<String> {
    value
        .get("session_id")
        .or_else(|| value.get("sessionId"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

pub fn count_turns(events: &[StreamEvent]) -> i64 {
    events.iter().filter(|e| matches!(e.kind, StreamEventKind::Assistant)).count() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_detection_is_case_insensitive() {
        assert!(is_rate_limit_message("Error: 429 Too Many Requests"));
        assert!(is_rate_limit_message("You have been RATE LIMITED"));
        assert!(!is_rate_limit_message("compile error: unexpected token"));
    }

    #[test]
    fn parses_assistant_bash_tool_use() {
        let line = r#"{"type":"assistant","message":{"content":[{"type":"tool_use","name":"Bash","input":{"command":"ls -la"}}]}}"#;
        let event = parse_stream_line(line).unwrap();
        assert!(matches!(event.kind, StreamEventKind::Assistant));
        assert_eq!(event.summary, "[$ ls -la]");
    }

    #[test]
    fn unparseable_line_yields_no_event() {
        assert!(parse_stream_line("not json at all").is_none());
        assert!(parse_stream_line("").is_none());
    }

    #[test]
    fn extract_pr_number_finds_last_match_newest_first() {
        let events = vec![
            parse_stream_line(r#"{"type":"tool_result","output":"nothing here"}"#).unwrap(),
            parse_stream_line(r#"{"type":"result","result":"Created https://github.com/o/r/pull/77"}"#).unwrap(),
        ];
        assert_eq!(extract_pr_number(&events), Some(77));
    }

    #[test]
    fn extract_session_id_checks_nested_records() {
        let events = vec![parse_stream_line(r#"{"type":"system","metadata":{"session_id":"abc-123"}}"#).unwrap()];
        assert_eq!(extract_session_id(&events).as_deref(), Some("abc-123"));
    }
}
