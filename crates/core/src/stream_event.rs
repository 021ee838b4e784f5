// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed events decoded from the assistant's line-delimited stdout.
//!
//! One `StreamEvent` per non-empty JSON line. Unrecognised `type` fields are
//! preserved verbatim via [`StreamEventKind::Other`] rather than dropped, so
//! a forward-compatible assistant release never silently loses output.

use serde::{Deserialize, Serialize};

/// The `type` discriminant of a decoded stream-json record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamEventKind {
    /// One model turn: text, thinking, and/or tool-invocation blocks.
    Assistant,
    /// A tool invocation emitted as its own top-level record.
    ToolUse,
    /// A tool response.
    ToolResult,
    /// The terminal record of the session.
    Result,
    /// A service-side error.
    Error,
    /// `system` records, and any other `type` value not listed above.
    Other(String),
}

crate::simple_display! {
    StreamEventKind {
        Assistant => "assistant",
        ToolUse => "tool_use",
        ToolResult => "tool_result",
        Result => "result",
        Error => "error",
        Other(..) => "other",
    }
}

/// A single decoded line of the assistant's stdout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    pub kind: StreamEventKind,
    /// Compact human-readable summary for the dashboard event tail.
    pub summary: String,
    /// Full parsed JSON record, kept for PR-number/session-id extraction
    /// and for persisting as `WorkerEvent::event_data`.
    pub raw: serde_json::Value,
}

impl StreamEvent {
    pub fn event_type_str(&self) -> String {
        match &self.kind {
            StreamEventKind::Assistant => "assistant".to_string(),
            StreamEventKind::ToolUse => "tool_use".to_string(),
            StreamEventKind::ToolResult => "tool_result".to_string(),
            StreamEventKind::Result => "result".to_string(),
            StreamEventKind::Error => "error".to_string(),
            StreamEventKind::Other(tag) => tag.clone(),
        }
    }
}

#[cfg(test)]
#[path = "stream_event_tests.rs"]
mod tests;
