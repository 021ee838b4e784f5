// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! swarm-adapters: the Forge Gateway, Workspace Manager, Stream Decoder,
//! and prompt builders — everything that shells out to the forge/source-
//! control CLIs or talks to the assistant subprocess's stdio contract.

pub mod error;
pub mod forge;
pub mod prompts;
pub mod stream;
pub mod workspace;

pub use error::ForgeError;
pub use forge::{ForgeGateway, ForgeIssue, InlineComment, IssueComment, PrCheck, PrListItem, ReviewComment, ReviewThread, ReviewThreadsResult};
pub use prompts::PromptBuilder;
pub use stream::{count_turns, extract_pr_number, extract_session_id, is_rate_limit_message, parse_stream_line, RATE_LIMIT_PATTERNS};
pub use workspace::{ActiveWorktree, WorkspaceManager};
