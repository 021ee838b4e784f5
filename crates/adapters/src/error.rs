// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Transient-by-design: every Forge Gateway call either returns a parsed
/// value or one of these; callers swallow at the call site and retry next
/// poll cycle.
#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} timed out after {timeout_secs}s")]
    Timeout { program: &'static str, timeout_secs: u64 },
    #[error("{program} exited with status {status}: {stderr}")]
    NonZeroExit {
        program: &'static str,
        status: i32,
        stderr: String,
    },
}
