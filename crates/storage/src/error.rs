// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("database schema is corrupt: {0}")]
    Corrupt(String),

    #[error("failed to create parent directory for database file: {0}")]
    Io(#[from] std::io::Error),
}
