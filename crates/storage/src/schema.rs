// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema creation and in-place column migration.
//!
//! Mirrors `original_source/orchestrator/db.py`'s `SCHEMA` script, with the
//! table names kept exactly (`issues`, `agents`, `agent_events`,
//! `pr_reviews`) since that's the on-disk contract older database files on
//! disk must remain readable across.

use crate::error::StoreError;
use rusqlite::Connection;

const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS issues (
    issue_number INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    agent_id TEXT,
    pr_number INTEGER,
    attempts INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS agents (
    agent_id TEXT PRIMARY KEY,
    issue_number INTEGER,
    pr_number INTEGER,
    agent_type TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'running',
    worktree_path TEXT,
    branch_name TEXT,
    turns_used INTEGER NOT NULL DEFAULT 0,
    started_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    finished_at TEXT,
    error_message TEXT,
    FOREIGN KEY (issue_number) REFERENCES issues(issue_number)
);

CREATE TABLE IF NOT EXISTS agent_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    agent_id TEXT NOT NULL,
    event_type TEXT,
    event_data TEXT,
    timestamp TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (agent_id) REFERENCES agents(agent_id)
);

CREATE TABLE IF NOT EXISTS pr_reviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    pr_number INTEGER NOT NULL,
    iteration INTEGER NOT NULL,
    comments_count INTEGER,
    agent_id TEXT,
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (agent_id) REFERENCES agents(agent_id)
);
";

/// Columns added after the original schema shipped. Each tuple is
/// `(table, column, sqlite type)`; missing ones are added with `ALTER TABLE`.
const MISSING_COLUMNS: &[(&str, &str, &str)] = &[
    ("agents", "pid", "INTEGER"),
    ("agents", "session_id", "TEXT"),
    ("agents", "resume_count", "INTEGER NOT NULL DEFAULT 0"),
    ("agents", "rate_limited_at", "TEXT"),
    ("pr_reviews", "comments_json", "TEXT"),
];

pub fn init(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(CREATE_TABLES)?;
    for (table, column, ty) in MISSING_COLUMNS {
        if !has_column(conn, table, column)? {
            conn.execute(&format!("ALTER TABLE {table} ADD COLUMN {column} {ty}"), [])?;
        }
    }
    Ok(())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool, StoreError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get("name")?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent_and_adds_missing_columns() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(CREATE_TABLES).unwrap();
        assert!(!has_column(&conn, "agents", "pid").unwrap());

        init(&conn).unwrap();
        assert!(has_column(&conn, "agents", "pid").unwrap());
        assert!(has_column(&conn, "agents", "session_id").unwrap());
        assert!(has_column(&conn, "pr_reviews", "comments_json").unwrap());

        // running init again must not error on already-present columns.
        init(&conn).unwrap();
    }
}
