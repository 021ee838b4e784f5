// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Store: CRUD plus the small set of queries the Control Plane and
//! dashboard need, backed by a single mutex-guarded SQLite connection.
//!
//! A full connection-per-call pool is unnecessary complexity for one
//! supervisor process; WAL mode lets readers proceed independently of an
//! in-flight writer, and no caller holds this mutex across subprocess I/O
//! (see `DESIGN.md`, Open Question Decisions).

use crate::error::StoreError;
use crate::schema;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;
use swarm_core::{
    AgentId, AgentType, Issue, IssueNumber, IssueStatus, PrNumber, PrReviewIteration, Worker,
    WorkerEvent, WorkerStatus,
};
use tracing::{debug, info};

pub struct Store {
    conn: Mutex<Connection>,
}

/// Aggregate counts used by `GET /api/metrics`.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Metrics {
    pub issues_by_status: Vec<(String, i64)>,
    pub workers_by_status: Vec<(String, i64)>,
    pub avg_turns_used_completed: Option<f64>,
}

fn to_rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

fn from_rfc3339(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp {s:?}: {e}")))
}

impl Store {
    /// Opens (creating if absent) the database at `path`, enables WAL mode
    /// and foreign-key enforcement, and runs schema creation/migration.
    /// Failure here is fatal at startup.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::init(&conn)?;
        info!(db_path = %path.display(), "store opened");
        Ok(Self { conn: Mutex::new(conn) })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::init(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    // ---- Issue ----------------------------------------------------------

    pub fn insert_issue(&self, issue: &Issue) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "INSERT INTO issues (issue_number, title, status, agent_id, pr_number, attempts, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                issue.issue_number.0,
                issue.title,
                issue.status.to_string(),
                issue.agent_id.as_ref().map(AgentId::as_str),
                issue.pr_number.map(|p| p.0),
                issue.attempts,
                to_rfc3339(issue.created_at),
                to_rfc3339(issue.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_issue(&self, issue_number: IssueNumber) -> Result<Option<Issue>, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.query_row(
            "SELECT issue_number, title, status, agent_id, pr_number, attempts, created_at, updated_at
             FROM issues WHERE issue_number = ?1",
            params![issue_number.0],
            row_to_issue,
        )
        .optional()
        .map_err(StoreError::from)?
        .transpose()
    }

    pub fn list_issues_by_status(&self, status: IssueStatus) -> Result<Vec<Issue>, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = conn.prepare(
            "SELECT issue_number, title, status, agent_id, pr_number, attempts, created_at, updated_at
             FROM issues WHERE status = ?1 ORDER BY issue_number",
        )?;
        let rows = stmt.query_map(params![status.to_string()], row_to_issue)?;
        rows.collect::<Result<Vec<_>, _>>()?.into_iter().collect()
    }

    pub fn list_all_issues(&self) -> Result<Vec<Issue>, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = conn.prepare(
            "SELECT issue_number, title, status, agent_id, pr_number, attempts, created_at, updated_at
             FROM issues ORDER BY issue_number",
        )?;
        let rows = stmt.query_map([], row_to_issue)?;
        rows.collect::<Result<Vec<_>, _>>()?.into_iter().collect()
    }

    /// Update status (and, where provided, `agent_id`/`pr_number`), bumping `updated_at`.
    #[allow(clippy::too_many_arguments)]
    pub fn update_issue(
        &self,
        issue_number: IssueNumber,
        status: IssueStatus,
        agent_id: Option<Option<&AgentId>>,
        pr_number: Option<Option<PrNumber>>,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "UPDATE issues SET status = ?1, updated_at = ?2 WHERE issue_number = ?3",
            params![status.to_string(), to_rfc3339(now), issue_number.0],
        )?;
        if let Some(agent_id) = agent_id {
            conn.execute(
                "UPDATE issues SET agent_id = ?1 WHERE issue_number = ?2",
                params![agent_id.map(AgentId::as_str), issue_number.0],
            )?;
        }
        if let Some(pr_number) = pr_number {
            conn.execute(
                "UPDATE issues SET pr_number = ?1 WHERE issue_number = ?2",
                params![pr_number.map(|p| p.0), issue_number.0],
            )?;
        }
        Ok(())
    }

    pub fn increment_issue_attempts(&self, issue_number: IssueNumber, now: DateTime<Utc>) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "UPDATE issues SET attempts = attempts + 1, updated_at = ?1 WHERE issue_number = ?2",
            params![to_rfc3339(now), issue_number.0],
        )?;
        Ok(())
    }

    // ---- Worker ----------------------------------------------------------

    pub fn insert_worker(&self, worker: &Worker) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "INSERT INTO agents (agent_id, issue_number, pr_number, agent_type, status, worktree_path,
                branch_name, pid, session_id, turns_used, resume_count, rate_limited_at, started_at,
                finished_at, error_message)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15)",
            params![
                worker.agent_id.as_str(),
                worker.issue_number.0,
                worker.pr_number.map(|p| p.0),
                worker.agent_type.to_string(),
                worker.status.to_string(),
                worker.worktree_path,
                worker.branch_name,
                worker.pid,
                worker.session_id,
                worker.turns_used,
                worker.resume_count,
                worker.rate_limited_at.map(to_rfc3339),
                to_rfc3339(worker.started_at),
                worker.finished_at.map(to_rfc3339),
                worker.error_message,
            ],
        )?;
        Ok(())
    }

    pub fn get_worker(&self, agent_id: &AgentId) -> Result<Option<Worker>, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.query_row(WORKER_SELECT, params![agent_id.as_str()], row_to_worker)
            .optional()
            .map_err(StoreError::from)?
            .transpose()
    }

    pub fn list_running_workers(&self) -> Result<Vec<Worker>, StoreError> {
        self.list_workers_by_status(WorkerStatus::Running)
    }

    pub fn list_rate_limited_workers(&self) -> Result<Vec<Worker>, StoreError> {
        let mut workers = self.list_workers_by_status(WorkerStatus::RateLimited)?;
        workers.sort_by_key(|w| w.rate_limited_at);
        Ok(workers)
    }

    fn list_workers_by_status(&self, status: WorkerStatus) -> Result<Vec<Worker>, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let sql = format!("{WORKER_SELECT_BASE} WHERE status = ?1 ORDER BY started_at");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![status.to_string()], row_to_worker)?;
        rows.collect::<Result<Vec<_>, _>>()?.into_iter().collect()
    }

    pub fn list_workers_for_pr(&self, pr_number: PrNumber) -> Result<Vec<Worker>, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let sql = format!("{WORKER_SELECT_BASE} WHERE pr_number = ?1 ORDER BY started_at");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![pr_number.0], row_to_worker)?;
        rows.collect::<Result<Vec<_>, _>>()?.into_iter().collect()
    }

    pub fn list_all_workers(&self) -> Result<Vec<Worker>, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let sql = format!("{WORKER_SELECT_BASE} ORDER BY started_at DESC");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_worker)?;
        rows.collect::<Result<Vec<_>, _>>()?.into_iter().collect()
    }

    /// Overwrites the full mutable worker row. Used by `finish_worker` call
    /// sites in the pool/control-plane that already hold the full record.
    pub fn update_worker(&self, worker: &Worker) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "UPDATE agents SET pr_number=?1, status=?2, pid=?3, session_id=?4, turns_used=?5,
                resume_count=?6, rate_limited_at=?7, finished_at=?8, error_message=?9
             WHERE agent_id = ?10",
            params![
                worker.pr_number.map(|p| p.0),
                worker.status.to_string(),
                worker.pid,
                worker.session_id,
                worker.turns_used,
                worker.resume_count,
                worker.rate_limited_at.map(to_rfc3339),
                worker.finished_at.map(to_rfc3339),
                worker.error_message,
                worker.agent_id.as_str(),
            ],
        )?;
        debug!(agent_id = %worker.agent_id, status = %worker.status, "worker row updated");
        Ok(())
    }

    // ---- WorkerEvent -------------------------------------------------------

    pub fn insert_worker_event(
        &self,
        agent_id: &AgentId,
        event_type: &str,
        event_data: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "INSERT INTO agent_events (agent_id, event_type, event_data, timestamp) VALUES (?1,?2,?3,?4)",
            params![agent_id.as_str(), event_type, event_data, to_rfc3339(timestamp)],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Events for `agent_id` with `id > since`, oldest first, capped at `limit`.
    pub fn worker_events_since(
        &self,
        agent_id: &AgentId,
        since: i64,
        limit: i64,
    ) -> Result<Vec<WorkerEvent>, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = conn.prepare(
            "SELECT id, agent_id, event_type, event_data, timestamp FROM agent_events
             WHERE agent_id = ?1 AND id > ?2 ORDER BY id LIMIT ?3",
        )?;
        let rows = stmt.query_map(params![agent_id.as_str(), since, limit], |row| {
            Ok(WorkerEventRow {
                id: row.get(0)?,
                agent_id: row.get(1)?,
                event_type: row.get(2)?,
                event_data: row.get(3)?,
                timestamp: row.get(4)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?.into_worker_event()?);
        }
        Ok(out)
    }

    pub fn count_assistant_events(&self, agent_id: &AgentId) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.query_row(
            "SELECT COUNT(*) FROM agent_events WHERE agent_id = ?1 AND event_type = 'assistant'",
            params![agent_id.as_str()],
            |row| row.get(0),
        )
        .map_err(StoreError::from)
    }

    // ---- PrReviewIteration -------------------------------------------------

    pub fn insert_pr_review_iteration(
        &self,
        pr_number: PrNumber,
        iteration: i64,
        comments_count: i64,
        comments_json: &str,
        agent_id: Option<&AgentId>,
        status: &str,
        created_at: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "INSERT INTO pr_reviews (pr_number, iteration, comments_count, comments_json, agent_id, status, created_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7)",
            params![
                pr_number.0,
                iteration,
                comments_count,
                comments_json,
                agent_id.map(AgentId::as_str),
                status,
                to_rfc3339(created_at),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn latest_pr_review_iteration(
        &self,
        pr_number: PrNumber,
    ) -> Result<Option<PrReviewIteration>, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.query_row(
            "SELECT id, pr_number, iteration, comments_count, comments_json, agent_id, status, created_at
             FROM pr_reviews WHERE pr_number = ?1 ORDER BY iteration DESC LIMIT 1",
            params![pr_number.0],
            row_to_pr_review,
        )
        .optional()
        .map_err(StoreError::from)?
        .transpose()
    }

    /// Every PR-review iteration ever recorded, oldest first. Used by the
    /// dashboard's `/api/prs`, which groups rows by `pr_number` itself.
    pub fn list_all_pr_reviews(&self) -> Result<Vec<PrReviewIteration>, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = conn.prepare(
            "SELECT id, pr_number, iteration, comments_count, comments_json, agent_id, status, created_at
             FROM pr_reviews ORDER BY pr_number, iteration",
        )?;
        let rows = stmt.query_map([], row_to_pr_review)?;
        rows.collect::<Result<Vec<_>, _>>()?.into_iter().collect()
    }

    // ---- Metrics -----------------------------------------------------------

    pub fn metrics(&self) -> Result<Metrics, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut issues_by_status = Vec::new();
        {
            let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM issues GROUP BY status")?;
            let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
            for row in rows {
                issues_by_status.push(row?);
            }
        }
        let mut workers_by_status = Vec::new();
        {
            let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM agents GROUP BY status")?;
            let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
            for row in rows {
                workers_by_status.push(row?);
            }
        }
        let avg_turns_used_completed: Option<f64> = conn.query_row(
            "SELECT AVG(turns_used) FROM agents WHERE status = 'completed'",
            [],
            |row| row.get(0),
        )?;
        Ok(Metrics {
            issues_by_status,
            workers_by_status,
            avg_turns_used_completed,
        })
    }
}

const WORKER_SELECT_BASE: &str = "SELECT agent_id, issue_number, pr_number, agent_type, status, worktree_path,
    branch_name, pid, session_id, turns_used, resume_count, rate_limited_at, started_at, finished_at, error_message
    FROM agents";
const WORKER_SELECT: &str = "SELECT agent_id, issue_number, pr_number, agent_type, status, worktree_path,
    branch_name, pid, session_id, turns_used, resume_count, rate_limited_at, started_at, finished_at, error_message
    FROM agents WHERE agent_id = ?1";

fn row_to_issue(row: &Row<'_>) -> rusqlite::Result<Result<Issue, StoreError>> {
    let issue_number: i64 = row.get(0)?;
    let title: String = row.get(1)?;
    let status: String = row.get(2)?;
    let agent_id: Option<String> = row.get(3)?;
    let pr_number: Option<i64> = row.get(4)?;
    let attempts: i64 = row.get(5)?;
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;

    Ok((|| {
        Ok(Issue {
            issue_number: IssueNumber(issue_number),
            title,
            status: IssueStatus::parse(&status)
                .ok_or_else(|| StoreError::Corrupt(format!("unknown issue status {status:?}")))?,
            agent_id: agent_id.map(AgentId::new),
            pr_number: pr_number.map(PrNumber),
            attempts,
            created_at: from_rfc3339(&created_at)?,
            updated_at: from_rfc3339(&updated_at)?,
        })
    })())
}

fn row_to_worker(row: &Row<'_>) -> rusqlite::Result<Result<Worker, StoreError>> {
    let agent_id: String = row.get(0)?;
    let issue_number: i64 = row.get(1)?;
    let pr_number: Option<i64> = row.get(2)?;
    let agent_type: String = row.get(3)?;
    let status: String = row.get(4)?;
    let worktree_path: Option<String> = row.get(5)?;
    let branch_name: Option<String> = row.get(6)?;
    let pid: Option<i32> = row.get(7)?;
    let session_id: Option<String> = row.get(8)?;
    let turns_used: i64 = row.get(9)?;
    let resume_count: i64 = row.get(10)?;
    let rate_limited_at: Option<String> = row.get(11)?;
    let started_at: String = row.get(12)?;
    let finished_at: Option<String> = row.get(13)?;
    let error_message: Option<String> = row.get(14)?;

    Ok((|| {
        Ok(Worker {
            agent_id: AgentId::new(agent_id),
            issue_number: IssueNumber(issue_number),
            pr_number: pr_number.map(PrNumber),
            agent_type: AgentType::parse(&agent_type)
                .ok_or_else(|| StoreError::Corrupt(format!("unknown agent_type {agent_type:?}")))?,
            status: WorkerStatus::parse(&status)
                .ok_or_else(|| StoreError::Corrupt(format!("unknown worker status {status:?}")))?,
            worktree_path: worktree_path.unwrap_or_default(),
            branch_name: branch_name.unwrap_or_default(),
            pid,
            session_id,
            turns_used,
            resume_count,
            rate_limited_at: rate_limited_at.map(|s| from_rfc3339(&s)).transpose()?,
            started_at: from_rfc3339(&started_at)?,
            finished_at: finished_at.map(|s| from_rfc3339(&s)).transpose()?,
            error_message,
        })
    })())
}

fn row_to_pr_review(row: &Row<'_>) -> rusqlite::Result<Result<PrReviewIteration, StoreError>> {
    let id: i64 = row.get(0)?;
    let pr_number: i64 = row.get(1)?;
    let iteration: i64 = row.get(2)?;
    let comments_count: Option<i64> = row.get(3)?;
    let comments_json: Option<String> = row.get(4)?;
    let agent_id: Option<String> = row.get(5)?;
    let status: String = row.get(6)?;
    let created_at: String = row.get(7)?;

    Ok((|| {
        Ok(PrReviewIteration {
            id,
            pr_number: PrNumber(pr_number),
            iteration,
            comments_count: comments_count.unwrap_or(0),
            comments_json: comments_json.unwrap_or_default(),
            agent_id: agent_id.map(AgentId::new),
            status,
            created_at: from_rfc3339(&created_at)?,
        })
    })())
}

struct WorkerEventRow {
    id: i64,
    agent_id: String,
    event_type: Option<String>,
    event_data: Option<String>,
    timestamp: String,
}

impl WorkerEventRow {
    fn into_worker_event(self) -> Result<WorkerEvent, StoreError> {
        Ok(WorkerEvent {
            id: self.id,
            agent_id: AgentId::new(self.agent_id),
            event_type: self.event_type.unwrap_or_default(),
            event_data: self.event_data.unwrap_or_default(),
            timestamp: from_rfc3339(&self.timestamp)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use swarm_core::AgentType;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).single().unwrap()
    }

    #[test]
    fn issue_round_trips() {
        let store = Store::open_in_memory().unwrap();
        let issue = Issue::new_pending(IssueNumber(42), "Fix the thing", now());
        store.insert_issue(&issue).unwrap();
        let back = store.get_issue(IssueNumber(42)).unwrap().unwrap();
        assert_eq!(back.title, "Fix the thing");
        assert_eq!(back.status, IssueStatus::Pending);
        assert_eq!(back.attempts, 0);
    }

    #[test]
    fn update_issue_transitions_status_and_sets_pr_number() {
        let store = Store::open_in_memory().unwrap();
        store.insert_issue(&Issue::new_pending(IssueNumber(1), "t", now())).unwrap();
        store
            .update_issue(IssueNumber(1), IssueStatus::PrCreated, None, Some(Some(PrNumber(77))), now())
            .unwrap();
        let back = store.get_issue(IssueNumber(1)).unwrap().unwrap();
        assert_eq!(back.status, IssueStatus::PrCreated);
        assert_eq!(back.pr_number, Some(PrNumber(77)));
    }

    #[test]
    fn worker_events_since_respects_cursor_and_limit() {
        let store = Store::open_in_memory().unwrap();
        store.insert_issue(&Issue::new_pending(IssueNumber(1), "t", now())).unwrap();
        let agent_id = AgentId::for_issue(1, 1_700_000_000);
        store
            .insert_worker(&Worker {
                agent_id: agent_id.clone(),
                issue_number: IssueNumber(1),
                pr_number: None,
                agent_type: AgentType::Implement,
                status: WorkerStatus::Running,
                worktree_path: "/tmp/issue-1".into(),
                branch_name: "fix/issue-1".into(),
                pid: Some(123),
                session_id: None,
                turns_used: 0,
                resume_count: 0,
                rate_limited_at: None,
                started_at: now(),
                finished_at: None,
                error_message: None,
            })
            .unwrap();

        for i in 0..5 {
            store
                .insert_worker_event(&agent_id, "assistant", &format!("turn {i}"), now())
                .unwrap();
        }

        let events = store.worker_events_since(&agent_id, 2, 2).unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[0].id > 2);
        assert!(events[0].id < events[1].id);

        let turns = store.count_assistant_events(&agent_id).unwrap();
        assert_eq!(turns, 5);
    }

    #[test]
    fn pr_review_iterations_increase_monotonically() {
        let store = Store::open_in_memory().unwrap();
        store
            .insert_pr_review_iteration(PrNumber(10), 1, 2, "[]", None, "dispatched", now())
            .unwrap();
        store
            .insert_pr_review_iteration(PrNumber(10), 2, 0, "[]", None, "resolved", now())
            .unwrap();
        let latest = store.latest_pr_review_iteration(PrNumber(10)).unwrap().unwrap();
        assert_eq!(latest.iteration, 2);
    }

    #[test]
    fn list_all_pr_reviews_orders_by_pr_then_iteration() {
        let store = Store::open_in_memory().unwrap();
        store.insert_pr_review_iteration(PrNumber(20), 1, 1, "[]", None, "dispatched", now()).unwrap();
        store.insert_pr_review_iteration(PrNumber(10), 1, 2, "[]", None, "dispatched", now()).unwrap();
        store.insert_pr_review_iteration(PrNumber(10), 2, 0, "[]", None, "resolved", now()).unwrap();

        let rows = store.list_all_pr_reviews().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].pr_number, PrNumber(10));
        assert_eq!(rows[0].iteration, 1);
        assert_eq!(rows[1].pr_number, PrNumber(10));
        assert_eq!(rows[1].iteration, 2);
        assert_eq!(rows[2].pr_number, PrNumber(20));
    }
}
