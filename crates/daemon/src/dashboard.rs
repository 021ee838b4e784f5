// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only HTTP dashboard: five JSON endpoints plus an index page and
//! static assets, all served straight off the Store's query API. Out of
//! core per spec.md §1 but a required external interface per spec.md §6.
//!
//! A structural port of `original_source/orchestrator/dashboard.py`'s
//! FastAPI routes to `axum`.

use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use swarm_core::PrNumber;
use swarm_storage::Store;
use tower_http::services::ServeDir;

const INDEX_HTML: &str = include_str!("../static/index.html");

#[derive(Clone)]
struct DashboardState {
    store: Arc<Store>,
}

pub fn router(store: Arc<Store>, static_dir: impl Into<std::path::PathBuf>) -> Router {
    let state = DashboardState { store };
    Router::new()
        .route("/", get(index))
        .route("/api/agents", get(list_agents))
        .route("/api/agents/{agent_id}/logs", get(agent_logs))
        .route("/api/issues", get(list_issues))
        .route("/api/prs", get(list_prs))
        .route("/api/metrics", get(metrics))
        .nest_service("/static", ServeDir::new(static_dir.into()))
        .with_state(state)
}

async fn index() -> impl IntoResponse {
    Html(INDEX_HTML)
}

#[derive(Serialize)]
struct AgentsResponse {
    agents: Vec<swarm_core::Worker>,
}

async fn list_agents(State(state): State<DashboardState>) -> impl IntoResponse {
    match state.store.list_all_workers() {
        Ok(agents) => Json(AgentsResponse { agents }).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
struct LogsQuery {
    #[serde(default)]
    since: i64,
}

#[derive(Serialize)]
struct LogsResponse {
    events: Vec<swarm_core::WorkerEvent>,
}

async fn agent_logs(State(state): State<DashboardState>, Path(agent_id): Path<String>, Query(query): Query<LogsQuery>) -> impl IntoResponse {
    let agent_id = swarm_core::AgentId::new(agent_id);
    match state.store.worker_events_since(&agent_id, query.since, 200) {
        Ok(events) => Json(LogsResponse { events }).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Serialize)]
struct IssuesResponse {
    issues: Vec<swarm_core::Issue>,
}

async fn list_issues(State(state): State<DashboardState>) -> impl IntoResponse {
    match state.store.list_all_issues() {
        Ok(issues) => Json(IssuesResponse { issues }).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Serialize)]
struct PrSummary {
    pr_number: PrNumber,
    iterations: i64,
    latest_status: String,
    total_comments: i64,
}

#[derive(Serialize)]
struct PrsResponse {
    prs: Vec<PrSummary>,
}

async fn list_prs(State(state): State<DashboardState>) -> impl IntoResponse {
    let reviews = match state.store.list_all_pr_reviews() {
        Ok(r) => r,
        Err(e) => return error_response(e),
    };

    let mut by_pr: HashMap<PrNumber, PrSummary> = HashMap::new();
    for review in reviews {
        let entry = by_pr.entry(review.pr_number).or_insert_with(|| PrSummary {
            pr_number: review.pr_number,
            iterations: 0,
            latest_status: review.status.clone(),
            total_comments: 0,
        });
        entry.iterations = entry.iterations.max(review.iteration);
        entry.latest_status = review.status;
        entry.total_comments += review.comments_count;
    }

    let mut prs: Vec<PrSummary> = by_pr.into_values().collect();
    prs.sort_by_key(|p| p.pr_number);
    Json(PrsResponse { prs }).into_response()
}

async fn metrics(State(state): State<DashboardState>) -> impl IntoResponse {
    match state.store.metrics() {
        Ok(m) => Json(m).into_response(),
        Err(e) => error_response(e),
    }
}

fn error_response(err: swarm_storage::StoreError) -> axum::response::Response {
    tracing::error!(error = %err, "dashboard query failed");
    (axum::http::StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
}
