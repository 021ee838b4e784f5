// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `swarmd`: process entry point. Loads configuration, validates the
//! environment, opens the Store, runs startup recovery, wires the Forge
//! Gateway / Workspace Manager / Worker Pool / Control Plane together, and
//! serves the dashboard — all until a shutdown signal is received.
//!
//! Grounded in `original_source/orchestrator/main.py`'s `main()`.

mod dashboard;
mod startup;

use std::path::PathBuf;
use std::sync::Arc;
use swarm_adapters::{ForgeGateway, PromptBuilder, WorkspaceManager};
use swarm_core::Config;
use swarm_engine::{ControlPlane, Dispatcher, PoolConfig, PollerConfig, WorkerPool};
use swarm_storage::Store;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            // Logging isn't wired up yet at this point, so this error goes
            // straight to stderr the way a fatal config failure should.
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    let _log_guard = init_logging(&config.worktree_dir);

    info!(
        github_repo = %config.github_repo,
        base_branch = %config.base_branch,
        max_concurrent_agents = config.max_concurrent_agents,
        dashboard_port = config.dashboard_port,
        "swarm orchestrator starting"
    );

    if let Err(e) = config.validate() {
        error!(error = %e, "environment validation failed");
        std::process::exit(1);
    }
    info!("environment validation passed");

    let store = Arc::new(Store::open(&config.db_path)?);
    info!(db_path = %config.db_path.display(), "store opened");

    let forge = Arc::new(ForgeGateway::new(config.forge_token.clone(), config.github_repo.clone(), config.target_repo_path.clone()));
    let workspace = Arc::new(WorkspaceManager::new(config.target_repo_path.clone(), config.worktree_dir.clone()));
    let prompts = Arc::new(PromptBuilder::new(config.target_repo_path.clone(), config.skills_enabled));

    startup::recover(&store, &workspace).await?;
    info!("startup recovery complete");

    let pool_config = PoolConfig {
        claude_oauth_token: config.claude_oauth_token.clone(),
        forge_token: config.forge_token.clone(),
        base_branch: config.base_branch.clone(),
        max_concurrent_agents: config.max_concurrent_agents,
        agent_timeout_seconds: config.agent_timeout_seconds,
        max_rate_limit_resumes: config.max_rate_limit_resumes,
        skills_enabled: config.skills_enabled,
    };
    let pool = Arc::new(WorkerPool::new(store.clone(), forge.clone(), workspace.clone(), prompts.clone(), pool_config));
    let dispatcher: Arc<dyn Dispatcher> = pool.clone();

    let poller_config = PollerConfig {
        issue_label: config.issue_label.clone(),
        max_issue_retries: config.max_issue_retries,
        trigger_mention: config.trigger_mention.clone(),
        poll_interval_seconds: config.poll_interval_seconds,
        pr_poll_interval_seconds: config.pr_poll_interval_seconds,
        max_pr_fix_retries: config.max_pr_fix_retries,
        ci_wait_timeout_seconds: config.ci_wait_timeout_seconds,
        rate_limit_retry_interval: config.rate_limit_retry_interval,
        claude_oauth_token: config.claude_oauth_token.clone(),
    };
    let control_plane = ControlPlane::new(store.clone(), forge.clone(), dispatcher, poller_config);
    let shutdown_flag = control_plane.shutdown_flag();
    let poller_handles = control_plane.spawn_all();
    info!("control plane started: issue intake, PR reviewer, rate-limit watcher");

    let static_dir = static_assets_dir();
    let dashboard_app = dashboard::router(store.clone(), static_dir);
    let dashboard_addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.dashboard_port));
    let listener = tokio::net::TcpListener::bind(dashboard_addr).await?;
    info!(addr = %dashboard_addr, "dashboard listening");
    let dashboard_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, dashboard_app).await {
            error!(error = %e, "dashboard server exited unexpectedly");
        }
    });

    wait_for_shutdown_signal().await;
    info!("shutdown signal received, stopping pollers (live workers are detached and keep running)");
    shutdown_flag.store(true, std::sync::atomic::Ordering::Relaxed);

    for handle in poller_handles {
        let _ = handle.await;
    }
    dashboard_handle.abort();

    info!("swarm orchestrator stopped");
    Ok(())
}

/// Resolves the sibling `static/` directory the dashboard serves assets
/// from. Falls back to a path relative to the crate manifest in dev builds
/// when the binary isn't run from its install layout.
fn static_assets_dir() -> PathBuf {
    let candidate = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("static");
    if candidate.exists() {
        return candidate;
    }
    PathBuf::from("static")
}

fn init_logging(worktree_dir: &std::path::Path) -> tracing_appender::non_blocking::WorkerGuard {
    let log_dir = worktree_dir.parent().unwrap_or(worktree_dir).join("logs");
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(log_dir, "swarm.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stdout.and(non_blocking))
        .init();

    guard
}

/// Waits for either SIGINT or SIGTERM (spec.md §6 "Exit codes and signals").
async fn wait_for_shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to install SIGTERM handler");
            std::future::pending::<()>().await;
            unreachable!()
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}
