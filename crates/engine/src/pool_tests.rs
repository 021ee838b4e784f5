use super::*;
use swarm_adapters::{ForgeGateway, PromptBuilder, WorkspaceManager};
use swarm_core::AgentId;
use swarm_storage::Store;
use tempfile::tempdir;

fn test_pool(max_concurrent: usize) -> (WorkerPool, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("swarm.db");
    let store = Arc::new(Store::open(&db_path).unwrap());
    let forge = Arc::new(ForgeGateway::new("test-token", "octo/repo", dir.path()));
    let workspace = Arc::new(WorkspaceManager::new(dir.path(), dir.path().join("worktrees")));
    let prompts = Arc::new(PromptBuilder::new(dir.path(), false));
    let config = PoolConfig {
        claude_oauth_token: "token".to_string(),
        forge_token: "token".to_string(),
        base_branch: "main".to_string(),
        max_concurrent_agents: max_concurrent,
        agent_timeout_seconds: 1800,
        max_rate_limit_resumes: 5,
        skills_enabled: false,
    };
    let pool = WorkerPool::new(store, forge, workspace, prompts, config);
    (pool, dir)
}

#[tokio::test]
async fn can_dispatch_true_when_under_capacity() {
    let (pool, _dir) = test_pool(2);
    assert!(pool.can_dispatch().await);
}

#[test]
fn allowed_tools_appends_skill_when_enabled() {
    let (mut pool, _dir) = test_pool(1);
    assert_eq!(pool.allowed_tools(), BASE_ALLOWED_TOOLS);
    pool.config.skills_enabled = true;
    assert!(pool.allowed_tools().ends_with(",Skill"));
}

#[tokio::test]
async fn resume_rate_limited_is_a_noop_for_unknown_agent() {
    let (pool, _dir) = test_pool(1);
    let result = pool.resume_rate_limited(&AgentId::new("agent-issue-1-1")).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn active_agents_empty_for_fresh_pool() {
    let (pool, _dir) = test_pool(1);
    assert!(pool.active_agents().await.is_empty());
}
