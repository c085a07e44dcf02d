use super::ConfigResolver;
use crate::db::DbPool;
use crate::models::AgentRetrievalConfig;
use anyhow::{anyhow, Result};
use async_trait::async_trait;

/// Reads the `agent_retrieval_configs` table.
#[derive(Clone)]
pub struct PgConfigResolver {
    pool: DbPool,
}

impl PgConfigResolver {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConfigResolver for PgConfigResolver {
    async fn get_config(&self, agent_id: &str) -> Result<AgentRetrievalConfig> {
        sqlx::query_as::<_, AgentRetrievalConfig>(
            "SELECT agent_id, enabled, base_url, token, timeout_seconds, max_retries
             FROM agent_retrieval_configs WHERE agent_id = $1",
        )
        .bind(agent_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| anyhow!("no retrieval config for agent {}", agent_id))
    }
}
