// Config resolvers: where per-agent retrieval settings come from
//
// The cache calls `get_config` on every query and treats the answer as
// authoritative, so implementations must be cheap and must not cache on their own.

use crate::models::AgentRetrievalConfig;
use anyhow::Result;
use async_trait::async_trait;

mod memory;
mod pg_store;
mod redis_store;

pub use memory::StaticConfigResolver;
pub use pg_store::PgConfigResolver;
pub use redis_store::{config_key, spawn_invalidation_listener, RedisConfigResolver, INVALIDATION_CHANNEL};

#[async_trait]
pub trait ConfigResolver: Send + Sync {
    /// Current settings for `agent_id`. Unknown agents are an error.
    async fn get_config(&self, agent_id: &str) -> Result<AgentRetrievalConfig>;
}
