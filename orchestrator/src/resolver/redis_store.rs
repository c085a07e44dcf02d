use super::ConfigResolver;
use crate::models::AgentRetrievalConfig;
use crate::redis_client::RedisClient;
use crate::retrieval::ClientCache;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Pub/sub channel carrying config-change notifications. The payload is an
/// agent id, or `*` for every agent.
pub const INVALIDATION_CHANNEL: &str = "agent:retrieval:invalidate";

pub fn config_key(agent_id: &str) -> String {
    format!("agent:{}:retrieval", agent_id)
}

/// Reads JSON-encoded `AgentRetrievalConfig` values from Redis.
#[derive(Clone)]
pub struct RedisConfigResolver {
    redis: RedisClient,
}

impl RedisConfigResolver {
    pub fn new(redis: RedisClient) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl ConfigResolver for RedisConfigResolver {
    async fn get_config(&self, agent_id: &str) -> Result<AgentRetrievalConfig> {
        let mut redis = self.redis.clone();
        let mut config: AgentRetrievalConfig = redis
            .get(&config_key(agent_id))
            .await?
            .ok_or_else(|| anyhow!("no retrieval config for agent {}", agent_id))?;

        if config.agent_id.is_empty() {
            config.agent_id = agent_id.to_string();
        }
        Ok(config)
    }
}

/// Drops cached clients as soon as an administrator announces a change.
/// Correctness does not depend on this; it only evicts stale entries early.
pub fn spawn_invalidation_listener(redis: RedisClient, cache: Arc<ClientCache>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let pubsub = match redis.subscribe(INVALIDATION_CHANNEL).await {
            Ok(pubsub) => pubsub,
            Err(e) => {
                error!("Failed to subscribe to {}: {}", INVALIDATION_CHANNEL, e);
                return;
            }
        };
        info!("Listening for config changes on {}", INVALIDATION_CHANNEL);

        let mut messages = pubsub.into_on_message();
        while let Some(message) = messages.next().await {
            let payload: String = match message.get_payload() {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("Ignoring undecodable invalidation message: {}", e);
                    continue;
                }
            };
            apply_invalidation(&cache, payload.trim());
        }

        warn!("Invalidation subscription on {} closed", INVALIDATION_CHANNEL);
    })
}

fn apply_invalidation(cache: &ClientCache, payload: &str) {
    match payload {
        "" => {}
        "*" => {
            cache.invalidate_all();
        }
        agent_id => {
            cache.invalidate(agent_id);
        }
    }
}
