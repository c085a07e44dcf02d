use super::ConfigResolver;
use crate::models::AgentRetrievalConfig;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// In-process config store. Handy when the service is embedded and in tests.
#[derive(Default)]
pub struct StaticConfigResolver {
    configs: RwLock<HashMap<String, AgentRetrievalConfig>>,
}

impl StaticConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, config: AgentRetrievalConfig) {
        self.configs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(config.agent_id.clone(), config);
    }

    pub fn remove(&self, agent_id: &str) -> Option<AgentRetrievalConfig> {
        self.configs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(agent_id)
    }
}

#[async_trait]
impl ConfigResolver for StaticConfigResolver {
    async fn get_config(&self, agent_id: &str) -> Result<AgentRetrievalConfig> {
        self.configs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(agent_id)
            .cloned()
            .ok_or_else(|| anyhow!("no retrieval config for agent {}", agent_id))
    }
}
