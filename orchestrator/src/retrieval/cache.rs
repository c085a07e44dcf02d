// Client Cache: agent id -> ready-to-use retrieval client, refreshed on every read
//
// Every resolve asks the config resolver first and rebuilds the entry from what
// it returns, so a revoked token or moved endpoint is never used after the
// resolver reports the change. The resolver call happens outside the lock;
// only the map swap is synchronized.

use crate::error::RetrievalError;
use crate::models::AgentRetrievalConfig;
use crate::resolver::ConfigResolver;
use crate::retrieval::client::RetrievalClient;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// Immutable snapshot. Replaced wholesale, never updated in place.
pub struct CacheEntry {
    pub agent_id: String,
    pub config: AgentRetrievalConfig,
    pub client: RetrievalClient,
}

pub struct ClientCache {
    resolver: Arc<dyn ConfigResolver>,
    http: Client,
    entries: RwLock<HashMap<String, Arc<CacheEntry>>>,
}

impl ClientCache {
    pub fn new(resolver: Arc<dyn ConfigResolver>, http: Client) -> Self {
        Self {
            resolver,
            http,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Fetches the current config and returns a client built from it.
    /// Disabled agents and resolver failures evict any cached entry.
    pub async fn resolve(&self, agent_id: &str) -> Result<Arc<CacheEntry>, RetrievalError> {
        let config = match self.resolver.get_config(agent_id).await {
            Ok(config) => config,
            Err(e) => {
                self.evict(agent_id);
                return Err(RetrievalError::ConfigUnavailable {
                    agent_id: agent_id.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        if !config.enabled {
            self.evict(agent_id);
            return Err(RetrievalError::Disabled {
                agent_id: agent_id.to_string(),
            });
        }

        let entry = Arc::new(CacheEntry {
            agent_id: agent_id.to_string(),
            client: RetrievalClient::new(self.http.clone(), &config),
            config,
        });

        let previous = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(agent_id.to_string(), entry.clone());

        if let Some(previous) = previous {
            if previous.config != entry.config {
                info!(agent_id, base_url = %entry.config.base_url, "Retrieval config changed, client rebuilt");
            }
        } else {
            debug!(agent_id, "Retrieval client cached");
        }

        Ok(entry)
    }

    /// Last entry stored for the agent, without consulting the resolver.
    /// Not suitable for querying; use `resolve` for that.
    pub fn cached(&self, agent_id: &str) -> Option<Arc<CacheEntry>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(agent_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns whether an entry was present.
    pub fn invalidate(&self, agent_id: &str) -> bool {
        let removed = self.evict(agent_id);
        if removed {
            info!(agent_id, "Retrieval client invalidated");
        }
        removed
    }

    /// Returns how many entries were dropped.
    pub fn invalidate_all(&self) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let dropped = entries.len();
        entries.clear();
        info!(dropped, "All retrieval clients invalidated");
        dropped
    }

    fn evict(&self, agent_id: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(agent_id)
            .is_some()
    }
}
