use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Per-agent retrieval settings as stored by the external config store.
/// The orchestrator only ever holds read-only snapshots of this.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AgentRetrievalConfig {
    pub agent_id: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub timeout_seconds: i32,
    #[serde(default)]
    pub max_retries: i32,
}

// Keeps the credential out of logs.
impl fmt::Debug for AgentRetrievalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentRetrievalConfig")
            .field("agent_id", &self.agent_id)
            .field("enabled", &self.enabled)
            .field("base_url", &self.base_url)
            .field("token", &if self.token.is_empty() { "" } else { "<redacted>" })
            .field("timeout_seconds", &self.timeout_seconds)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Query {
    pub original_text: String,
    pub normalized_text: String,
    pub connection_id: String,
    pub conversation_id: String,
    pub agent_id: String,
}

/// `found == false` is the normal "no knowledge-base context" path.
#[derive(Debug, Clone)]
pub struct RetrievalResult {
    pub found: bool,
    pub text: String,
    pub elapsed: Duration,
}

impl RetrievalResult {
    pub fn not_found(elapsed: Duration) -> Self {
        Self {
            found: false,
            text: String::new(),
            elapsed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessOutcome {
    pub used: bool,
    pub context: String,
    pub text_to_forward: String,
}

impl ProcessOutcome {
    pub fn passthrough(original_text: &str) -> Self {
        Self {
            used: false,
            context: String::new(),
            text_to_forward: original_text.to_string(),
        }
    }
}

// API Request/Response models
#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub agent_id: String,
    #[serde(default)]
    pub connection_id: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub request_id: uuid::Uuid,
    pub used: bool,
    pub context: String,
    pub text_to_forward: String,
    pub elapsed_ms: u64,
}

// Knowledge base wire models
#[derive(Debug, Serialize)]
pub struct LegacyRetrieveRequest<'a> {
    pub inputs: serde_json::Map<String, serde_json::Value>,
    pub query: &'a str,
    pub response_mode: &'static str,
    pub conversation_id: &'a str,
    pub user: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct LegacyRetrieveResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// `agent_id` carries the configured token: the modern protocol addresses the
/// remote agent by that value instead of authenticating with it.
#[derive(Debug, Serialize)]
pub struct ModernRetrieveRequest<'a> {
    pub agent_id: &'a str,
    pub query: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ModernRetrieveResponse {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub results: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_debug_hides_token() {
        let config = AgentRetrievalConfig {
            agent_id: "agent-1".to_string(),
            enabled: true,
            base_url: "http://kb.local".to_string(),
            token: "secret-token".to_string(),
            timeout_seconds: 5,
            max_retries: 1,
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("http://kb.local"));
    }

    #[test]
    fn test_config_missing_fields_default() {
        let config: AgentRetrievalConfig =
            serde_json::from_str(r#"{"agent_id":"a"}"#).unwrap();
        assert!(!config.enabled);
        assert!(config.base_url.is_empty());
        assert_eq!(config.max_retries, 0);
    }

    #[test]
    fn test_legacy_request_shape() {
        let body = LegacyRetrieveRequest {
            inputs: serde_json::Map::new(),
            query: "hello",
            response_mode: "blocking",
            conversation_id: "",
            user: "conn-1",
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "inputs": {},
                "query": "hello",
                "response_mode": "blocking",
                "conversation_id": "",
                "user": "conn-1",
            })
        );
    }
}
