// Retrieval Client: one query against one configured knowledge base endpoint

use crate::error::RetrievalError;
use crate::models::{
    AgentRetrievalConfig, LegacyRetrieveRequest, LegacyRetrieveResponse,
    ModernRetrieveRequest, ModernRetrieveResponse,
};
use crate::retrieval::extractor::ResponseExtractor;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Endpoints containing this marker (any case) speak the legacy protocol.
pub const LEGACY_PROVIDER_MARKER: &str = "dify";

/// Path appended to the base URL for the modern protocol.
pub const MODERN_RETRIEVE_PATH: &str = "/api/v2/retrieve";

/// Per-attempt HTTP timeout when the agent config leaves it unset.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);

const RETRY_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    Legacy,
    Modern,
}

impl WireFormat {
    pub fn detect(base_url: &str) -> Self {
        if base_url.to_lowercase().contains(LEGACY_PROVIDER_MARKER) {
            WireFormat::Legacy
        } else {
            WireFormat::Modern
        }
    }
}

/// Cheap value object bound to one `{base_url, token}` pair. The underlying
/// `reqwest::Client` is shared, so building one per query costs nothing.
#[derive(Clone)]
pub struct RetrievalClient {
    http: Client,
    base_url: String,
    token: String,
    format: WireFormat,
    attempt_timeout: Duration,
    max_retries: u32,
}

impl RetrievalClient {
    pub fn new(http: Client, config: &AgentRetrievalConfig) -> Self {
        let attempt_timeout = if config.timeout_seconds > 0 {
            Duration::from_secs(config.timeout_seconds as u64)
        } else {
            DEFAULT_ATTEMPT_TIMEOUT
        };

        Self {
            http,
            base_url: config.base_url.trim().to_string(),
            token: config.token.trim().to_string(),
            format: WireFormat::detect(&config.base_url),
            attempt_timeout,
            max_retries: config.max_retries.max(0) as u32,
        }
    }

    pub fn format(&self) -> WireFormat {
        self.format
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Runs the query, retrying transport failures and 5xx responses while
    /// time remains before `deadline`. No attempt outlives the deadline.
    pub async fn query(
        &self,
        deadline: Instant,
        text: &str,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<String, RetrievalError> {
        if self.base_url.is_empty() || self.token.is_empty() {
            return Err(RetrievalError::NotConfigured);
        }

        let mut attempt = 0;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(RetrievalError::Timeout { deadline_ms: 0 });
            }
            let timeout = remaining.min(self.attempt_timeout);

            let result = match self.format {
                WireFormat::Legacy => self.query_legacy(timeout, text, user_id, conversation_id).await,
                WireFormat::Modern => self.query_modern(timeout, text).await,
            };

            match result {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        base_url = %self.base_url,
                        attempt,
                        reason = e.kind(),
                        "Retrieval attempt failed, retrying"
                    );
                    tokio::time::sleep_until(
                        (Instant::now() + RETRY_BACKOFF * attempt).min(deadline),
                    )
                    .await;
                }
                other => return other,
            }
        }
    }

    async fn query_legacy(
        &self,
        timeout: Duration,
        text: &str,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<String, RetrievalError> {
        let body = LegacyRetrieveRequest {
            inputs: serde_json::Map::new(),
            query: text,
            response_mode: "blocking",
            conversation_id,
            user: user_id,
        };

        let request = self
            .http
            .post(&self.base_url)
            .bearer_auth(&self.token)
            .timeout(timeout)
            .json(&body);

        let response: LegacyRetrieveResponse = self.send(request).await?;
        ResponseExtractor::extract(&response)
    }

    async fn query_modern(&self, timeout: Duration, text: &str) -> Result<String, RetrievalError> {
        let url = format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            MODERN_RETRIEVE_PATH
        );
        let body = ModernRetrieveRequest {
            agent_id: &self.token,
            query: text,
        };

        let request = self.http.post(&url).timeout(timeout).json(&body);

        let response: ModernRetrieveResponse = self.send(request).await?;
        if response.results.trim().is_empty() {
            return Err(RetrievalError::EmptyResult);
        }
        Ok(response.results)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, RetrievalError> {
        let response = request.send().await.map_err(RetrievalError::RequestFailed)?;

        let status = response.status();
        let body = response.text().await.map_err(RetrievalError::RequestFailed)?;
        debug!(base_url = %self.base_url, status = status.as_u16(), bytes = body.len(), "Knowledge base replied");

        if !status.is_success() {
            return Err(RetrievalError::UpstreamError {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str, token: &str) -> AgentRetrievalConfig {
        AgentRetrievalConfig {
            agent_id: "agent-1".to_string(),
            enabled: true,
            base_url: base_url.to_string(),
            token: token.to_string(),
            timeout_seconds: 0,
            max_retries: -1,
        }
    }

    #[test]
    fn test_format_detection_is_case_insensitive() {
        assert_eq!(WireFormat::detect("https://api.DIFY.ai/v1/chat-messages"), WireFormat::Legacy);
        assert_eq!(WireFormat::detect("https://dify.internal/v1"), WireFormat::Legacy);
        assert_eq!(WireFormat::detect("https://kb.example.com"), WireFormat::Modern);
        assert_eq!(WireFormat::detect(""), WireFormat::Modern);
    }

    #[test]
    fn test_defaults_for_unset_limits() {
        let client = RetrievalClient::new(Client::new(), &config("http://kb", "tok"));
        assert_eq!(client.attempt_timeout, DEFAULT_ATTEMPT_TIMEOUT);
        assert_eq!(client.max_retries, 0);
        assert_eq!(client.format(), WireFormat::Modern);
    }

    #[tokio::test]
    async fn test_missing_endpoint_or_token_is_not_configured() {
        let deadline = Instant::now() + Duration::from_secs(1);

        let client = RetrievalClient::new(Client::new(), &config("", ""));
        let result = client.query(deadline, "hello", "user", "").await;
        assert!(matches!(result, Err(RetrievalError::NotConfigured)));

        let client = RetrievalClient::new(Client::new(), &config("http://kb", "  "));
        let result = client.query(deadline, "hello", "user", "").await;
        assert!(matches!(result, Err(RetrievalError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_expired_deadline_sends_nothing() {
        // Port 9 (discard) is never contacted because the deadline has passed.
        let client = RetrievalClient::new(Client::new(), &config("http://127.0.0.1:9", "tok"));
        let result = client.query(Instant::now(), "hello", "user", "").await;
        assert!(matches!(result, Err(RetrievalError::Timeout { .. })));
    }
}
