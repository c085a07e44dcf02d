// Query Orchestrator: user text in, knowledge-base context (or nothing) out
//
// Idle -> Translating -> Resolving -> Querying (raced against the deadline)
// -> Succeeded | Degraded. Any step may degrade; the caller always gets an
// answer within the deadline and never sees an error.

use crate::error::RetrievalError;
use crate::metrics::Metrics;
use crate::models::{ProcessOutcome, Query, RetrievalResult};
use crate::retrieval::cache::ClientCache;
use crate::retrieval::client::WireFormat;
use crate::translator::Translator;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Hard ceiling on how long a conversation turn waits for the knowledge base.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(3);

pub struct QueryOrchestrator {
    cache: Arc<ClientCache>,
    translator: Arc<dyn Translator>,
    metrics: Arc<Metrics>,
    deadline: Duration,
}

impl QueryOrchestrator {
    pub fn new(
        cache: Arc<ClientCache>,
        translator: Arc<dyn Translator>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            cache,
            translator,
            metrics,
            deadline: DEFAULT_DEADLINE,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn cache(&self) -> &Arc<ClientCache> {
        &self.cache
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub async fn process(
        &self,
        original_text: &str,
        connection_id: &str,
        agent_id: &str,
    ) -> ProcessOutcome {
        self.process_in_conversation(original_text, connection_id, "", agent_id)
            .await
    }

    /// Same as `process`, threading an upstream conversation id through to
    /// providers that keep conversational state.
    pub async fn process_in_conversation(
        &self,
        original_text: &str,
        connection_id: &str,
        conversation_id: &str,
        agent_id: &str,
    ) -> ProcessOutcome {
        if original_text.is_empty() {
            return ProcessOutcome::passthrough(original_text);
        }

        let normalized_text = match self.normalize(original_text).await {
            Ok(text) => text,
            Err(e) => {
                self.record_degraded(agent_id, connection_id, &e);
                return ProcessOutcome::passthrough(original_text);
            }
        };

        let query = Query {
            original_text: original_text.to_string(),
            normalized_text,
            connection_id: connection_id.to_string(),
            conversation_id: conversation_id.to_string(),
            agent_id: agent_id.to_string(),
        };

        let result = self.retrieve(&query).await;
        if !result.found {
            return ProcessOutcome::passthrough(original_text);
        }

        self.metrics.record_used();
        info!(
            agent_id,
            connection_id,
            elapsed_ms = result.elapsed.as_millis() as u64,
            chars = result.text.len(),
            "Knowledge base context attached"
        );

        let context = context_block(&query, &result.text);
        ProcessOutcome {
            used: true,
            text_to_forward: format!("{}\n\n{}", context, original_text),
            context,
        }
    }

    /// Resolves a fresh client and runs the query under the deadline.
    /// Failures come back as `found == false` and are already logged.
    pub async fn retrieve(&self, query: &Query) -> RetrievalResult {
        let started = Instant::now();
        match self.try_retrieve(query, started).await {
            Ok(text) => RetrievalResult {
                found: true,
                text,
                elapsed: started.elapsed(),
            },
            Err(e) => {
                self.record_degraded(&query.agent_id, &query.connection_id, &e);
                RetrievalResult::not_found(started.elapsed())
            }
        }
    }

    async fn normalize(&self, text: &str) -> Result<String, RetrievalError> {
        if !self.translator.is_available() {
            return Ok(text.to_string());
        }

        let translated = self
            .translator
            .translate_to_query(text)
            .await
            .map_err(|e| RetrievalError::TranslationFailed(e.to_string()))?;

        if translated.trim().is_empty() {
            return Err(RetrievalError::TranslationFailed(
                "translator returned empty text".to_string(),
            ));
        }
        Ok(translated)
    }

    async fn try_retrieve(&self, query: &Query, started: Instant) -> Result<String, RetrievalError> {
        let entry = self.cache.resolve(&query.agent_id).await?;
        debug!(
            agent_id = %query.agent_id,
            base_url = %entry.config.base_url,
            format = ?entry.client.format(),
            "Querying knowledge base"
        );

        // The deadline bounds the network call, not config resolution.
        let deadline = Instant::now() + self.deadline;
        let (tx, rx) = oneshot::channel();

        let client = entry.client.clone();
        let text = query.normalized_text.clone();
        let user_id = query.connection_id.clone();
        let conversation_id = query.conversation_id.clone();
        tokio::spawn(async move {
            let result = client.query(deadline, &text, &user_id, &conversation_id).await;
            // Nobody is listening once the deadline has passed; the result is dropped.
            let _ = tx.send(result);
        });

        let deadline_ms = self.deadline.as_millis() as u64;
        let outcome = match tokio::time::timeout_at(deadline, rx).await {
            Ok(Ok(result)) => result.map_err(|e| match e {
                RetrievalError::Timeout { .. } => RetrievalError::Timeout { deadline_ms },
                other => other,
            }),
            Ok(Err(_)) => Err(RetrievalError::Aborted),
            Err(_) => Err(RetrievalError::Timeout { deadline_ms }),
        };

        let format = match entry.client.format() {
            WireFormat::Legacy => "legacy",
            WireFormat::Modern => "modern",
        };
        self.metrics.observe_retrieval(format, started.elapsed());

        outcome
    }

    fn record_degraded(&self, agent_id: &str, connection_id: &str, error: &RetrievalError) {
        self.metrics.record_degraded(error.kind());
        match error {
            RetrievalError::Disabled { .. } => {
                debug!(agent_id, connection_id, "Retrieval disabled, passing through")
            }
            _ => warn!(
                agent_id,
                connection_id,
                reason = error.kind(),
                "Proceeding without knowledge base context: {}",
                error
            ),
        }
    }
}

/// Delimited block handed to prompt assembly.
pub fn context_block(query: &Query, retrieved: &str) -> String {
    format!(
        "[KNOWLEDGE BASE {agent} BEGIN]\n\
         Question: {question}\n\
         Search query: {search}\n\
         Retrieved:\n\
         {retrieved}\n\
         [KNOWLEDGE BASE {agent} END]",
        agent = query.agent_id,
        question = query.original_text,
        search = query.normalized_text,
        retrieved = retrieved.trim(),
    )
}
