use std::sync::Arc;
use std::time::Instant;
use warp::{Rejection, Reply};
use uuid::Uuid;
use tracing::info;
use crate::error::ApiError;
use crate::models::{ProcessRequest, ProcessResponse};
use crate::retrieval::QueryOrchestrator;

pub async fn handle_process(
    request: ProcessRequest,
    orchestrator: Arc<QueryOrchestrator>,
) -> Result<impl Reply, Rejection> {
    if request.agent_id.trim().is_empty() {
        return Err(warp::reject::custom(ApiError::BadRequest(
            "agent_id must not be empty".to_string(),
        )));
    }

    let request_id = Uuid::new_v4();
    let started = Instant::now();
    info!(%request_id, agent_id = %request.agent_id, connection_id = %request.connection_id, "Processing utterance");

    let outcome = orchestrator
        .process_in_conversation(
            &request.text,
            &request.connection_id,
            request.conversation_id.as_deref().unwrap_or_default(),
            &request.agent_id,
        )
        .await;

    Ok(warp::reply::json(&ProcessResponse {
        request_id,
        used: outcome.used,
        context: outcome.context,
        text_to_forward: outcome.text_to_forward,
        elapsed_ms: started.elapsed().as_millis() as u64,
    }))
}
