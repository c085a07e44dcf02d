use std::sync::Arc;
use warp::{Rejection, Reply};
use tracing::{error, info};
use serde_json::json;
use crate::error::ApiError;
use crate::retrieval::QueryOrchestrator;

pub async fn handle_invalidate(
    agent_id: String,
    orchestrator: Arc<QueryOrchestrator>,
) -> Result<impl Reply, Rejection> {
    let was_cached = orchestrator.cache().invalidate(&agent_id);
    info!(agent_id = %agent_id, was_cached, "Invalidation requested");
    Ok(warp::reply::json(&json!({ "invalidated": agent_id, "was_cached": was_cached })))
}

pub async fn handle_invalidate_all(
    orchestrator: Arc<QueryOrchestrator>,
) -> Result<impl Reply, Rejection> {
    let dropped = orchestrator.cache().invalidate_all();
    Ok(warp::reply::json(&json!({ "invalidated": "*", "dropped": dropped })))
}

pub async fn handle_health(
    orchestrator: Arc<QueryOrchestrator>,
) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&json!({
        "status": "healthy",
        "cached_agents": orchestrator.cache().len(),
    })))
}

pub async fn handle_metrics(
    orchestrator: Arc<QueryOrchestrator>,
) -> Result<impl Reply, Rejection> {
    let buffer = orchestrator.metrics().render().map_err(|e| {
        error!("Failed to encode metrics: {}", e);
        warp::reject::custom(ApiError::InternalError(e.to_string()))
    })?;

    Ok(warp::reply::with_header(
        buffer,
        "Content-Type",
        prometheus::TEXT_FORMAT,
    ))
}
