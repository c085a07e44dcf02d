use std::sync::Arc;
use warp::{Filter, Rejection, Reply};
use crate::retrieval::QueryOrchestrator;

mod admin;
mod process;

pub fn routes(
    orchestrator: Arc<QueryOrchestrator>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let api = warp::path("api").and(warp::path("v1"));

    let process_route = api
        .and(warp::path("process"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(64 * 1024))
        .and(warp::body::json())
        .and(with_orchestrator(orchestrator.clone()))
        .and_then(process::handle_process);

    let invalidate_all_route = api
        .and(warp::path("agents"))
        .and(warp::path("invalidate"))
        .and(warp::path::end())
        .and(warp::post())
        .and(with_orchestrator(orchestrator.clone()))
        .and_then(admin::handle_invalidate_all);

    let invalidate_route = api
        .and(warp::path("agents"))
        .and(warp::path::param::<String>())
        .and(warp::path("invalidate"))
        .and(warp::path::end())
        .and(warp::post())
        .and(with_orchestrator(orchestrator.clone()))
        .and_then(admin::handle_invalidate);

    let health_route = warp::path("health")
        .and(warp::get())
        .and(with_orchestrator(orchestrator.clone()))
        .and_then(admin::handle_health);

    let metrics_route = warp::path("metrics")
        .and(warp::get())
        .and(with_orchestrator(orchestrator))
        .and_then(admin::handle_metrics);

    process_route
        .or(invalidate_all_route)
        .or(invalidate_route)
        .or(health_route)
        .or(metrics_route)
}

fn with_orchestrator(
    orchestrator: Arc<QueryOrchestrator>,
) -> impl Filter<Extract = (Arc<QueryOrchestrator>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || orchestrator.clone())
}
