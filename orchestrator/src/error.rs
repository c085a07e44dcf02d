use thiserror::Error;
use warp::{reject::Reject, Rejection, Reply};

/// Everything that can go wrong between receiving user text and handing back
/// knowledge-base context. None of these ever reach the conversation caller;
/// the orchestrator turns each one into a pass-through.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Retrieval endpoint or credential is not configured")]
    NotConfigured,

    #[error("Retrieval is disabled for agent {agent_id}")]
    Disabled { agent_id: String },

    #[error("Could not resolve retrieval config for agent {agent_id}: {reason}")]
    ConfigUnavailable { agent_id: String, reason: String },

    #[error("Query translation failed: {0}")]
    TranslationFailed(String),

    #[error("Retrieval request failed: {0}")]
    RequestFailed(#[source] reqwest::Error),

    #[error("Knowledge base returned HTTP {status}: {body}")]
    UpstreamError { status: u16, body: String },

    #[error("Malformed knowledge base response: {0}")]
    DecodeError(#[from] serde_json::Error),

    #[error("Knowledge base returned no results")]
    EmptyResult,

    #[error("No answer found in knowledge base response")]
    NoAnswerFound,

    #[error("Retrieval exceeded the {deadline_ms}ms deadline")]
    Timeout { deadline_ms: u64 },

    #[error("Retrieval task ended without a result")]
    Aborted,
}

impl RetrievalError {
    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RetrievalError::NotConfigured => "not_configured",
            RetrievalError::Disabled { .. } => "disabled",
            RetrievalError::ConfigUnavailable { .. } => "config_unavailable",
            RetrievalError::TranslationFailed(_) => "translation_failed",
            RetrievalError::RequestFailed(_) => "request_failed",
            RetrievalError::UpstreamError { .. } => "upstream_error",
            RetrievalError::DecodeError(_) => "decode_error",
            RetrievalError::EmptyResult => "empty_result",
            RetrievalError::NoAnswerFound => "no_answer_found",
            RetrievalError::Timeout { .. } => "timeout",
            RetrievalError::Aborted => "aborted",
        }
    }

    /// Transport failures and 5xx responses are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            RetrievalError::RequestFailed(_) => true,
            RetrievalError::UpstreamError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl Reject for ApiError {}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Rejection> {
    if let Some(api_err) = err.find::<ApiError>() {
        let (code, message) = match api_err {
            ApiError::BadRequest(_) => (
                warp::http::StatusCode::BAD_REQUEST,
                "Bad request",
            ),
            ApiError::InternalError(_) => (
                warp::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            ),
        };

        let json = warp::reply::json(&serde_json::json!({
            "error": message,
            "details": api_err.to_string(),
        }));

        Ok(warp::reply::with_status(json, code))
    } else {
        Err(err)
    }
}
