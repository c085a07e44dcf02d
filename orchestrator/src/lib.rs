//! Agent-scoped knowledge base retrieval for live conversations.
//!
//! Each utterance is translated into a query, sent to the agent's configured
//! knowledge base under a hard deadline, and returned as a labelled context
//! block. Configuration is re-read on every query; any failure degrades to
//! passing the original text through.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod redis_client;
pub mod resolver;
pub mod retrieval;
pub mod translator;

pub use error::{ApiError, RetrievalError};
pub use models::{AgentRetrievalConfig, ProcessOutcome, Query, RetrievalResult};
pub use resolver::ConfigResolver;
pub use retrieval::{ClientCache, QueryOrchestrator, RetrievalClient, ResponseExtractor};
pub use translator::{HttpTranslator, NoopTranslator, Translator};
