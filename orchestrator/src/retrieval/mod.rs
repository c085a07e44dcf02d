pub mod cache;
pub mod client;
pub mod extractor;
pub mod orchestrator;

pub use cache::{CacheEntry, ClientCache};
pub use client::{RetrievalClient, WireFormat, LEGACY_PROVIDER_MARKER, MODERN_RETRIEVE_PATH};
pub use extractor::ResponseExtractor;
pub use orchestrator::{context_block, QueryOrchestrator, DEFAULT_DEADLINE};
