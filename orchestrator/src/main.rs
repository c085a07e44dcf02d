use std::sync::Arc;
use warp::Filter;
use tracing::info;

use rag_orchestrator::config::{ConfigBackend, Settings};
use rag_orchestrator::metrics::Metrics;
use rag_orchestrator::redis_client::RedisClient;
use rag_orchestrator::resolver::{self, ConfigResolver, PgConfigResolver, RedisConfigResolver};
use rag_orchestrator::translator::{HttpTranslator, NoopTranslator, Translator};
use rag_orchestrator::{api, db, error, middleware, ClientCache, QueryOrchestrator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first so LOG_LEVEL can seed the filter
    let settings = Settings::from_env()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level))
        )
        .json()
        .init();

    info!("Starting knowledge base retrieval orchestrator");

    // Redis carries config-change notifications for every backend
    let redis_client = RedisClient::new(&settings.redis_url).await?;
    info!("Redis connection established");

    let resolver: Arc<dyn ConfigResolver> = match settings.config_backend {
        ConfigBackend::Redis => {
            info!("Reading agent retrieval configs from Redis");
            Arc::new(RedisConfigResolver::new(redis_client.clone()))
        }
        ConfigBackend::Postgres => {
            let db_pool = db::create_pool(&settings.database_url, settings.db_max_connections).await?;
            db::migrate(&db_pool).await?;
            info!("Reading agent retrieval configs from Postgres");
            Arc::new(PgConfigResolver::new(db_pool))
        }
    };

    let http = reqwest::Client::builder()
        .pool_idle_timeout(std::time::Duration::from_secs(90))
        .build()?;

    let translator: Arc<dyn Translator> = match settings.translation_url() {
        Some(url) => {
            info!("Query translation via {}", url);
            Arc::new(HttpTranslator::new(http.clone(), url))
        }
        None => Arc::new(NoopTranslator),
    };

    let cache = Arc::new(ClientCache::new(resolver, http));
    let _listener = resolver::spawn_invalidation_listener(redis_client, cache.clone());

    let orchestrator = Arc::new(
        QueryOrchestrator::new(cache, translator, Arc::new(Metrics::new()?))
            .with_deadline(settings.retrieval_deadline()),
    );

    let routes = api::routes(orchestrator)
        .recover(error::handle_rejection)
        .with(warp::log("api"))
        .with(middleware::cors());

    // Start server
    let addr = ([0, 0, 0, 0], settings.port);
    info!("Server listening on {}", settings.port);

    warp::serve(routes)
        .run(addr)
        .await;

    Ok(())
}
