//! Fake knowledge base and orchestrator wiring shared by the integration tests.

#![allow(dead_code)]

use rag_orchestrator::metrics::Metrics;
use rag_orchestrator::resolver::StaticConfigResolver;
use rag_orchestrator::translator::{NoopTranslator, Translator};
use rag_orchestrator::{AgentRetrievalConfig, ClientCache, QueryOrchestrator};
use serde_json::Value;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use warp::http::StatusCode;
use warp::Filter;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

/// Local HTTP server answering every POST with a canned reply.
pub struct FakeKb {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeKb {
    pub async fn start(status: u16, reply: Value, delay: Duration) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = requests.clone();

        let route = warp::post()
            .and(warp::path::full())
            .and(warp::header::optional::<String>("authorization"))
            .and(warp::body::json())
            .and_then(move |path: warp::path::FullPath, authorization: Option<String>, body: Value| {
                let recorded = recorded.clone();
                let reply = reply.clone();
                async move {
                    recorded.lock().unwrap().push(Recorded {
                        path: path.as_str().to_string(),
                        authorization,
                        body,
                    });
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    Ok::<_, Infallible>(warp::reply::with_status(
                        warp::reply::json(&reply),
                        StatusCode::from_u16(status).unwrap(),
                    ))
                }
            });

        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        Self {
            base_url: format!("http://{}", addr),
            requests,
        }
    }

    pub async fn ok(reply: Value) -> Self {
        Self::start(200, reply, Duration::ZERO).await
    }

    pub fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    /// Base URL the legacy protocol is selected for.
    pub fn legacy_url(&self) -> String {
        format!("{}/Dify/v1/chat-messages", self.base_url)
    }
}

pub fn agent(agent_id: &str, base_url: &str, token: &str) -> AgentRetrievalConfig {
    AgentRetrievalConfig {
        agent_id: agent_id.to_string(),
        enabled: true,
        base_url: base_url.to_string(),
        token: token.to_string(),
        timeout_seconds: 5,
        max_retries: 0,
    }
}

pub fn orchestrator(resolver: Arc<StaticConfigResolver>, deadline: Duration) -> QueryOrchestrator {
    orchestrator_with(resolver, Arc::new(NoopTranslator), deadline)
}

pub fn orchestrator_with(
    resolver: Arc<StaticConfigResolver>,
    translator: Arc<dyn Translator>,
    deadline: Duration,
) -> QueryOrchestrator {
    let cache = Arc::new(ClientCache::new(resolver, reqwest::Client::new()));
    QueryOrchestrator::new(cache, translator, Arc::new(Metrics::new().unwrap()))
        .with_deadline(deadline)
}
