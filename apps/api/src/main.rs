mod access;
mod candidates;
mod config;
mod embedding;
mod errors;
mod llm_client;
mod models;
mod ranking;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::candidates::CandidateStore;
use crate::config::Config;
use crate::embedding::init_provider;
use crate::llm_client::LlmClient;
use crate::ranking::{RankingEngine, RankingSettings};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting TalentMatch API v{}", env!("CARGO_PKG_VERSION"));

    // Embedding backend is checked once; an unreachable or mis-sized backend is fatal
    let embedder = init_provider(&config).await?;
    info!(
        "Embedding provider ready ({}, model: {})",
        embedder.name(),
        config.embedding_model
    );

    // Initialize LLM client
    let llm = LlmClient::new(
        config.anthropic_api_key.clone(),
        Duration::from_secs(config.llm_timeout_secs),
        config.llm_max_retries,
    )?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let engine = RankingEngine::new(
        embedder.clone(),
        Arc::new(llm),
        RankingSettings::from_config(&config)?,
    );
    info!("Ranking engine configured: {:?}", engine.settings());

    if config.invitation_codes.is_empty() {
        warn!("INVITATION_CODES is empty; every match request will be denied");
    }

    // Build app state
    let state = AppState {
        config: config.clone(),
        store: CandidateStore::new(),
        embedder,
        engine: Arc::new(engine),
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()), // TODO: restrict CORS origins to the deployed frontend
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
