use std::sync::Arc;

use crate::candidates::CandidateStore;
use crate::config::Config;
use crate::embedding::EmbeddingProvider;
use crate::ranking::RankingEngine;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: CandidateStore,
    /// Used at ingestion time; the engine holds its own handle for ranking.
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub engine: Arc<RankingEngine>,
}
