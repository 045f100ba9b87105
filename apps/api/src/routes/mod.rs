pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::candidates::handlers as candidates;
use crate::ranking::handlers as ranking;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/health", get(health::health_handler))
        // Candidate API
        .route(
            "/api/candidates",
            get(candidates::handle_list_candidates)
                .post(candidates::handle_add_candidates)
                .delete(candidates::handle_clear_candidates),
        )
        .route(
            "/api/candidates/upload",
            post(candidates::handle_upload_candidates),
        )
        .route(
            "/api/candidates/:id",
            get(candidates::handle_get_candidate).delete(candidates::handle_delete_candidate),
        )
        // Matching API
        .route(
            "/api/verify-invitation",
            post(ranking::handle_verify_invitation),
        )
        .route("/api/match", post(ranking::handle_match))
        // Replaces axum's 2 MB default; overruns surface as extractor rejections.
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
