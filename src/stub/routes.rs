use super::handlers;
use super::state::StubState;
use crate::api::Endpoint;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the stub router with all backend routes
pub fn create_router(state: StubState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Text path
        .route(Endpoint::ValidateText.path(), post(handlers::validate_text))
        .route(Endpoint::GenerateText.path(), post(handlers::generate_text))
        // Voice path
        .route(Endpoint::ValidateAudio.path(), post(handlers::validate_audio))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
