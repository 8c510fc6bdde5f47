//! HTTP adapters - Axum routes, handlers, and DTOs.

pub mod interview;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use interview::handlers::InterviewAppState;

/// Builds the full application router.
pub fn app_router(state: InterviewAppState) -> Router {
    interview::routes::interview_router()
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
