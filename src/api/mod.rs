//! API module
//!
//! HTTP API endpoints and middleware.

mod extract;
pub mod middleware;
pub mod routes;
mod state;

use axum::{middleware as axum_middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

pub use routes::create_router;
pub use state::AppState;

/// Build the application router
pub fn app(state: AppState) -> Router {
    // Axum layers run in reverse order: correlation -> logging -> handler
    let api_routes = create_router()
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::correlation_middleware));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
