//! Application builder: wraps the router in the middleware stack.

use axum::Router;
use axum::middleware as axum_middleware;
use tower_http::trace::TraceLayer;

use crate::middleware::{cors::build_cors_layer, logging::request_logging};
use crate::router::build_router;
use crate::state::AppState;

/// Build the complete application with CORS, tracing, and request logging.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);

    build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(request_logging))
}
