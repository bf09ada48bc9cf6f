use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::search::SearchOrchestrator;

pub mod handlers;
pub mod models;

pub fn create_router(orchestrator: Arc<SearchOrchestrator>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api/hotels/search", post(handlers::hotel_search_handler))
        .route("/api/flights/search", post(handlers::flight_search_handler))
        .with_state(orchestrator)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
