//! HTTP API

pub mod error;
pub mod health;
pub mod medguide;
pub mod medicines;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/medguide", post(medguide::ask))
        .route("/api/medguide/medicines", get(medicines::list))
        .route("/api/medguide/medicines/search", get(medicines::search))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
