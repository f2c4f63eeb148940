// API module - HTTP endpoints

pub mod attendances;
pub mod extract;
pub mod health;
pub mod nfts;
pub mod state;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use state::AppState;

/// Builds the application router with all API routes
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(attendances::router())
        .merge(nfts::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
