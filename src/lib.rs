//! Offline mirror for the anime offline database.
//!
//! Keeps a local copy of the dataset in step with the remote revision,
//! serves an update-aware caching proxy, and drives an incremental,
//! paginated query feed over an external search engine.

pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod feed;
pub mod interceptor;
pub mod models;
pub mod remote;
pub mod sync;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use interceptor::Interceptor;
use sync::DatasetSynchronizer;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub synchronizer: Arc<DatasetSynchronizer>,
    pub interceptor: Arc<Interceptor>,
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new().route("/dataset/status", get(api::get_dataset_status));

    Router::new()
        .route("/fetch", get(api::intercept))
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
