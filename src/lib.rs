//! CMS backend: blog posts, sectioned articles, a category taxonomy and an
//! image-upload passthrough, served over a JSON HTTP API backed by SQLite.

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use state::AppState;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// The complete application with request tracing and permissive CORS.
pub fn app(state: AppState) -> Router {
    routes::routes::routes()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
