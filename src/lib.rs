pub mod config;
pub mod db;
pub mod exam;
pub mod logging;
pub mod response;
pub mod routes;
pub mod seed;
pub mod state;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Full application router with request tracing and permissive CORS.
pub fn app_with_state(state: AppState) -> axum::Router {
    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
