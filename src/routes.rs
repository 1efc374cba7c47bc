// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{evaluation, system},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Mounts the OMR routes under `/api/omr`.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (config and upstream clients).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let omr_routes = Router::new()
        .route("/compare", post(evaluation::compare_results))
        .route(
            "/evaluate",
            post(evaluation::evaluate_sheet)
                .layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
        );

    Router::new()
        .route("/api/health", get(system::health_check))
        .nest("/api/omr", omr_routes)
        .fallback(system::not_found)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
