use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Recording control
        .route("/recorder/status", get(handlers::get_status))
        .route("/recorder/start", post(handlers::start_recording))
        .route("/recorder/stop", post(handlers::stop_recording))
        .route("/recorder/toggle", post(handlers::toggle_recording))
        // Output
        .route("/recorder/download", get(handlers::download_recording))
        .route("/recorder/export", post(handlers::export_recording))
        .route("/recorder/reset", post(handlers::reset_recording))
        // Selector
        .route(
            "/recorder/mode",
            get(handlers::get_mode).put(handlers::set_mode),
        )
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
