//! Route definitions for the web server.

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::{api, AppState};

/// Create the API router.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        // Queues
        .route("/queues", get(api::list_queues).post(api::create_queue))
        .route(
            "/queues/:id",
            get(api::get_queue)
                .patch(api::update_queue)
                .delete(api::delete_queue),
        )
        .route("/queues/:id/toggle", post(api::toggle_queue))
        .route("/queues/:id/clear", post(api::clear_queue))
        .route("/queues/:id/roll", post(api::roll_viewers))
        .route("/queues/:id/viewers", post(api::add_viewer))
        .route("/queues/:id/viewers/:viewer_id", delete(api::remove_viewer))
        .route("/queues/:id/viewers/:viewer_id/roll", post(api::roll_viewer))
        // Layout
        .route("/layout", get(api::get_layout).put(api::update_layout))
        // Chat
        .route("/chat", post(api::inject_chat))
        .route("/events", get(api::stream_events))
}

/// Create the full app router.
pub fn create_app_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", create_api_router())
        .route("/health", get(health_check))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
