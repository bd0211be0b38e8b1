//! API endpoints for the panel layout.

use axum::{extract::State, http::StatusCode, Json};

use crate::store::Layout;
use crate::web::AppState;

/// Get the saved panel layout.
pub async fn get_layout(State(state): State<AppState>) -> Result<Json<Layout>, StatusCode> {
    let layout = state
        .store
        .get_layout()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(layout))
}

/// Save the panel layout.
pub async fn update_layout(
    State(state): State<AppState>,
    Json(payload): Json<Layout>,
) -> Result<StatusCode, StatusCode> {
    state
        .store
        .update_layout(payload)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(StatusCode::NO_CONTENT)
}
