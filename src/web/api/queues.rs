//! API endpoints for queues.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::store::{QueueKind, QueueViewer, ViewerQueue};
use crate::web::AppState;

/// Create queue request.
#[derive(Deserialize)]
pub struct CreateQueueRequest {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: QueueKind,
    #[serde(default)]
    pub open: bool,
}

/// Update queue request. Absent fields stay unchanged.
#[derive(Deserialize)]
pub struct UpdateQueueRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<QueueKind>,
}

/// Toggle response.
#[derive(Serialize)]
pub struct ToggleResponse {
    pub open: bool,
}

/// Roll request.
#[derive(Deserialize)]
pub struct RollRequest {
    #[serde(default = "default_roll_count")]
    pub count: i64,
}

fn default_roll_count() -> i64 {
    1
}

/// Roll response.
#[derive(Serialize)]
pub struct RollResponse {
    pub viewers: Vec<QueueViewer>,
}

/// Name comparison for the duplicate check: lowercased, whitespace removed.
fn normalized_name(name: &str) -> String {
    name.to_lowercase().split_whitespace().collect()
}

/// List all queues.
pub async fn list_queues(
    State(state): State<AppState>,
) -> Result<Json<HashMap<String, ViewerQueue>>, StatusCode> {
    let queues = state
        .store
        .get_queues()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(queues))
}

/// Get a single queue.
pub async fn get_queue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ViewerQueue>, StatusCode> {
    let queue = state
        .store
        .get_queue(&id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(queue))
}

/// Create a new queue.
///
/// The duplicate-name check is advisory: it stops the obvious mistake in the
/// panel, but the store itself allows duplicate names.
pub async fn create_queue(
    State(state): State<AppState>,
    Json(payload): Json<CreateQueueRequest>,
) -> Result<Json<ViewerQueue>, StatusCode> {
    if payload.name.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let queues = state
        .store
        .get_queues()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let wanted = normalized_name(&payload.name);
    if queues.values().any(|q| normalized_name(&q.name) == wanted) {
        return Err(StatusCode::CONFLICT);
    }

    let queue = state
        .store
        .create_queue(&payload.name, payload.kind, payload.open)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(queue))
}

/// Rename or retype a queue.
pub async fn update_queue(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateQueueRequest>,
) -> Result<Json<ViewerQueue>, StatusCode> {
    if let Some(name) = &payload.name {
        if name.trim().is_empty() {
            return Err(StatusCode::BAD_REQUEST);
        }
        let found = state
            .store
            .rename_queue(&id, name)
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        if !found {
            return Err(StatusCode::NOT_FOUND);
        }
    }

    if let Some(kind) = payload.kind {
        let found = state
            .store
            .retype_queue(&id, kind)
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        if !found {
            return Err(StatusCode::NOT_FOUND);
        }
    }

    let queue = state
        .store
        .get_queue(&id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(queue))
}

/// Delete a queue.
pub async fn delete_queue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let deleted = state
        .store
        .delete_queue(&id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    if !deleted {
        return Err(StatusCode::NOT_FOUND);
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Toggle a queue between open and closed.
pub async fn toggle_queue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ToggleResponse>, StatusCode> {
    let open = state
        .store
        .toggle_queue(&id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(ToggleResponse { open }))
}

/// Remove every viewer from a queue.
pub async fn clear_queue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let cleared = state
        .store
        .clear_queue(&id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    if !cleared {
        return Err(StatusCode::NOT_FOUND);
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Add a viewer to a queue.
pub async fn add_viewer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<QueueViewer>,
) -> Result<StatusCode, StatusCode> {
    let exists = state
        .store
        .get_queue(&id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .is_some();
    if !exists {
        return Err(StatusCode::NOT_FOUND);
    }

    let added = state
        .store
        .add_viewer(&id, payload)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    if !added {
        // Queue exists, so the viewer must already be in it.
        return Err(StatusCode::CONFLICT);
    }

    Ok(StatusCode::CREATED)
}

/// Remove a viewer from a queue.
pub async fn remove_viewer(
    State(state): State<AppState>,
    Path((id, viewer_id)): Path<(String, String)>,
) -> Result<StatusCode, StatusCode> {
    let removed = state
        .store
        .remove_viewer(&id, &viewer_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    if !removed {
        return Err(StatusCode::NOT_FOUND);
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Roll viewers out of a queue by its picking policy. An empty queue rolls
/// an empty list.
pub async fn roll_viewers(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<RollRequest>,
) -> Result<Json<RollResponse>, StatusCode> {
    let exists = state
        .store
        .get_queue(&id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .is_some();
    if !exists {
        return Err(StatusCode::NOT_FOUND);
    }

    let viewers = state
        .store
        .roll_viewers(&id, payload.count)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .unwrap_or_default();

    Ok(Json(RollResponse { viewers }))
}

/// Roll one specific viewer out of a queue.
pub async fn roll_viewer(
    State(state): State<AppState>,
    Path((id, viewer_id)): Path<(String, String)>,
) -> Result<Json<QueueViewer>, StatusCode> {
    let viewer = state
        .store
        .roll_viewer(&id, &viewer_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(viewer))
}
