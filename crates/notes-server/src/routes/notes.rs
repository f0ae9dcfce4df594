//! Note CRUD routes.
//!
//! - GET /notes - List the caller's notes (search + pagination)
//! - POST /notes - Create a note
//! - GET /notes/{id} - Fetch one note
//! - PUT /notes/{id} - Partially update a note
//! - DELETE /notes/{id} - Delete a note
//!
//! Every route requires a bearer token; notes belonging to other users are
//! reported as not found.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};

use notes_core::{NoteId, NoteResponse, serialize, validate_create, validate_update};

use crate::error::{ApiError, ApiResult};
use crate::extract::{AuthenticatedUser, JsonBody};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for GET /notes.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Case-insensitive search text.
    #[serde(default, alias = "search")]
    pub query: Option<String>,
    /// 1-based page number.
    #[serde(default)]
    pub page: Option<i64>,
    /// Items per page.
    #[serde(default)]
    pub page_size: Option<i64>,
}

/// Response for GET /notes.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListNotesResponse {
    pub items: Vec<NoteResponse>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /notes
async fn list_notes(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<ListNotesResponse>> {
    let Query(params) = params.map_err(|e| ApiError::InvalidPagination(e.body_text()))?;

    let page = state
        .service()
        .list(
            &user.user_id,
            params.query.as_deref(),
            params.page,
            params.page_size,
        )
        .await?;

    Ok(Json(ListNotesResponse {
        items: page.items.iter().map(serialize).collect(),
        total: page.total,
        page: page.page,
        page_size: page.page_size,
        total_pages: page.total_pages(),
    }))
}

/// POST /notes
async fn create_note(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    JsonBody(body): JsonBody,
) -> ApiResult<(StatusCode, Json<NoteResponse>)> {
    let valid = validate_create(&body)?;
    let note = state.service().create(&user.user_id, &valid).await?;
    Ok((StatusCode::CREATED, Json(serialize(&note))))
}

/// GET /notes/{id}
async fn get_note(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<Json<NoteResponse>> {
    let note = state
        .service()
        .get(&user.user_id, &NoteId::new(id))
        .await?;
    Ok(Json(serialize(&note)))
}

/// PUT /notes/{id}
async fn update_note(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<Json<NoteResponse>> {
    let patch = validate_update(&body)?;
    let note = state
        .service()
        .update(&user.user_id, &NoteId::new(id), &patch)
        .await?;
    Ok(Json(serialize(&note)))
}

/// DELETE /notes/{id}
async fn delete_note(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .service()
        .delete(&user.user_id, &NoteId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Build note routes, relative to the API prefix.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notes", get(list_notes).post(create_note))
        .route(
            "/notes/{id}",
            get(get_note).put(update_note).delete(delete_note),
        )
}
