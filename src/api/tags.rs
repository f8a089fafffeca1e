//! Tag endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::api::middleware::{AppState, AuthenticatedUser};
use crate::api::response::ApiResponse;
use crate::models::{CreateTagInput, Tag, UpdateTagInput};

#[derive(Debug, Deserialize)]
pub struct ListTagsQuery {
    pub name: Option<String>,
}

/// GET /tags?name=
pub async fn list_tags(
    State(state): State<AppState>,
    Query(query): Query<ListTagsQuery>,
) -> ApiResponse<Vec<Tag>> {
    match state.tag_service.find(query.name.as_deref()).await {
        Ok(tags) => ApiResponse::ok(tags),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}

/// GET /tags/{id}
pub async fn get_tag(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResponse<Tag> {
    match state.tag_service.get_by_id(id).await {
        Ok(tag) => ApiResponse::ok(tag),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}

/// POST /tags
pub async fn create_tag(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(body): Json<CreateTagInput>,
) -> ApiResponse<Tag> {
    match state.tag_service.create(body, user.id).await {
        Ok(tag) => ApiResponse::created(tag),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}

/// PUT /tags/{id}
pub async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateTagInput>,
) -> ApiResponse<Tag> {
    match state.tag_service.update(id, body).await {
        Ok(tag) => ApiResponse::ok(tag),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}

/// DELETE /tags/{id} — admin only (enforced by route layer)
pub async fn delete_tag(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResponse<()> {
    match state.tag_service.delete(id).await {
        Ok(()) => ApiResponse::ok(()),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}
