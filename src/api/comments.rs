//! Comment endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::api::middleware::{AppState, AuthenticatedUser};
use crate::api::response::ApiResponse;
use crate::models::{CommentWithAuthor, CreateCommentInput};

#[derive(Debug, Deserialize)]
pub struct ListCommentsQuery {
    pub count: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub message: String,
}

/// GET /comments/{id}
pub async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResponse<CommentWithAuthor> {
    match state.comment_service.get_by_id(id).await {
        Ok(comment) => ApiResponse::ok(comment),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}

/// GET /comments/article/{article_id}?count=
pub async fn comments_for_article(
    State(state): State<AppState>,
    Path(article_id): Path<i64>,
    Query(query): Query<ListCommentsQuery>,
) -> ApiResponse<Vec<CommentWithAuthor>> {
    match state.comment_service.list(article_id, query.count).await {
        Ok(comments) => ApiResponse::ok(comments),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}

/// POST /comments
pub async fn create_comment(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(body): Json<CreateCommentInput>,
) -> ApiResponse<CommentWithAuthor> {
    match state.comment_service.create(body, user.id).await {
        Ok(comment) => ApiResponse::created(comment),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}

/// PUT /comments/{id}
pub async fn update_comment(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateCommentRequest>,
) -> ApiResponse<CommentWithAuthor> {
    match state.comment_service.update(id, &body.message, &user).await {
        Ok(comment) => ApiResponse::ok(comment),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}

/// DELETE /comments/{id}
pub async fn delete_comment(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> ApiResponse<()> {
    match state.comment_service.delete(id, &user).await {
        Ok(()) => ApiResponse::ok(()),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}
