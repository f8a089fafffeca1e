//! User management endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::api::middleware::{AppState, AuthenticatedUser};
use crate::api::response::ApiResponse;
use crate::models::{UpdateUserInput, User};
use crate::services::user::RegisterInput;

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: String,
}

/// POST /users — public registration
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterInput>,
) -> ApiResponse<User> {
    match state.user_service.register(body).await {
        Ok(user) => ApiResponse::created(user),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}

/// POST /users/admin — administrator bootstrap; locks once one exists
pub async fn register_admin(
    State(state): State<AppState>,
    Json(body): Json<RegisterInput>,
) -> ApiResponse<User> {
    match state.user_service.register_admin(body).await {
        Ok(user) => ApiResponse::created(user),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}

/// GET /users?search=
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> ApiResponse<Vec<User>> {
    match state.user_service.list(query.search.as_deref()).await {
        Ok(users) => ApiResponse::ok(users),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}

/// GET /users/me
pub async fn current_user(AuthenticatedUser(user): AuthenticatedUser) -> ApiResponse<User> {
    ApiResponse::ok(user)
}

/// GET /users/{id}
pub async fn get_user(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResponse<User> {
    match state.user_service.get_by_id(id).await {
        Ok(user) => ApiResponse::ok(user),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}

/// PUT /users/{id} — self-service or admin.
///
/// Only administrators may change someone else's account or any role.
pub async fn update_user(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateUserInput>,
) -> ApiResponse<User> {
    if actor.id != id && !actor.is_admin() {
        return ApiResponse::fail(
            403,
            vec!["You can only update your own account".to_string()],
        );
    }
    if body.role.is_some() && !actor.is_admin() {
        return ApiResponse::fail(
            403,
            vec!["Only administrators can change roles".to_string()],
        );
    }
    match state.user_service.update(id, body).await {
        Ok(user) => ApiResponse::ok(user),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}

/// PUT /users/{id}/role — admin only (enforced by route layer)
pub async fn change_role(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ChangeRoleRequest>,
) -> ApiResponse<User> {
    match state.user_service.change_role(id, &body.role).await {
        Ok(user) => ApiResponse::ok(user),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}

/// DELETE /users/{id} — admin only (enforced by route layer)
pub async fn delete_user(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResponse<()> {
    match state.user_service.delete(id).await {
        Ok(()) => ApiResponse::ok(()),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}
