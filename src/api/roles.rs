//! Role management endpoints (admin only; enforced by route layer)

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::api::middleware::AppState;
use crate::api::response::ApiResponse;
use crate::models::Role;

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchRolesQuery {
    #[serde(default)]
    pub name: String,
}

/// GET /roles
pub async fn list_roles(State(state): State<AppState>) -> ApiResponse<Vec<Role>> {
    match state.role_service.list().await {
        Ok(roles) => ApiResponse::ok(roles),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}

/// GET /roles/{id}
pub async fn get_role(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResponse<Role> {
    match state.role_service.get_by_id(id).await {
        Ok(role) => ApiResponse::ok(role),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}

/// GET /roles/search?name=
pub async fn search_roles(
    State(state): State<AppState>,
    Query(query): Query<SearchRolesQuery>,
) -> ApiResponse<Vec<Role>> {
    match state.role_service.search(&query.name).await {
        Ok(roles) => ApiResponse::ok(roles),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}

/// POST /roles
pub async fn create_role(
    State(state): State<AppState>,
    Json(body): Json<RoleRequest>,
) -> ApiResponse<Role> {
    match state.role_service.create(&body.name).await {
        Ok(role) => ApiResponse::created(role),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}

/// PUT /roles/{id}
pub async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<RoleRequest>,
) -> ApiResponse<Role> {
    match state.role_service.update(id, &body.name).await {
        Ok(role) => ApiResponse::ok(role),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}

/// DELETE /roles/{id}
pub async fn delete_role(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResponse<()> {
    match state.role_service.delete(id).await {
        Ok(()) => ApiResponse::ok(()),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}
