//! Article endpoints
//!
//! Reads are public; writes require authentication and are limited to
//! the author or an elevated role by the service layer.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::api::middleware::{AppState, AuthenticatedUser};
use crate::api::response::ApiResponse;
use crate::models::{Article, ArticleDetail, CreateArticleInput, UpdateArticleInput};

#[derive(Debug, Deserialize)]
pub struct ListArticlesQuery {
    pub title: Option<String>,
}

/// GET /articles?title=
pub async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ListArticlesQuery>,
) -> ApiResponse<Vec<Article>> {
    match state.article_service.search(query.title.as_deref()).await {
        Ok(articles) => ApiResponse::ok(articles),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}

/// GET /articles/latest/{start}/{count}
pub async fn latest_articles(
    State(state): State<AppState>,
    Path((start, count)): Path<(i64, i64)>,
) -> ApiResponse<Vec<Article>> {
    match state.article_service.latest(start, count).await {
        Ok(articles) => ApiResponse::ok(articles),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}

/// GET /articles/{id}
pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResponse<ArticleDetail> {
    match state.article_service.get_detail(id).await {
        Ok(detail) => ApiResponse::ok(detail),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}

/// GET /articles/author/{author_id}
pub async fn articles_by_author(
    State(state): State<AppState>,
    Path(author_id): Path<i64>,
) -> ApiResponse<Vec<Article>> {
    match state.article_service.by_author(author_id).await {
        Ok(articles) => ApiResponse::ok(articles),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}

/// POST /articles
pub async fn create_article(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(body): Json<CreateArticleInput>,
) -> ApiResponse<ArticleDetail> {
    match state.article_service.create(body, user.id).await {
        Ok(detail) => ApiResponse::created(detail),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}

/// PUT /articles/{id}
pub async fn update_article(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateArticleInput>,
) -> ApiResponse<ArticleDetail> {
    match state.article_service.update(id, body, &user).await {
        Ok(detail) => ApiResponse::ok(detail),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}

/// DELETE /articles/{id}
pub async fn delete_article(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> ApiResponse<()> {
    match state.article_service.delete(id, &user).await {
        Ok(()) => ApiResponse::ok(()),
        Err(e) => ApiResponse::fail(e.status_code(), vec![e.to_string()]),
    }
}
