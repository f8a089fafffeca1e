//! API layer - HTTP handlers and routing
//!
//! Route groups:
//! - public: reads, registration, login
//! - protected: writes by any authenticated user
//! - admin: role management and destructive account/tag operations

pub mod articles;
pub mod auth;
pub mod comments;
pub mod middleware;
pub mod response;
pub mod roles;
pub mod tags;
pub mod users;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use middleware::{AppState, AuthenticatedUser};
pub use response::ApiResponse;

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need admin role)
    let admin_routes = Router::new()
        .route("/users/{id}/role", put(users::change_role))
        .route("/users/{id}", delete(users::delete_user))
        .route("/roles", get(roles::list_roles))
        .route("/roles", post(roles::create_role))
        .route("/roles/search", get(roles::search_roles))
        .route("/roles/{id}", get(roles::get_role))
        .route("/roles/{id}", put(roles::update_role))
        .route("/roles/{id}", delete(roles::delete_role))
        .route("/tags/{id}", delete(tags::delete_tag))
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (need auth but not admin)
    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/profile", get(auth::profile))
        .route("/users/me", get(users::current_user))
        .route("/users/{id}", put(users::update_user))
        .route("/articles", post(articles::create_article))
        .route("/articles/{id}", put(articles::update_article))
        .route("/articles/{id}", delete(articles::delete_article))
        .route("/tags", post(tags::create_tag))
        .route("/tags/{id}", put(tags::update_tag))
        .route("/comments", post(comments::create_comment))
        .route("/comments/{id}", put(comments::update_comment))
        .route("/comments/{id}", delete(comments::delete_comment))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/users", post(users::register))
        .route("/users/admin", post(users::register_admin))
        .route("/users", get(users::list_users))
        .route("/users/{id}", get(users::get_user))
        .route("/articles", get(articles::list_articles))
        .route(
            "/articles/latest/{start}/{count}",
            get(articles::latest_articles),
        )
        .route("/articles/{id}", get(articles::get_article))
        .route(
            "/articles/author/{author_id}",
            get(articles::articles_by_author),
        )
        .route("/tags", get(tags::list_tags))
        .route("/tags/{id}", get(tags::get_tag))
        .route("/comments/{id}", get(comments::get_comment))
        .route(
            "/comments/article/{article_id}",
            get(comments::comments_for_article),
        )
        .merge(admin_routes)
        .merge(protected_routes)
}

/// Build the complete router with CORS and request tracing
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
            .allow_credentials(true),
        Err(_) => CorsLayer::new(),
    };

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
