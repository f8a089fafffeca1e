//! Server-rendered front-end
//!
//! A thin application that talks to the JSON API over HTTP and renders
//! tera templates. Sessions are relayed as-is: the browser's session
//! cookie is forwarded to the API, and login/logout pass the API's
//! Set-Cookie header back to the browser.

pub mod client;
pub mod pages;

use axum::{
    routing::{get, post},
    Router,
};

pub use client::{ApiClient, ClientError};
pub use pages::{build_templates, WebState};

/// Build the front-end router
pub fn build_web_router(state: WebState) -> Router {
    Router::new()
        .route("/", get(pages::home))
        .route("/login", get(pages::login_form).post(pages::login_submit))
        .route("/logout", post(pages::logout))
        .route(
            "/register",
            get(pages::register_form).post(pages::register_submit),
        )
        .route(
            "/articles/new",
            get(pages::new_article_form).post(pages::create_article),
        )
        .route("/articles/{id}", get(pages::article_page))
        .route(
            "/articles/{id}/edit",
            get(pages::edit_article_form).post(pages::update_article),
        )
        .route("/articles/{id}/delete", post(pages::delete_article))
        .route("/articles/{id}/comments", post(pages::post_comment))
        .route("/tags", get(pages::tags_page).post(pages::create_tag))
        .route("/tags/{id}/delete", post(pages::delete_tag))
        .route("/users", get(pages::users_page))
        .route("/users/{id}/delete", post(pages::delete_user))
        .route("/roles", get(pages::roles_page).post(pages::create_role))
        .route("/roles/{id}/delete", post(pages::delete_role))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
