//! Server-rendered pages
//!
//! Every handler fetches from the API through the shared client and
//! renders a tera template. Form posts call the API and redirect on
//! success; failed envelopes render the error page with the API's
//! messages.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tera::{Context, Tera};

use crate::api::middleware::extract_session_token;
use crate::api::response::ApiResponse;
use crate::models::{Article, ArticleDetail, CommentWithAuthor, Role, Tag, User};
use crate::web::client::ApiClient;

/// Articles per page on the front page
const PAGE_SIZE: i64 = 10;

/// Shared state for the web application
#[derive(Clone)]
pub struct WebState {
    pub client: Arc<ApiClient>,
    pub tera: Arc<Tera>,
}

/// Compile the embedded templates
pub fn build_templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("base.html", include_str!("../../templates/web/base.html")),
        ("home.html", include_str!("../../templates/web/home.html")),
        ("article.html", include_str!("../../templates/web/article.html")),
        (
            "article_form.html",
            include_str!("../../templates/web/article_form.html"),
        ),
        ("login.html", include_str!("../../templates/web/login.html")),
        (
            "register.html",
            include_str!("../../templates/web/register.html"),
        ),
        ("tags.html", include_str!("../../templates/web/tags.html")),
        ("users.html", include_str!("../../templates/web/users.html")),
        ("roles.html", include_str!("../../templates/web/roles.html")),
        ("error.html", include_str!("../../templates/web/error.html")),
    ])?;
    Ok(tera)
}

fn session_from(headers: &HeaderMap) -> Option<String> {
    extract_session_token(headers)
}

async fn current_user(state: &WebState, session: Option<&str>) -> Option<User> {
    let token = session?;
    match state.client.get::<User>("/users/me", Some(token)).await {
        Ok(envelope) if envelope.success => envelope.data,
        _ => None,
    }
}

fn render(state: &WebState, template: &str, context: &Context) -> Response {
    match state.tera.render(template, context) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Template rendering failed for {}: {}", template, e);
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Template rendering failed",
            )
                .into_response()
        }
    }
}

fn error_page(state: &WebState, user: Option<&User>, errors: Vec<String>) -> Response {
    let mut ctx = Context::new();
    ctx.insert("errors", &errors);
    if let Some(user) = user {
        ctx.insert("user", user);
    }
    render(state, "error.html", &ctx)
}

fn client_error(state: &WebState, user: Option<&User>, error: impl ToString) -> Response {
    error_page(state, user, vec![error.to_string()])
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

// Home and article pages

#[derive(Debug, Deserialize)]
pub struct HomeQuery {
    pub page: Option<i64>,
}

/// GET /
pub async fn home(
    State(state): State<WebState>,
    headers: HeaderMap,
    Query(query): Query<HomeQuery>,
) -> Response {
    let session = session_from(&headers);
    let user = current_user(&state, session.as_deref()).await;

    let page = query.page.unwrap_or(1).max(1);
    let start = (page - 1) * PAGE_SIZE;

    // Fetch one extra row to know whether an older page exists
    let path = format!("/articles/latest/{}/{}", start, PAGE_SIZE + 1);
    let envelope: ApiResponse<Vec<Article>> =
        match state.client.get(&path, session.as_deref()).await {
            Ok(envelope) => envelope,
            Err(e) => return client_error(&state, user.as_ref(), e),
        };

    if !envelope.success {
        return error_page(&state, user.as_ref(), envelope.errors);
    }

    let mut articles = envelope.data.unwrap_or_default();
    let has_more = articles.len() as i64 > PAGE_SIZE;
    articles.truncate(PAGE_SIZE as usize);

    let mut ctx = Context::new();
    ctx.insert("articles", &articles);
    ctx.insert("page", &page);
    ctx.insert("has_more", &has_more);
    if let Some(ref user) = user {
        ctx.insert("user", user);
    }
    render(&state, "home.html", &ctx)
}

/// GET /articles/{id}
pub async fn article_page(
    State(state): State<WebState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let session = session_from(&headers);
    let user = current_user(&state, session.as_deref()).await;

    let article: ApiResponse<ArticleDetail> = match state
        .client
        .get(&format!("/articles/{}", id), session.as_deref())
        .await
    {
        Ok(envelope) => envelope,
        Err(e) => return client_error(&state, user.as_ref(), e),
    };
    let Some(detail) = article.data else {
        return error_page(&state, user.as_ref(), article.errors);
    };

    let comments: ApiResponse<Vec<CommentWithAuthor>> = match state
        .client
        .get(&format!("/comments/article/{}", id), session.as_deref())
        .await
    {
        Ok(envelope) => envelope,
        Err(e) => return client_error(&state, user.as_ref(), e),
    };

    let mut ctx = Context::new();
    ctx.insert("article", &detail);
    ctx.insert("comments", &comments.data.unwrap_or_default());
    if let Some(ref user) = user {
        ctx.insert("user", user);
    }
    render(&state, "article.html", &ctx)
}

#[derive(Debug, Deserialize)]
pub struct ArticleForm {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub content: String,
    #[serde(default)]
    pub tags: String,
}

/// GET /articles/new
pub async fn new_article_form(State(state): State<WebState>, headers: HeaderMap) -> Response {
    let session = session_from(&headers);
    let Some(user) = current_user(&state, session.as_deref()).await else {
        return Redirect::to("/login").into_response();
    };

    let mut ctx = Context::new();
    ctx.insert("user", &user);
    ctx.insert("tag_names", "");
    render(&state, "article_form.html", &ctx)
}

/// POST /articles/new
pub async fn create_article(
    State(state): State<WebState>,
    headers: HeaderMap,
    Form(form): Form<ArticleForm>,
) -> Response {
    let session = session_from(&headers);
    let user = current_user(&state, session.as_deref()).await;

    let body = json!({
        "title": form.title,
        "description": form.description,
        "content": form.content,
        "tags": split_tags(&form.tags),
    });

    let envelope: ApiResponse<ArticleDetail> = match state
        .client
        .post("/articles", &body, session.as_deref())
        .await
    {
        Ok(envelope) => envelope,
        Err(e) => return client_error(&state, user.as_ref(), e),
    };

    match envelope.data {
        Some(detail) if envelope.success => {
            Redirect::to(&format!("/articles/{}", detail.article.id)).into_response()
        }
        _ => error_page(&state, user.as_ref(), envelope.errors),
    }
}

/// GET /articles/{id}/edit
pub async fn edit_article_form(
    State(state): State<WebState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let session = session_from(&headers);
    let Some(user) = current_user(&state, session.as_deref()).await else {
        return Redirect::to("/login").into_response();
    };

    let envelope: ApiResponse<ArticleDetail> = match state
        .client
        .get(&format!("/articles/{}", id), session.as_deref())
        .await
    {
        Ok(envelope) => envelope,
        Err(e) => return client_error(&state, Some(&user), e),
    };
    let Some(detail) = envelope.data else {
        return error_page(&state, Some(&user), envelope.errors);
    };

    let tag_names = detail
        .tags
        .iter()
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let mut ctx = Context::new();
    ctx.insert("user", &user);
    ctx.insert("article", &detail);
    ctx.insert("tag_names", &tag_names);
    render(&state, "article_form.html", &ctx)
}

/// POST /articles/{id}/edit
pub async fn update_article(
    State(state): State<WebState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Form(form): Form<ArticleForm>,
) -> Response {
    let session = session_from(&headers);
    let user = current_user(&state, session.as_deref()).await;

    let body = json!({
        "title": form.title,
        "description": form.description,
        "content": form.content,
        "tags": split_tags(&form.tags),
    });

    let envelope: ApiResponse<ArticleDetail> = match state
        .client
        .put(&format!("/articles/{}", id), &body, session.as_deref())
        .await
    {
        Ok(envelope) => envelope,
        Err(e) => return client_error(&state, user.as_ref(), e),
    };

    if envelope.success {
        Redirect::to(&format!("/articles/{}", id)).into_response()
    } else {
        error_page(&state, user.as_ref(), envelope.errors)
    }
}

/// POST /articles/{id}/delete
pub async fn delete_article(
    State(state): State<WebState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let session = session_from(&headers);
    let user = current_user(&state, session.as_deref()).await;

    let envelope: ApiResponse<()> = match state
        .client
        .delete(&format!("/articles/{}", id), session.as_deref())
        .await
    {
        Ok(envelope) => envelope,
        Err(e) => return client_error(&state, user.as_ref(), e),
    };

    if envelope.success {
        Redirect::to("/").into_response()
    } else {
        error_page(&state, user.as_ref(), envelope.errors)
    }
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    pub message: String,
}

/// POST /articles/{id}/comments
pub async fn post_comment(
    State(state): State<WebState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Form(form): Form<CommentForm>,
) -> Response {
    let session = session_from(&headers);
    let user = current_user(&state, session.as_deref()).await;

    let body = json!({ "article_id": id, "message": form.message });
    let envelope: ApiResponse<CommentWithAuthor> = match state
        .client
        .post("/comments", &body, session.as_deref())
        .await
    {
        Ok(envelope) => envelope,
        Err(e) => return client_error(&state, user.as_ref(), e),
    };

    if envelope.success {
        Redirect::to(&format!("/articles/{}", id)).into_response()
    } else {
        error_page(&state, user.as_ref(), envelope.errors)
    }
}

// Authentication pages

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// GET /login
pub async fn login_form(State(state): State<WebState>) -> Response {
    render(&state, "login.html", &Context::new())
}

/// POST /login
pub async fn login_submit(
    State(state): State<WebState>,
    Form(form): Form<LoginForm>,
) -> Response {
    let body = json!({ "email": form.email, "password": form.password });
    let result = state
        .client
        .post_capturing_cookie::<_, serde_json::Value>("/auth/login", &body, None)
        .await;

    let (envelope, set_cookie) = match result {
        Ok(pair) => pair,
        Err(e) => return client_error(&state, None, e),
    };

    if !envelope.success {
        let mut ctx = Context::new();
        ctx.insert("errors", &envelope.errors);
        return render(&state, "login.html", &ctx);
    }

    let mut response = Redirect::to("/").into_response();
    if let Some(cookie) = set_cookie {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
    }
    response
}

/// POST /logout
pub async fn logout(State(state): State<WebState>, headers: HeaderMap) -> Response {
    let session = session_from(&headers);
    let result = state
        .client
        .post_capturing_cookie::<_, serde_json::Value>(
            "/auth/logout",
            &json!({}),
            session.as_deref(),
        )
        .await;

    let mut response = Redirect::to("/").into_response();
    if let Ok((_, Some(cookie))) = result {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
    }
    response
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// GET /register
pub async fn register_form(State(state): State<WebState>) -> Response {
    render(&state, "register.html", &Context::new())
}

/// POST /register
pub async fn register_submit(
    State(state): State<WebState>,
    Form(form): Form<RegisterForm>,
) -> Response {
    let mut body = json!({
        "username": form.username,
        "email": form.email,
        "password": form.password,
    });
    if !form.first_name.is_empty() {
        body["first_name"] = json!(form.first_name);
    }
    if !form.last_name.is_empty() {
        body["last_name"] = json!(form.last_name);
    }

    let envelope: ApiResponse<User> = match state.client.post("/users", &body, None).await {
        Ok(envelope) => envelope,
        Err(e) => return client_error(&state, None, e),
    };

    if envelope.success {
        Redirect::to("/login").into_response()
    } else {
        let mut ctx = Context::new();
        ctx.insert("errors", &envelope.errors);
        render(&state, "register.html", &ctx)
    }
}

// Tag pages

#[derive(Debug, Deserialize)]
pub struct TagForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// GET /tags
pub async fn tags_page(State(state): State<WebState>, headers: HeaderMap) -> Response {
    let session = session_from(&headers);
    let user = current_user(&state, session.as_deref()).await;

    let envelope: ApiResponse<Vec<Tag>> =
        match state.client.get("/tags", session.as_deref()).await {
            Ok(envelope) => envelope,
            Err(e) => return client_error(&state, user.as_ref(), e),
        };
    if !envelope.success {
        return error_page(&state, user.as_ref(), envelope.errors);
    }

    let mut ctx = Context::new();
    ctx.insert("tags", &envelope.data.unwrap_or_default());
    if let Some(ref user) = user {
        ctx.insert("user", user);
    }
    render(&state, "tags.html", &ctx)
}

/// POST /tags
pub async fn create_tag(
    State(state): State<WebState>,
    headers: HeaderMap,
    Form(form): Form<TagForm>,
) -> Response {
    let session = session_from(&headers);
    let user = current_user(&state, session.as_deref()).await;

    let body = json!({ "name": form.name, "description": form.description });
    let envelope: ApiResponse<Tag> =
        match state.client.post("/tags", &body, session.as_deref()).await {
            Ok(envelope) => envelope,
            Err(e) => return client_error(&state, user.as_ref(), e),
        };

    if envelope.success {
        Redirect::to("/tags").into_response()
    } else {
        error_page(&state, user.as_ref(), envelope.errors)
    }
}

/// POST /tags/{id}/delete
pub async fn delete_tag(
    State(state): State<WebState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let session = session_from(&headers);
    let user = current_user(&state, session.as_deref()).await;

    let envelope: ApiResponse<()> = match state
        .client
        .delete(&format!("/tags/{}", id), session.as_deref())
        .await
    {
        Ok(envelope) => envelope,
        Err(e) => return client_error(&state, user.as_ref(), e),
    };

    if envelope.success {
        Redirect::to("/tags").into_response()
    } else {
        error_page(&state, user.as_ref(), envelope.errors)
    }
}

// User and role administration pages

#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    pub search: Option<String>,
}

/// GET /users
pub async fn users_page(
    State(state): State<WebState>,
    headers: HeaderMap,
    Query(query): Query<UsersQuery>,
) -> Response {
    let session = session_from(&headers);
    let Some(user) = current_user(&state, session.as_deref()).await else {
        return Redirect::to("/login").into_response();
    };

    let search = query.search.unwrap_or_default();
    let path = if search.is_empty() {
        "/users".to_string()
    } else {
        format!("/users?search={}", search)
    };

    let envelope: ApiResponse<Vec<User>> =
        match state.client.get(&path, session.as_deref()).await {
            Ok(envelope) => envelope,
            Err(e) => return client_error(&state, Some(&user), e),
        };
    if !envelope.success {
        return error_page(&state, Some(&user), envelope.errors);
    }

    let mut ctx = Context::new();
    ctx.insert("users", &envelope.data.unwrap_or_default());
    ctx.insert("search", &search);
    ctx.insert("user", &user);
    render(&state, "users.html", &ctx)
}

/// POST /users/{id}/delete
pub async fn delete_user(
    State(state): State<WebState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let session = session_from(&headers);
    let user = current_user(&state, session.as_deref()).await;

    let envelope: ApiResponse<()> = match state
        .client
        .delete(&format!("/users/{}", id), session.as_deref())
        .await
    {
        Ok(envelope) => envelope,
        Err(e) => return client_error(&state, user.as_ref(), e),
    };

    if envelope.success {
        Redirect::to("/users").into_response()
    } else {
        error_page(&state, user.as_ref(), envelope.errors)
    }
}

#[derive(Debug, Deserialize)]
pub struct RoleForm {
    pub name: String,
}

/// GET /roles
pub async fn roles_page(State(state): State<WebState>, headers: HeaderMap) -> Response {
    let session = session_from(&headers);
    let Some(user) = current_user(&state, session.as_deref()).await else {
        return Redirect::to("/login").into_response();
    };

    let envelope: ApiResponse<Vec<Role>> =
        match state.client.get("/roles", session.as_deref()).await {
            Ok(envelope) => envelope,
            Err(e) => return client_error(&state, Some(&user), e),
        };
    if !envelope.success {
        return error_page(&state, Some(&user), envelope.errors);
    }

    let mut ctx = Context::new();
    ctx.insert("roles", &envelope.data.unwrap_or_default());
    ctx.insert("user", &user);
    render(&state, "roles.html", &ctx)
}

/// POST /roles
pub async fn create_role(
    State(state): State<WebState>,
    headers: HeaderMap,
    Form(form): Form<RoleForm>,
) -> Response {
    let session = session_from(&headers);
    let user = current_user(&state, session.as_deref()).await;

    let body = json!({ "name": form.name });
    let envelope: ApiResponse<Role> =
        match state.client.post("/roles", &body, session.as_deref()).await {
            Ok(envelope) => envelope,
            Err(e) => return client_error(&state, user.as_ref(), e),
        };

    if envelope.success {
        Redirect::to("/roles").into_response()
    } else {
        error_page(&state, user.as_ref(), envelope.errors)
    }
}

/// POST /roles/{id}/delete
pub async fn delete_role(
    State(state): State<WebState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let session = session_from(&headers);
    let user = current_user(&state, session.as_deref()).await;

    let envelope: ApiResponse<()> = match state
        .client
        .delete(&format!("/roles/{}", id), session.as_deref())
        .await
    {
        Ok(envelope) => envelope,
        Err(e) => return client_error(&state, user.as_ref(), e),
    };

    if envelope.success {
        Redirect::to("/roles").into_response()
    } else {
        error_page(&state, user.as_ref(), envelope.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_compile() {
        let tera = build_templates().expect("Templates should compile");
        let names: Vec<&str> = tera.get_template_names().collect();
        assert!(names.contains(&"base.html"));
        assert!(names.contains(&"home.html"));
        assert!(names.contains(&"error.html"));
    }

    #[test]
    fn test_error_template_renders() {
        let tera = build_templates().expect("Templates should compile");
        let mut ctx = Context::new();
        ctx.insert("errors", &vec!["something broke".to_string()]);
        let html = tera.render("error.html", &ctx).expect("Render failed");
        assert!(html.contains("something broke"));
    }

    #[test]
    fn test_split_tags() {
        assert_eq!(split_tags("rust, web ,"), vec!["rust", "web"]);
        assert!(split_tags("").is_empty());
        assert!(split_tags("  ,  ").is_empty());
    }
}
