//! API middleware
//!
//! Session authentication and role-based authorization. Rejections use
//! the same result envelope as every other response.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::api::response::ApiResponse;
use crate::models::User;
use crate::services::{ArticleService, CommentService, RoleService, TagService, UserService};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: crate::db::DynDatabasePool,
    pub user_service: Arc<UserService>,
    pub role_service: Arc<RoleService>,
    pub tag_service: Arc<TagService>,
    pub article_service: Arc<ArticleService>,
    pub comment_service: Arc<CommentService>,
    pub session_expiration_days: i64,
}

/// Authenticated user extracted from the request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiResponse<()>;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiResponse::fail(401, vec!["Authentication required".to_string()]))
    }
}

/// Extract the session token from the Authorization header or the
/// `session` cookie, in that order
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = headers.get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie.strip_prefix("session=") {
                    return Some(token.to_string());
                }
            }
        }
    }

    None
}

/// Authentication middleware: resolves the session token to a user and
/// stores it in the request extensions
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiResponse<()>> {
    let token = extract_session_token(request.headers()).ok_or_else(|| {
        ApiResponse::fail(401, vec!["Missing authentication token".to_string()])
    })?;

    let user = state
        .user_service
        .validate_session(&token)
        .await
        .map_err(|e| ApiResponse::fail(e.status_code(), vec![e.to_string()]))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Admin authorization middleware; must run after `require_auth`
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiResponse<()>> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiResponse::fail(401, vec!["Authentication required".to_string()]))?;

    if !user.0.is_admin() {
        return Err(ApiResponse::fail(
            403,
            vec!["Administrator privileges required".to_string()],
        ));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_bearer_token_takes_precedence() {
        let map = headers(&[
            ("authorization", "Bearer header-token"),
            ("cookie", "session=cookie-token"),
        ]);
        assert_eq!(
            extract_session_token(&map),
            Some("header-token".to_string())
        );
    }

    #[test]
    fn test_session_cookie_among_others() {
        let map = headers(&[("cookie", "theme=dark; session=my-token; locale=en")]);
        assert_eq!(extract_session_token(&map), Some("my-token".to_string()));
    }

    #[test]
    fn test_no_token() {
        let map = headers(&[("cookie", "theme=dark")]);
        assert_eq!(extract_session_token(&map), None);

        let map = headers(&[("authorization", "Basic abc")]);
        assert_eq!(extract_session_token(&map), None);
    }
}
