//! Authentication endpoints

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{extract_session_token, AppState, AuthenticatedUser};
use crate::api::response::ApiResponse;
use crate::models::User;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        token, max_age_secs
    )
}

/// POST /auth/login
pub async fn login(State(state): State<AppState>, Json(body): Json<LoginRequest>) -> Response {
    match state.user_service.login(&body.email, &body.password).await {
        Ok((user, session)) => {
            let cookie = session_cookie(&session.id, state.session_expiration_days * 24 * 60 * 60);
            let mut headers = HeaderMap::new();
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                headers.insert(header::SET_COOKIE, value);
            }

            let body = ApiResponse::ok(AuthResponse {
                user,
                token: session.id,
            });
            (headers, body).into_response()
        }
        Err(e) => {
            ApiResponse::<()>::fail(e.status_code(), vec![e.to_string()]).into_response()
        }
    }
}

/// POST /auth/logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(token) = extract_session_token(&headers) else {
        return ApiResponse::<()>::fail(401, vec!["Missing authentication token".to_string()])
            .into_response();
    };

    match state.user_service.logout(&token).await {
        Ok(()) => {
            let mut response_headers = HeaderMap::new();
            response_headers.insert(
                header::SET_COOKIE,
                HeaderValue::from_static("session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"),
            );
            (response_headers, ApiResponse::ok(())).into_response()
        }
        Err(e) => ApiResponse::<()>::fail(e.status_code(), vec![e.to_string()]).into_response(),
    }
}

/// GET /auth/profile
pub async fn profile(AuthenticatedUser(user): AuthenticatedUser) -> ApiResponse<User> {
    ApiResponse::ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_format() {
        let cookie = session_cookie("abc-123", 604800);
        assert_eq!(
            cookie,
            "session=abc-123; Path=/; HttpOnly; SameSite=Lax; Max-Age=604800"
        );
    }
}
