//! HTTP client for the API backend
//!
//! The web application holds no database connection; every page is
//! rendered from API responses. The browser's session cookie is
//! forwarded upstream so the API sees the same authentication.

use reqwest::header::{HeaderValue, COOKIE, SET_COOKIE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::api::response::ApiResponse;

/// Error types for upstream API calls
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The API could not be reached or timed out
    #[error("API request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with a body that is not a result envelope
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

/// Client for the API backend with a fixed outbound timeout
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the given API base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    fn with_session(
        &self,
        request: reqwest::RequestBuilder,
        session: Option<&str>,
    ) -> reqwest::RequestBuilder {
        match session {
            Some(token) => {
                let cookie = format!("session={}", token);
                match HeaderValue::from_str(&cookie) {
                    Ok(value) => request.header(COOKIE, value),
                    Err(_) => request,
                }
            }
            None => request,
        }
    }

    async fn parse<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<ApiResponse<T>, ClientError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            ClientError::InvalidResponse(format!("{}: {}", e, truncate(&body, 200)))
        })
    }

    /// GET a path, returning the decoded envelope
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        session: Option<&str>,
    ) -> Result<ApiResponse<T>, ClientError> {
        let request = self.with_session(self.client.get(self.url(path)), session);
        Self::parse(request.send().await?).await
    }

    /// POST a JSON body
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        session: Option<&str>,
    ) -> Result<ApiResponse<T>, ClientError> {
        let request = self.with_session(self.client.post(self.url(path)).json(body), session);
        Self::parse(request.send().await?).await
    }

    /// POST a JSON body and capture the upstream `Set-Cookie` header,
    /// used to relay the session cookie after login and logout
    pub async fn post_capturing_cookie<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        session: Option<&str>,
    ) -> Result<(ApiResponse<T>, Option<String>), ClientError> {
        let request = self.with_session(self.client.post(self.url(path)).json(body), session);
        let response = request.send().await?;

        let set_cookie = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        Ok((Self::parse(response).await?, set_cookie))
    }

    /// PUT a JSON body
    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        session: Option<&str>,
    ) -> Result<ApiResponse<T>, ClientError> {
        let request = self.with_session(self.client.put(self.url(path)).json(body), session);
        Self::parse(request.send().await?).await
    }

    /// DELETE a path
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        session: Option<&str>,
    ) -> Result<ApiResponse<T>, ClientError> {
        let request = self.with_session(self.client.delete(self.url(path)), session);
        Self::parse(request.send().await?).await
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client = ApiClient::new("http://localhost:8080/", 10).expect("Client build failed");
        assert_eq!(client.url("/articles"), "http://localhost:8080/api/v1/articles");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 3), "hel");
        assert_eq!(truncate("żółć", 2), "żó");
    }
}
