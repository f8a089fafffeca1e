//! Uniform API result envelope
//!
//! Every endpoint answers with the same JSON shape:
//!
//! ```json
//! { "success": true, "status": 200, "data": …, "errors": [] }
//! ```
//!
//! The envelope status doubles as the HTTP status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Result envelope wrapping every API response body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: serde::de::DeserializeOwned"))]
pub struct ApiResponse<T> {
    pub success: bool,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl<T> ApiResponse<T> {
    /// Successful response with a payload and explicit status
    pub fn success(status: u16, data: T) -> Self {
        Self {
            success: true,
            status,
            data: Some(data),
            errors: Vec::new(),
        }
    }

    /// 200 OK with a payload
    pub fn ok(data: T) -> Self {
        Self::success(200, data)
    }

    /// 201 Created with a payload
    pub fn created(data: T) -> Self {
        Self::success(201, data)
    }

    /// Failed response with error messages
    pub fn fail(status: u16, errors: Vec<String>) -> Self {
        Self {
            success: false,
            status,
            data: None,
            errors,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
