//! Shared wire conventions for the two relay endpoints: CORS headers on every
//! response, an empty 200 for preflight, and the flat `{error, details?}` envelope.

use axum::{
    http::{
        header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN},
        HeaderName, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

pub const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

pub fn cors_headers() -> [(HeaderName, HeaderValue); 2] {
    [
        (ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")),
        (
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        ),
    ]
}

/// OPTIONS handler for both relays.
pub async fn preflight() -> impl IntoResponse {
    (StatusCode::OK, cors_headers())
}

/// 200 with a JSON body and the relay CORS headers.
pub fn ok_json(body: Value) -> Response {
    (StatusCode::OK, cors_headers(), Json(body)).into_response()
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

/// A relay failure, already carrying the status it maps to.
#[derive(Debug)]
pub struct RelayError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<String>,
}

impl RelayError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    pub fn internal(error: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = ErrorEnvelope {
            error: self.error,
            details: self.details,
        };
        (self.status, cors_headers(), Json(body)).into_response()
    }
}

/// Converts an upstream status into ours, falling back to 502 for values axum rejects.
pub fn status_from_upstream(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_GATEWAY)
}
