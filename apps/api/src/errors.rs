use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::IdentityError;
use crate::binding::BindingError;
use crate::store::StoreError;

/// Application-level error type for the CRUD API.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// The relays use their own envelope, see `relay::RelayError`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Identity provider error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound("Record not found".to_string()),
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::Rejected(msg) => AppError::Validation(msg),
            other => AppError::Store(other),
        }
    }
}

impl From<BindingError> for AppError {
    fn from(err: BindingError) -> Self {
        match err {
            BindingError::NoIdentity => AppError::Unauthorized,
            BindingError::Invalid(msg) => AppError::Validation(msg),
            BindingError::Store(e) => e.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Identity(e) => {
                tracing::error!("Identity provider error: {e}");
                let status = match e {
                    IdentityError::NotConfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
                    _ => StatusCode::BAD_GATEWAY,
                };
                (
                    status,
                    "IDENTITY_ERROR",
                    "Could not verify the caller's identity".to_string(),
                )
            }
            AppError::Store(e) => {
                tracing::error!("Store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
