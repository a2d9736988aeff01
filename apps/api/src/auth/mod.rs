//! Identity resolution. Authentication itself is an external collaborator: this
//! module only turns a bearer token into the owning user's id.

#[cfg(test)]
use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity provider is not configured (missing {0})")]
    NotConfigured(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("identity provider error (status {status}): {message}")]
    Provider { status: u16, message: String },
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` means the token is not valid for any user.
    async fn resolve(&self, token: &str) -> Result<Option<Uuid>, IdentityError>;
}

/// Hosted auth service: `GET {auth_url}/auth/v1/user` with the caller's bearer
/// token plus the service key.
pub struct RemoteIdentityProvider {
    client: Client,
    auth_url: Option<String>,
    service_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: Uuid,
}

impl RemoteIdentityProvider {
    pub fn new(auth_url: Option<String>, service_key: Option<String>) -> Result<Self, IdentityError> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(30)).build()?,
            auth_url: auth_url.map(|u| u.trim_end_matches('/').to_string()),
            service_key,
        })
    }
}

#[async_trait]
impl IdentityProvider for RemoteIdentityProvider {
    async fn resolve(&self, token: &str) -> Result<Option<Uuid>, IdentityError> {
        let auth_url = self
            .auth_url
            .as_deref()
            .ok_or(IdentityError::NotConfigured("AUTH_URL"))?;
        let service_key = self
            .service_key
            .as_deref()
            .ok_or(IdentityError::NotConfigured("AUTH_SERVICE_KEY"))?;

        let response = self
            .client
            .get(format!("{auth_url}/auth/v1/user"))
            .bearer_auth(token)
            .header("apikey", service_key)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Ok(None);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(IdentityError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let user: AuthUser = response.json().await?;
        Ok(Some(user.id))
    }
}

/// Fixed token → user map for tests.
#[cfg(test)]
#[derive(Default)]
pub struct StaticIdentityProvider {
    tokens: HashMap<String, Uuid>,
}

#[cfg(test)]
impl StaticIdentityProvider {
    pub fn with_user(mut self, token: impl Into<String>, user_id: Uuid) -> Self {
        self.tokens.insert(token.into(), user_id);
        self
    }
}

#[cfg(test)]
#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn resolve(&self, token: &str) -> Result<Option<Uuid>, IdentityError> {
        Ok(self.tokens.get(token).copied())
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Extractor for the authenticated caller. Rejects with 401 when the token is
/// missing or unknown.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        match state.identity.resolve(token).await {
            Ok(Some(user_id)) => Ok(CurrentUser(user_id)),
            Ok(None) => Err(AppError::Unauthorized),
            Err(e) => {
                warn!("Identity resolution failed: {e}");
                Err(AppError::Identity(e))
            }
        }
    }
}
