use anyhow::{Context, Result};

/// Default conversational upstream. The chatflow id is appended as the last path segment.
pub const DEFAULT_CHAT_UPSTREAM_URL: &str = "https://srv938896.hstgr.cloud/api/v1/prediction";
pub const DEFAULT_CHAT_FLOW_ID: &str = "81474cb0-b321-4dfe-abd3-0487f4de430b";

/// Application configuration loaded from environment variables.
///
/// Secrets the relays and the identity provider need are optional here. Their
/// absence only surfaces as a configuration error when a request first needs them.
#[derive(Debug, Clone)]
pub struct Config {
    /// Without a database the service runs on in-memory stores.
    pub database_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_api_url: Option<String>,
    pub auth_url: Option<String>,
    pub auth_service_key: Option<String>,
    pub chat_upstream_url: String,
    pub chat_flow_id: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_api_url: optional_env("OPENAI_API_URL"),
            auth_url: optional_env("AUTH_URL"),
            auth_service_key: optional_env("AUTH_SERVICE_KEY"),
            chat_upstream_url: optional_env("CHAT_UPSTREAM_URL")
                .unwrap_or_else(|| DEFAULT_CHAT_UPSTREAM_URL.to_string()),
            chat_flow_id: optional_env("CHAT_FLOW_ID")
                .unwrap_or_else(|| DEFAULT_CHAT_FLOW_ID.to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Unset and blank are treated the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
