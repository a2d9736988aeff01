mod auth;
mod binding;
mod chat;
mod config;
mod db;
mod errors;
mod generation;
mod llm_client;
mod models;
mod relay;
mod routes;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::RemoteIdentityProvider;
use crate::chat::ChatRelay;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::Stores;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Career API v{}", env!("CARGO_PKG_VERSION"));

    let stores = match &config.database_url {
        Some(url) => Stores::postgres(create_pool(url).await?),
        None => {
            warn!("DATABASE_URL not set, records are kept in memory and lost on restart");
            Stores::in_memory()
        }
    };

    let identity = RemoteIdentityProvider::new(
        config.auth_url.clone(),
        config.auth_service_key.clone(),
    )?;
    if config.auth_url.is_none() {
        warn!("AUTH_URL not set, every authenticated request will fail");
    }

    let llm = LlmClient::new(config.openai_api_key.clone(), config.openai_api_url.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let chat = ChatRelay::new(config.chat_upstream_url.clone(), config.chat_flow_id.clone())?;
    info!("Chat relay upstream: {}", chat.upstream_url(None));

    let state = AppState {
        stores,
        identity: Arc::new(identity),
        completion: Arc::new(llm),
        chat,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
