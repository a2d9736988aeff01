use std::sync::Arc;

use crate::auth::IdentityProvider;
use crate::chat::ChatRelay;
use crate::llm_client::CompletionBackend;
use crate::store::Stores;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    /// Resolves bearer tokens to owner ids. Remote auth service in production.
    pub identity: Arc<dyn IdentityProvider>,
    /// Completion backend for the generation relay. Default: `LlmClient`.
    pub completion: Arc<dyn CompletionBackend>,
    pub chat: ChatRelay,
}
