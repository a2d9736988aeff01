use axum::{extract::State, response::Response};
use bytes::Bytes;
use tracing::error;

use crate::chat::ChatRequest;
use crate::relay::{ok_json, RelayError};
use crate::state::AppState;

/// POST /functions/v1/chat
///
/// Any body that does not parse is reported like any other relay fault (500).
pub async fn handle_chat(State(state): State<AppState>, body: Bytes) -> Result<Response, RelayError> {
    let request: ChatRequest = serde_json::from_slice(&body).map_err(|e| {
        error!("Invalid chat relay body: {e}");
        RelayError::internal("Internal server error").with_details(e.to_string())
    })?;

    let data = state.chat.forward(request).await?;
    Ok(ok_json(data))
}
