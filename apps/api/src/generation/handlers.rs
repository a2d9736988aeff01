//! Axum route handler for the Content Generation Relay.

use axum::{extract::State, http::HeaderMap, response::Response};
use bytes::Bytes;
use serde_json::json;
use tracing::{error, info, warn};

use crate::auth::bearer_token;
use crate::generation::generator::{generate, save_cover_letter, GenerationRequest, GenerationType};
use crate::relay::{ok_json, RelayError};
use crate::state::AppState;

/// POST /functions/v1/generate-career-content
///
/// Returns `{content, type}`. A malformed body or an unknown `type` is a 400,
/// any completion failure a 500 carrying the failure's message.
pub async fn handle_generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, RelayError> {
    let request: GenerationRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!("Invalid generation body: {e}");
        RelayError::bad_request("Invalid request body").with_details(e.to_string())
    })?;

    let kind = GenerationType::parse(request.kind.as_deref()).ok_or_else(|| {
        warn!(kind = ?request.kind, "Rejected generation request");
        RelayError::bad_request("Invalid request type")
    })?;

    info!(
        kind = kind.as_str(),
        company = ?request.company_name,
        position = ?request.position_title,
        tone = %request.tone(),
        "Received generation request"
    );

    let content = generate(state.completion.as_ref(), kind, &request)
        .await
        .map_err(|e| {
            error!("Error in generate-career-content: {e}");
            RelayError::internal(e.to_string())
        })?;

    if kind == GenerationType::CoverLetter {
        save_cover_letter(
            state.identity.as_ref(),
            state.stores.cover_letters.as_ref(),
            bearer_token(&headers),
            &request,
            &content,
        )
        .await;
    }

    Ok(ok_json(json!({
        "content": content,
        "type": kind.as_str(),
    })))
}
