//! Concierge chat handler

use axum::extract::State;
use axum::Json;
use tracing::debug;
use crate::handlers::ApiJson;
use crate::middleware::RateLimitedCaller;
use crate::models::{ChatRequest, ChatResponse};
use crate::state::AppState;
use crate::utils::errors::Result;

/// Handle `POST /ai/chat`
///
/// Signed-in callers may trigger registrations through the assistant;
/// anonymous callers can still chat. Replies are always 200, including the
/// local fallback, except when the caller exceeds the per-minute chat quota:
/// the limiter rejects those with 429 before the assistant is consulted.
pub async fn chat(
    State(state): State<AppState>,
    caller: RateLimitedCaller,
    ApiJson(request): ApiJson<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    debug!(caller = %caller.key, turns = request.history.len(), "Processing chat message");

    let response = state.services.chat.respond(caller.principal.as_ref(), request).await?;
    Ok(Json(response))
}
