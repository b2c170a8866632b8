//! Vote handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use crate::handlers::{ApiJson, ApiPath};
use crate::middleware::AuthUser;
use crate::models::{CastVoteRequest, Vote, VoteTally};
use crate::state::AppState;
use crate::utils::errors::Result;

/// Handle `POST /votes/:eventId`
///
/// Answers 201 when the vote is new and 200 when it replaced an earlier one.
pub async fn cast_vote(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiPath(event_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<CastVoteRequest>,
) -> Result<(StatusCode, Json<Vote>)> {
    let outcome = state.services.votes.cast_or_update(&principal, event_id, request).await?;

    let status = if outcome.created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(outcome.vote)))
}

/// Handle `GET /votes/event/:eventId`
pub async fn event_results(
    State(state): State<AppState>,
    ApiPath(event_id): ApiPath<Uuid>,
) -> Result<Json<Vec<VoteTally>>> {
    Ok(Json(state.services.votes.aggregate(event_id).await?))
}

/// Handle `GET /votes/my/:eventId`
pub async fn my_votes(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiPath(event_id): ApiPath<Uuid>,
) -> Result<Json<Vec<Vote>>> {
    Ok(Json(state.services.votes.list_for_user(&principal, event_id).await?))
}
