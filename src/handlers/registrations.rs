//! Registration handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::info;
use uuid::Uuid;
use crate::handlers::{ApiJson, ApiPath};
use crate::middleware::AuthUser;
use crate::models::{RegisterRequest, Registration, RegistrationWithEvent, UpdateStatusRequest};
use crate::state::AppState;
use crate::utils::errors::Result;

/// Handle `POST /registrations/:eventId`
///
/// The body is optional; a missing or undecodable body registers with no
/// form responses.
pub async fn register(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiPath(event_id): ApiPath<Uuid>,
    body: Option<ApiJson<RegisterRequest>>,
) -> Result<(StatusCode, Json<Registration>)> {
    let responses = body.map(|ApiJson(request)| request.responses).unwrap_or_default();

    let registration = state
        .services
        .registrations
        .register(&principal, event_id, responses)
        .await?;

    info!(registration_id = %registration.id, event_id = %event_id, "Registration accepted");
    Ok((StatusCode::CREATED, Json(registration)))
}

/// Handle `GET /registrations/my`
pub async fn my_registrations(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<Vec<RegistrationWithEvent>>> {
    Ok(Json(state.services.registrations.list_for_user(&principal).await?))
}

/// Handle `GET /registrations/event/:eventId`
pub async fn event_registrations(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiPath(event_id): ApiPath<Uuid>,
) -> Result<Json<Vec<Registration>>> {
    Ok(Json(state.services.registrations.list_for_event(&principal, event_id).await?))
}

/// Handle `PUT /registrations/:id`
pub async fn update_status(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiPath(registration_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateStatusRequest>,
) -> Result<Json<Registration>> {
    let registration = state
        .services
        .registrations
        .set_status(&principal, registration_id, request.status.as_deref())
        .await?;

    Ok(Json(registration))
}
