//! Event handlers

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;
use crate::handlers::{ApiJson, ApiPath};
use crate::middleware::AuthUser;
use crate::models::{CreateEventRequest, Event, EventFilter, EventStatus, UpdateEventRequest};
use crate::state::AppState;
use crate::utils::errors::{CampusFlowError, Result};
use crate::utils::helpers::parse_date_filter;

/// Query string accepted by `GET /events`
#[derive(Debug, Default, Deserialize)]
pub struct EventListQuery {
    pub status: Option<String>,
    pub date: Option<String>,
}

impl EventListQuery {
    fn into_filter(self) -> Result<EventFilter> {
        let status = self
            .status
            .filter(|value| !value.is_empty())
            .map(|value| value.parse::<EventStatus>())
            .transpose()
            .map_err(CampusFlowError::Validation)?;

        let starts_from = match self.date.filter(|value| !value.is_empty()) {
            Some(value) => Some(
                parse_date_filter(&value)
                    .ok_or_else(|| CampusFlowError::Validation(format!("Invalid date filter: {}", value)))?,
            ),
            None => None,
        };

        Ok(EventFilter {
            status,
            starts_from,
            ..EventFilter::default()
        })
    }
}

/// Handle `GET /events`
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventListQuery>,
) -> Result<Json<Vec<Event>>> {
    let filter = query.into_filter()?;
    debug!(?filter, "Listing events");

    Ok(Json(state.services.events.list(&filter).await?))
}

/// Handle `GET /events/my`
pub async fn my_events(State(state): State<AppState>, AuthUser(principal): AuthUser) -> Result<Json<Vec<Event>>> {
    Ok(Json(state.services.events.list_mine(&principal).await?))
}

/// Handle `GET /events/:id`
pub async fn get_event(State(state): State<AppState>, ApiPath(event_id): ApiPath<Uuid>) -> Result<Json<Event>> {
    Ok(Json(state.services.events.get(event_id).await?))
}

/// Handle `POST /events`
pub async fn create_event(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiJson(request): ApiJson<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>)> {
    let event = state.services.events.create(&principal, request).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Handle `PUT /events/:id`
pub async fn update_event(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiPath(event_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateEventRequest>,
) -> Result<Json<Event>> {
    Ok(Json(state.services.events.update(&principal, event_id, request).await?))
}

/// Handle `DELETE /events/:id`
pub async fn delete_event(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiPath(event_id): ApiPath<Uuid>,
) -> Result<Json<Value>> {
    let id = state.services.events.delete(&principal, event_id).await?;
    Ok(Json(json!({ "id": id })))
}
