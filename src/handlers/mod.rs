//! HTTP handlers module
//!
//! This module contains the REST handlers organized by resource:
//! - Event catalogue and organizer management
//! - Registration ledger
//! - Voting ledger
//! - Concierge chat
//! - Health probe

pub mod chat;
pub mod events;
pub mod health;
pub mod registrations;
pub mod votes;

use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use tower_http::cors::CorsLayer;
use crate::middleware::with_request_tracing;
use crate::state::AppState;
use crate::utils::errors::CampusFlowError;

/// JSON body whose decode failures surface as validation errors
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = CampusFlowError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(CampusFlowError::Validation(rejection.body_text())),
        }
    }
}

/// Path parameters whose parse failures surface as validation errors
#[derive(Debug, Clone, Copy)]
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = CampusFlowError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(CampusFlowError::Validation(rejection.body_text())),
        }
    }
}

/// Build the application router
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/events", get(events::list_events).post(events::create_event))
        .route("/events/my", get(events::my_events))
        .route(
            "/events/:id",
            get(events::get_event).put(events::update_event).delete(events::delete_event),
        )
        .route("/registrations/my", get(registrations::my_registrations))
        .route("/registrations/event/:event_id", get(registrations::event_registrations))
        // POST takes an event id, PUT takes a registration id
        .route(
            "/registrations/:id",
            post(registrations::register).put(registrations::update_status),
        )
        .route("/votes/:event_id", post(votes::cast_vote))
        .route("/votes/event/:event_id", get(votes::event_results))
        .route("/votes/my/:event_id", get(votes::my_votes))
        .route("/ai/chat", post(chat::chat))
        .route("/health", get(health::health));

    with_request_tracing(api)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
