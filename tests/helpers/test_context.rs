//! Test context
//!
//! Builds the full router over an in-memory store and exposes the channels
//! that notifications land on, so tests can drive the HTTP surface and
//! observe side effects.

use std::sync::Arc;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceExt;
use CampusFlow::config::Settings;
use CampusFlow::database::{MemoryStore, Store};
use CampusFlow::models::Principal;
use CampusFlow::services::{BroadcastPushChannel, EmailMessage, EmailQueue, PushMessage, ServiceFactory};
use CampusFlow::{create_router, AppState};
use super::mock_llm::ScriptedCompletion;

pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.auth.jwt_secret = "integration-test-secret".to_string();
    settings
}

pub struct TestContext {
    pub app: Router,
    pub state: AppState,
    pub llm: Arc<ScriptedCompletion>,
    pub push_rx: broadcast::Receiver<PushMessage>,
    pub mail_rx: mpsc::Receiver<EmailMessage>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_settings(test_settings())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let push = BroadcastPushChannel::default();
        let push_rx = push.subscribe();
        let (email, mail_rx) = EmailQueue::channel(32);
        let llm = Arc::new(ScriptedCompletion::new());

        let services = ServiceFactory::new(&settings, store, Arc::new(push), email, llm.clone())
            .expect("Failed to build services");
        let state = AppState::new(settings, services);
        let app = create_router(state.clone());

        Self {
            app,
            state,
            llm,
            push_rx,
            mail_rx,
        }
    }

    pub fn token(&self, principal: &Principal) -> String {
        self.state
            .auth
            .issue(principal, chrono::Duration::hours(1))
            .expect("Failed to issue token")
    }

    /// Send a request through the router and decode the JSON reply
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        principal: Option<&Principal>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(principal) = principal {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", self.token(principal)));
        }

        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self.app.clone().oneshot(request).await.expect("Router failed");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, json)
    }

    pub async fn get(&self, uri: &str, principal: Option<&Principal>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, principal, None).await
    }

    pub async fn post(&self, uri: &str, principal: Option<&Principal>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, principal, Some(body)).await
    }

    pub async fn put(&self, uri: &str, principal: Option<&Principal>, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, principal, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, principal: Option<&Principal>) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, principal, None).await
    }

    /// Create an event through the API and return its id
    pub async fn create_event(&self, organizer: &Principal, body: Value) -> String {
        let (status, event) = self.post("/events", Some(organizer), body).await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {event}");
        event["id"].as_str().expect("event id").to_string()
    }

    /// Register `student` for an event and return the registration id
    pub async fn register(&self, student: &Principal, event_id: &str) -> String {
        let (status, registration) = self
            .post(&format!("/registrations/{}", event_id), Some(student), serde_json::json!({}))
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {registration}");
        registration["id"].as_str().expect("registration id").to_string()
    }

    /// Drop every push message received so far
    pub fn drain_push(&mut self) -> Vec<PushMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = self.push_rx.try_recv() {
            messages.push(message);
        }
        messages
    }

    pub fn drain_mail(&mut self) -> Vec<EmailMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = self.mail_rx.try_recv() {
            messages.push(message);
        }
        messages
    }
}
