//! Event aggregate
//!
//! Owns event creation and mutation and is the gate every module-scoped
//! operation passes through.

use std::sync::Arc;
use serde_json::json;
use tracing::info;
use uuid::Uuid;
use crate::database::Store;
use crate::models::{
    CreateEventRequest, Event, EventFilter, Module, ModuleKind, NewEvent, Principal, UpdateEventRequest,
};
use crate::modules::ModuleRegistry;
use crate::services::notification::NotificationService;
use crate::utils::errors::{CampusFlowError, Result};
use crate::utils::logging::log_event_action;

/// The attached module of `kind`, or `ModuleNotEnabled`
pub fn require_module(event: &Event, kind: ModuleKind) -> Result<&Module> {
    event
        .module(kind)
        .ok_or(CampusFlowError::ModuleNotEnabled { module: kind })
}

/// A required text field: present and not blank
fn required_text(value: Option<String>, field: &str) -> Result<String> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        _ => Err(CampusFlowError::Validation(format!("Please provide {}", field))),
    }
}

#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn Store>,
    notifications: NotificationService,
}

impl EventService {
    pub fn new(store: Arc<dyn Store>, notifications: NotificationService) -> Self {
        Self { store, notifications }
    }

    /// Fetch an event or fail with `EventNotFound`
    pub async fn get(&self, event_id: Uuid) -> Result<Event> {
        self.store
            .find_event(event_id)
            .await?
            .ok_or(CampusFlowError::EventNotFound { event_id })
    }

    pub async fn list(&self, filter: &EventFilter) -> Result<Vec<Event>> {
        self.store.list_events(filter).await
    }

    /// Events the caller organises
    pub async fn list_mine(&self, principal: &Principal) -> Result<Vec<Event>> {
        if !principal.can_organize() {
            return Err(CampusFlowError::Unauthorized("Only organizers have their own events".to_string()));
        }

        self.store.list_events_by_organizer(principal.id).await
    }

    /// Events visible to the concierge
    pub async fn snapshot(&self) -> Result<Vec<Event>> {
        let filter = EventFilter {
            exclude_archived: true,
            ..EventFilter::default()
        };
        self.store.list_events(&filter).await
    }

    pub async fn create(&self, principal: &Principal, request: CreateEventRequest) -> Result<Event> {
        if !principal.can_organize() {
            return Err(CampusFlowError::Unauthorized("Only organizers can create events".to_string()));
        }

        let title = required_text(request.title, "a title")?;
        let description = required_text(request.description, "a description")?;
        let location = required_text(request.location, "a location")?;
        let timeline = request
            .timeline
            .ok_or_else(|| CampusFlowError::Validation("Please provide a timeline".to_string()))?;
        if !timeline.is_valid() {
            return Err(CampusFlowError::Validation("Event must end after it starts".to_string()));
        }

        let modules = ModuleRegistry::build(&request.modules.unwrap_or_default())?;

        let event = self
            .store
            .create_event(NewEvent {
                organizer_id: principal.id,
                title,
                description,
                status: request.status.unwrap_or_default(),
                timeline,
                location,
                theme_config: request.theme_config.unwrap_or_else(|| json!({})),
                modules,
            })
            .await?;

        log_event_action(event.id, "created", principal.id, Some(&event.title));
        self.notifications.event_created(&event).await;

        Ok(event)
    }

    pub async fn update(&self, principal: &Principal, event_id: Uuid, request: UpdateEventRequest) -> Result<Event> {
        let mut event = self.get(event_id).await?;
        if !principal.can_manage(event.organizer_id) {
            return Err(CampusFlowError::Unauthorized("Not authorized to update this event".to_string()));
        }

        if let Some(title) = request.title {
            event.title = required_text(Some(title), "a title")?;
        }
        if let Some(description) = request.description {
            event.description = required_text(Some(description), "a description")?;
        }
        if let Some(location) = request.location {
            event.location = required_text(Some(location), "a location")?;
        }
        if let Some(timeline) = request.timeline {
            if !timeline.is_valid() {
                return Err(CampusFlowError::Validation("Event must end after it starts".to_string()));
            }
            event.timeline = timeline;
        }
        if let Some(status) = request.status {
            event.status = status;
        }
        if let Some(theme_config) = request.theme_config {
            event.theme_config = theme_config;
        }
        if let Some(modules) = request.modules {
            event.modules = ModuleRegistry::build(&modules)?;
        }

        let updated = self.store.update_event(&event).await?;
        log_event_action(updated.id, "updated", principal.id, None);

        Ok(updated)
    }

    pub async fn delete(&self, principal: &Principal, event_id: Uuid) -> Result<Uuid> {
        let event = self.get(event_id).await?;
        if !principal.can_manage(event.organizer_id) {
            return Err(CampusFlowError::Unauthorized("Not authorized to delete this event".to_string()));
        }

        if !self.store.delete_event(event_id).await? {
            return Err(CampusFlowError::EventNotFound { event_id });
        }

        log_event_action(event_id, "deleted", principal.id, None);
        info!(event_id = %event_id, "Event removed with its registrations and votes");

        Ok(event_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};
    use crate::database::MemoryStore;
    use crate::models::{EventStatus, ModuleSpec, Role, Timeline};
    use crate::services::email::EmailQueue;
    use crate::services::push::{BroadcastPushChannel, PushTopic};

    fn service() -> (EventService, BroadcastPushChannel) {
        let push = BroadcastPushChannel::new(8);
        let (queue, _mails) = EmailQueue::channel(8);
        let notifications = NotificationService::new(Arc::new(push.clone()), queue);
        (EventService::new(Arc::new(MemoryStore::new()), notifications), push)
    }

    fn request() -> CreateEventRequest {
        let start = Utc::now() + Duration::days(1);
        CreateEventRequest {
            title: Some("Hack Night".to_string()),
            description: Some("Build things".to_string()),
            timeline: Some(Timeline { start, end: start + Duration::hours(3) }),
            location: Some("Lab 3".to_string()),
            modules: Some(vec![ModuleSpec::new("registration", json!({"limit": 5}))]),
            ..CreateEventRequest::default()
        }
    }

    #[tokio::test]
    async fn test_create_defaults_and_broadcast() {
        let (service, push) = service();
        let mut pushed = push.subscribe();
        let organizer = Principal::new(Uuid::new_v4(), Role::Organizer);

        let event = service.create(&organizer, request()).await.unwrap();

        assert_eq!(event.status, EventStatus::Draft);
        assert_eq!(event.theme_config, json!({}));
        assert_eq!(event.registration_limit(), Some(5));
        assert_eq!(pushed.try_recv().unwrap().topic, PushTopic::NewEvent);
    }

    #[tokio::test]
    async fn test_create_requires_fields() {
        let (service, _) = service();
        let organizer = Principal::new(Uuid::new_v4(), Role::Organizer);

        let missing_location = CreateEventRequest { location: None, ..request() };
        assert_matches!(
            service.create(&organizer, missing_location).await,
            Err(CampusFlowError::Validation(_))
        );

        let blank_title = CreateEventRequest { title: Some("  ".to_string()), ..request() };
        assert_matches!(service.create(&organizer, blank_title).await, Err(CampusFlowError::Validation(_)));
    }

    #[tokio::test]
    async fn test_students_cannot_create() {
        let (service, _) = service();
        let student = Principal::new(Uuid::new_v4(), Role::Student);
        assert_matches!(service.create(&student, request()).await, Err(CampusFlowError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_only_owner_or_admin_updates() {
        let (service, _) = service();
        let organizer = Principal::new(Uuid::new_v4(), Role::Organizer);
        let other = Principal::new(Uuid::new_v4(), Role::Organizer);
        let admin = Principal::new(Uuid::new_v4(), Role::Admin);
        let event = service.create(&organizer, request()).await.unwrap();

        let publish = UpdateEventRequest { status: Some(EventStatus::Published), ..UpdateEventRequest::default() };
        assert_matches!(
            service.update(&other, event.id, publish.clone()).await,
            Err(CampusFlowError::Unauthorized(_))
        );

        let updated = service.update(&admin, event.id, publish).await.unwrap();
        assert_eq!(updated.status, EventStatus::Published);
        assert_eq!(updated.organizer_id, organizer.id);
    }

    #[tokio::test]
    async fn test_delete_then_missing() {
        let (service, _) = service();
        let organizer = Principal::new(Uuid::new_v4(), Role::Organizer);
        let event = service.create(&organizer, request()).await.unwrap();

        assert_eq!(service.delete(&organizer, event.id).await.unwrap(), event.id);
        assert_matches!(service.get(event.id).await, Err(CampusFlowError::EventNotFound { .. }));
    }

    #[test]
    fn test_require_module() {
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            organizer_id: Uuid::new_v4(),
            title: "Quiz".to_string(),
            description: "Trivia".to_string(),
            status: EventStatus::Published,
            timeline: Timeline { start: now, end: now + Duration::hours(1) },
            location: "Hall".to_string(),
            theme_config: json!({}),
            modules: vec![],
            created_at: now,
            updated_at: now,
        };

        assert_matches!(
            require_module(&event, ModuleKind::Voting),
            Err(CampusFlowError::ModuleNotEnabled { module: ModuleKind::Voting })
        );
    }
}
