//! In-memory store
//!
//! Every table lives behind one async mutex, so each operation is a single
//! serialized writer. Used by the test-suite and by the `memory` backend.

use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;
use crate::models::{
    Event, EventFilter, NewEvent, NewRegistration, Registration, RegistrationStatus,
    RegistrationWithEvent, StatusChange, Vote, VoteOutcome, VoteTally,
};
use crate::utils::errors::{CampusFlowError, Result};
use super::store::{check_admission, check_status_change, Store};

#[derive(Debug, Default)]
struct Tables {
    events: HashMap<Uuid, Event>,
    registrations: HashMap<Uuid, Registration>,
    votes: HashMap<(Uuid, Uuid, String), Vote>,
}

impl Tables {
    fn occupied_seats(&self, event_id: Uuid) -> i64 {
        self.registrations
            .values()
            .filter(|r| r.event_id == event_id && r.status.occupies_seat())
            .count() as i64
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    async fn create_event(&self, event: NewEvent) -> Result<Event> {
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            organizer_id: event.organizer_id,
            title: event.title,
            description: event.description,
            status: event.status,
            timeline: event.timeline,
            location: event.location,
            theme_config: event.theme_config,
            modules: event.modules,
            created_at: now,
            updated_at: now,
        };

        self.tables.lock().await.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>> {
        Ok(self.tables.lock().await.events.get(&id).cloned())
    }

    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>> {
        let tables = self.tables.lock().await;
        let mut events: Vec<Event> = tables.events.values().filter(|e| filter.matches(e)).cloned().collect();
        events.sort_by_key(|e| (e.timeline.start, e.created_at));
        Ok(events)
    }

    async fn list_events_by_organizer(&self, organizer_id: Uuid) -> Result<Vec<Event>> {
        let tables = self.tables.lock().await;
        let mut events: Vec<Event> = tables
            .events
            .values()
            .filter(|e| e.organizer_id == organizer_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(events)
    }

    async fn update_event(&self, event: &Event) -> Result<Event> {
        let mut tables = self.tables.lock().await;
        let stored = tables
            .events
            .get_mut(&event.id)
            .ok_or(CampusFlowError::EventNotFound { event_id: event.id })?;

        *stored = Event {
            created_at: stored.created_at,
            organizer_id: stored.organizer_id,
            updated_at: Utc::now(),
            ..event.clone()
        };

        Ok(stored.clone())
    }

    async fn delete_event(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        if tables.events.remove(&id).is_none() {
            return Ok(false);
        }

        tables.registrations.retain(|_, r| r.event_id != id);
        tables.votes.retain(|(event_id, _, _), _| *event_id != id);
        Ok(true)
    }

    async fn insert_registration(&self, registration: NewRegistration) -> Result<Registration> {
        let mut tables = self.tables.lock().await;

        let event = tables
            .events
            .get(&registration.event_id)
            .ok_or(CampusFlowError::EventNotFound { event_id: registration.event_id })?;

        let already_registered = tables
            .registrations
            .values()
            .any(|r| r.event_id == registration.event_id && r.user_id == registration.user_id);

        check_admission(
            event,
            already_registered,
            tables.occupied_seats(registration.event_id),
            registration.user_id,
        )?;

        let now = Utc::now();
        let stored = Registration {
            id: Uuid::new_v4(),
            event_id: registration.event_id,
            user_id: registration.user_id,
            status: RegistrationStatus::Pending,
            responses: registration.responses,
            user_name: registration.user_name,
            user_email: registration.user_email,
            created_at: now,
            updated_at: now,
        };

        tables.registrations.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_registration(&self, id: Uuid) -> Result<Option<Registration>> {
        Ok(self.tables.lock().await.registrations.get(&id).cloned())
    }

    async fn set_registration_status(&self, id: Uuid, status: RegistrationStatus) -> Result<StatusChange> {
        let mut tables = self.tables.lock().await;

        let current = tables
            .registrations
            .get(&id)
            .cloned()
            .ok_or(CampusFlowError::RegistrationNotFound { registration_id: id })?;
        let event = tables
            .events
            .get(&current.event_id)
            .ok_or(CampusFlowError::EventNotFound { event_id: current.event_id })?;

        check_status_change(event, current.status, status, tables.occupied_seats(current.event_id))?;

        let previous = current.status;
        let registration = match tables.registrations.get_mut(&id) {
            Some(stored) => {
                if previous != status {
                    stored.status = status;
                    stored.updated_at = Utc::now();
                }
                stored.clone()
            }
            None => return Err(CampusFlowError::RegistrationNotFound { registration_id: id }),
        };

        Ok(StatusChange { registration, previous })
    }

    async fn list_registrations_for_event(&self, event_id: Uuid) -> Result<Vec<Registration>> {
        let tables = self.tables.lock().await;
        let mut registrations: Vec<Registration> = tables
            .registrations
            .values()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect();
        registrations.sort_by_key(|r| r.created_at);
        Ok(registrations)
    }

    async fn list_registrations_for_user(&self, user_id: Uuid) -> Result<Vec<RegistrationWithEvent>> {
        let tables = self.tables.lock().await;
        let mut registrations: Vec<RegistrationWithEvent> = tables
            .registrations
            .values()
            .filter(|r| r.user_id == user_id)
            .filter_map(|r| {
                tables.events.get(&r.event_id).map(|event| RegistrationWithEvent {
                    registration: r.clone(),
                    event: event.summary(),
                })
            })
            .collect();
        registrations.sort_by_key(|r| r.registration.created_at);
        Ok(registrations)
    }

    async fn count_occupied_seats(&self, event_id: Uuid) -> Result<i64> {
        Ok(self.tables.lock().await.occupied_seats(event_id))
    }

    async fn upsert_vote(&self, event_id: Uuid, user_id: Uuid, target_id: &str, value: &Value) -> Result<VoteOutcome> {
        let mut tables = self.tables.lock().await;

        if !tables.events.contains_key(&event_id) {
            return Err(CampusFlowError::EventNotFound { event_id });
        }

        let now = Utc::now();
        let key = (event_id, user_id, target_id.to_string());

        if let Some(existing) = tables.votes.get_mut(&key) {
            existing.value = value.clone();
            existing.updated_at = now;
            return Ok(VoteOutcome { vote: existing.clone(), created: false });
        }

        let vote = Vote {
            id: Uuid::new_v4(),
            event_id,
            user_id,
            target_id: target_id.to_string(),
            value: value.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.votes.insert(key, vote.clone());

        Ok(VoteOutcome { vote, created: true })
    }

    async fn tally_votes(&self, event_id: Uuid) -> Result<Vec<VoteTally>> {
        let tables = self.tables.lock().await;
        let mut tallies: Vec<VoteTally> = Vec::new();

        for vote in tables.votes.values().filter(|v| v.event_id == event_id) {
            match tallies
                .iter_mut()
                .find(|t| t.target_id == vote.target_id && t.value == vote.value)
            {
                Some(tally) => tally.count += 1,
                None => tallies.push(VoteTally {
                    target_id: vote.target_id.clone(),
                    value: vote.value.clone(),
                    count: 1,
                }),
            }
        }

        Ok(tallies)
    }

    async fn list_votes_for_user(&self, event_id: Uuid, user_id: Uuid) -> Result<Vec<Vote>> {
        let tables = self.tables.lock().await;
        let mut votes: Vec<Vote> = tables
            .votes
            .values()
            .filter(|v| v.event_id == event_id && v.user_id == user_id)
            .cloned()
            .collect();
        votes.sort_by(|a, b| a.target_id.cmp(&b.target_id));
        Ok(votes)
    }
}
