//! Database service layer
//!
//! PostgreSQL implementation of [`Store`]. Registration writes run in a
//! transaction that first locks the event row, so admission checks and the
//! write they guard see the same seat count.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;
use crate::database::{DatabasePool, EventRepository, RegistrationRepository, VoteRepository};
use crate::database::repositories::registration::UNIQUE_EVENT_USER;
use crate::database::store::{check_admission, check_status_change, Store};
use crate::models::*;
use crate::utils::errors::{CampusFlowError, Result};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub events: EventRepository,
    pub registrations: RegistrationRepository,
    pub votes: VoteRepository,
    pool: DatabasePool,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            events: EventRepository::new(pool.clone()),
            registrations: RegistrationRepository::new(pool.clone()),
            votes: VoteRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}

/// SQLSTATE and constraint name of a database error, if any
fn db_error_code(error: &CampusFlowError) -> Option<(String, Option<String>)> {
    match error {
        CampusFlowError::Database(sqlx::Error::Database(db)) => db
            .code()
            .map(|code| (code.into_owned(), db.constraint().map(str::to_string))),
        _ => None,
    }
}

#[async_trait]
impl Store for DatabaseService {
    async fn health_check(&self) -> Result<()> {
        crate::database::health_check(&self.pool).await
    }

    async fn create_event(&self, event: NewEvent) -> Result<Event> {
        self.events.create(event).await
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>> {
        self.events.find_by_id(id).await
    }

    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>> {
        self.events.list(filter).await
    }

    async fn list_events_by_organizer(&self, organizer_id: Uuid) -> Result<Vec<Event>> {
        self.events.get_organizer_events(organizer_id).await
    }

    async fn update_event(&self, event: &Event) -> Result<Event> {
        self.events.update(event).await
    }

    async fn delete_event(&self, id: Uuid) -> Result<bool> {
        self.events.delete(id).await
    }

    async fn insert_registration(&self, registration: NewRegistration) -> Result<Registration> {
        let event_id = registration.event_id;
        let user_id = registration.user_id;

        let mut tx = self.pool.begin().await?;

        let event = EventRepository::lock_for_update(&mut tx, event_id)
            .await?
            .ok_or(CampusFlowError::EventNotFound { event_id })?;
        let already_registered = RegistrationRepository::exists(&mut tx, event_id, user_id).await?;
        let occupied = RegistrationRepository::count_occupied(&mut tx, event_id).await?;

        check_admission(&event, already_registered, occupied, user_id)?;

        let stored = match RegistrationRepository::insert(&mut tx, registration).await {
            Ok(stored) => stored,
            Err(e) => {
                return Err(match db_error_code(&e) {
                    Some((code, Some(constraint)))
                        if code == UNIQUE_VIOLATION && constraint == UNIQUE_EVENT_USER =>
                    {
                        CampusFlowError::AlreadyRegistered { event_id, user_id }
                    }
                    _ => e,
                });
            }
        };

        tx.commit().await?;
        Ok(stored)
    }

    async fn find_registration(&self, id: Uuid) -> Result<Option<Registration>> {
        self.registrations.find_by_id(id).await
    }

    async fn set_registration_status(&self, id: Uuid, status: RegistrationStatus) -> Result<StatusChange> {
        let event_id = self
            .registrations
            .find_by_id(id)
            .await?
            .ok_or(CampusFlowError::RegistrationNotFound { registration_id: id })?
            .event_id;

        let mut tx = self.pool.begin().await?;

        // Same lock order as admission: event row first, then the registration
        let event = EventRepository::lock_for_update(&mut tx, event_id)
            .await?
            .ok_or(CampusFlowError::EventNotFound { event_id })?;
        let current = RegistrationRepository::lock_for_update(&mut tx, id)
            .await?
            .ok_or(CampusFlowError::RegistrationNotFound { registration_id: id })?;
        let occupied = RegistrationRepository::count_occupied(&mut tx, event_id).await?;

        check_status_change(&event, current.status, status, occupied)?;

        let previous = current.status;
        let registration = if previous == status {
            current
        } else {
            RegistrationRepository::update_status(&mut tx, id, status).await?
        };

        tx.commit().await?;
        Ok(StatusChange { registration, previous })
    }

    async fn list_registrations_for_event(&self, event_id: Uuid) -> Result<Vec<Registration>> {
        self.registrations.get_event_registrations(event_id).await
    }

    async fn list_registrations_for_user(&self, user_id: Uuid) -> Result<Vec<RegistrationWithEvent>> {
        self.registrations.get_user_registrations(user_id).await
    }

    async fn count_occupied_seats(&self, event_id: Uuid) -> Result<i64> {
        self.registrations.get_occupied_count(event_id).await
    }

    async fn upsert_vote(&self, event_id: Uuid, user_id: Uuid, target_id: &str, value: &Value) -> Result<VoteOutcome> {
        match self.votes.upsert(event_id, user_id, target_id, value).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => match db_error_code(&e) {
                Some((code, _)) if code == FOREIGN_KEY_VIOLATION => Err(CampusFlowError::EventNotFound { event_id }),
                _ => Err(e),
            },
        }
    }

    async fn tally_votes(&self, event_id: Uuid) -> Result<Vec<VoteTally>> {
        self.votes.tally(event_id).await
    }

    async fn list_votes_for_user(&self, event_id: Uuid, user_id: Uuid) -> Result<Vec<Vote>> {
        self.votes.get_user_votes(event_id, user_id).await
    }
}
