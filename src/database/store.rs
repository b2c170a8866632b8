//! Persistent store abstraction
//!
//! The ledgers talk to storage only through [`Store`]. Implementations must
//! evaluate the admission guards below inside one per-event critical section
//! together with the write they protect: PostgreSQL locks the event row,
//! the in-memory store holds a single mutex.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;
use crate::models::{
    Event, EventFilter, NewEvent, NewRegistration, Registration, RegistrationStatus,
    RegistrationWithEvent, StatusChange, Vote, VoteOutcome, VoteTally, ModuleKind,
};
use crate::utils::errors::{CampusFlowError, Result};

#[async_trait]
pub trait Store: Send + Sync {
    /// Check that the backend is reachable
    async fn health_check(&self) -> Result<()>;

    async fn create_event(&self, event: NewEvent) -> Result<Event>;

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>>;

    /// Events matching `filter`, ordered by start time ascending
    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>>;

    /// Events organised by `organizer_id`, newest first
    async fn list_events_by_organizer(&self, organizer_id: Uuid) -> Result<Vec<Event>>;

    /// Overwrite the mutable fields of an existing event
    async fn update_event(&self, event: &Event) -> Result<Event>;

    /// Delete an event with its registrations and votes; `false` if it did not exist
    async fn delete_event(&self, id: Uuid) -> Result<bool>;

    /// Insert a `pending` registration after checking, under the event lock,
    /// that a registration module is attached, the pair is new and a seat is free
    async fn insert_registration(&self, registration: NewRegistration) -> Result<Registration>;

    async fn find_registration(&self, id: Uuid) -> Result<Option<Registration>>;

    /// Write a new status under the event lock, enforcing the transition table and capacity
    async fn set_registration_status(&self, id: Uuid, status: RegistrationStatus) -> Result<StatusChange>;

    async fn list_registrations_for_event(&self, event_id: Uuid) -> Result<Vec<Registration>>;

    async fn list_registrations_for_user(&self, user_id: Uuid) -> Result<Vec<RegistrationWithEvent>>;

    /// Number of registrations holding a seat (pending or confirmed)
    async fn count_occupied_seats(&self, event_id: Uuid) -> Result<i64>;

    /// Insert or replace the vote for `(event, user, target)`
    async fn upsert_vote(&self, event_id: Uuid, user_id: Uuid, target_id: &str, value: &Value) -> Result<VoteOutcome>;

    /// Counts per `(target, value)` computed from committed votes
    async fn tally_votes(&self, event_id: Uuid) -> Result<Vec<VoteTally>>;

    async fn list_votes_for_user(&self, event_id: Uuid, user_id: Uuid) -> Result<Vec<Vote>>;
}

/// Admission check for a new registration
pub fn check_admission(event: &Event, already_registered: bool, occupied: i64, user_id: Uuid) -> Result<()> {
    let config = event.registration_config().ok_or(CampusFlowError::ModuleNotEnabled {
        module: ModuleKind::Registration,
    })?;

    if already_registered {
        return Err(CampusFlowError::AlreadyRegistered { event_id: event.id, user_id });
    }

    if let Some(limit) = config.limit {
        if occupied >= i64::from(limit.get()) {
            return Err(CampusFlowError::CapacityExceeded { event_id: event.id, limit: limit.get() });
        }
    }

    Ok(())
}

/// Check a status write against the transition table and the event's capacity
///
/// `occupied` is the current seat count including `previous` when it holds one.
pub fn check_status_change(
    event: &Event,
    previous: RegistrationStatus,
    next: RegistrationStatus,
    occupied: i64,
) -> Result<()> {
    if !previous.can_transition_to(next) {
        return Err(CampusFlowError::Validation(format!(
            "Cannot change registration status from {} to {}",
            previous, next
        )));
    }

    let takes_new_seat = next.occupies_seat() && !previous.occupies_seat();
    if takes_new_seat {
        if let Some(limit) = event.registration_limit() {
            if occupied >= i64::from(limit) {
                return Err(CampusFlowError::CapacityExceeded { event_id: event.id, limit });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};
    use std::num::NonZeroU32;
    use crate::models::{EventStatus, Module, RegistrationConfig, Timeline};

    fn event_with(modules: Vec<Module>) -> Event {
        let now = Utc::now();
        Event {
            id: Uuid::new_v4(),
            organizer_id: Uuid::new_v4(),
            title: "Hack Night".to_string(),
            description: "Build things".to_string(),
            status: EventStatus::Published,
            timeline: Timeline { start: now, end: now + Duration::hours(2) },
            location: "Lab 3".to_string(),
            theme_config: serde_json::json!({}),
            modules,
            created_at: now,
            updated_at: now,
        }
    }

    fn limited(limit: u32) -> Event {
        event_with(vec![Module::Registration(RegistrationConfig { limit: NonZeroU32::new(limit) })])
    }

    #[test]
    fn test_admission_requires_module() {
        let event = event_with(vec![]);
        assert_matches!(
            check_admission(&event, false, 0, Uuid::new_v4()),
            Err(CampusFlowError::ModuleNotEnabled { module: ModuleKind::Registration })
        );
    }

    #[test]
    fn test_admission_rejects_duplicates_before_capacity() {
        let event = limited(1);
        assert_matches!(
            check_admission(&event, true, 1, Uuid::new_v4()),
            Err(CampusFlowError::AlreadyRegistered { .. })
        );
    }

    #[test]
    fn test_admission_enforces_limit() {
        let event = limited(2);
        assert!(check_admission(&event, false, 1, Uuid::new_v4()).is_ok());
        assert_matches!(
            check_admission(&event, false, 2, Uuid::new_v4()),
            Err(CampusFlowError::CapacityExceeded { limit: 2, .. })
        );
    }

    #[test]
    fn test_unlimited_registration() {
        let event = event_with(vec![Module::Registration(RegistrationConfig::default())]);
        assert!(check_admission(&event, false, 10_000, Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_status_change_rules() {
        use RegistrationStatus::*;
        let event = limited(1);

        assert!(check_status_change(&event, Pending, Confirmed, 1).is_ok());
        assert_matches!(check_status_change(&event, Rejected, Confirmed, 0), Err(CampusFlowError::Validation(_)));
        // a waitlisted registrant cannot take the only seat while it is held
        assert_matches!(
            check_status_change(&event, Waitlisted, Confirmed, 1),
            Err(CampusFlowError::CapacityExceeded { .. })
        );
        assert!(check_status_change(&event, Waitlisted, Confirmed, 0).is_ok());
    }
}
