//! Registration ledger

use std::sync::Arc;
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;
use crate::database::Store;
use crate::models::{
    ModuleKind, NewRegistration, Principal, Registration, RegistrationStatus, RegistrationWithEvent,
};
use crate::services::events::require_module;
use crate::services::notification::NotificationService;
use crate::utils::errors::{CampusFlowError, Result};
use crate::utils::logging::log_registration_change;

#[derive(Clone)]
pub struct RegistrationLedger {
    store: Arc<dyn Store>,
    notifications: NotificationService,
}

impl RegistrationLedger {
    pub fn new(store: Arc<dyn Store>, notifications: NotificationService) -> Self {
        Self { store, notifications }
    }

    /// Register the caller for an event with status `pending`
    ///
    /// Duplicate and capacity checks run inside the store together with the
    /// insert.
    pub async fn register(&self, principal: &Principal, event_id: Uuid, responses: Map<String, Value>) -> Result<Registration> {
        let event = self
            .store
            .find_event(event_id)
            .await?
            .ok_or(CampusFlowError::EventNotFound { event_id })?;
        require_module(&event, ModuleKind::Registration)?;

        let registration = self
            .store
            .insert_registration(NewRegistration {
                event_id,
                user_id: principal.id,
                responses,
                user_name: principal.name.clone(),
                user_email: principal.email.clone(),
            })
            .await?;

        info!(
            registration_id = %registration.id,
            event_id = %event_id,
            user_id = %principal.id,
            "Registration created"
        );

        Ok(registration)
    }

    /// Change a registration's status on behalf of the event's organizer or an admin
    pub async fn set_status(&self, principal: &Principal, registration_id: Uuid, status: Option<&str>) -> Result<Registration> {
        let registration = self
            .store
            .find_registration(registration_id)
            .await?
            .ok_or(CampusFlowError::RegistrationNotFound { registration_id })?;
        let event = self
            .store
            .find_event(registration.event_id)
            .await?
            .ok_or(CampusFlowError::EventNotFound { event_id: registration.event_id })?;

        if !principal.can_manage(event.organizer_id) {
            return Err(CampusFlowError::Unauthorized("Not authorized".to_string()));
        }

        let status: RegistrationStatus = status
            .ok_or_else(|| CampusFlowError::Validation("Invalid status".to_string()))?
            .parse()
            .map_err(CampusFlowError::Validation)?;

        let change = self.store.set_registration_status(registration_id, status).await?;

        if change.changed() {
            log_registration_change(registration_id, principal.id, change.previous, status);
            self.notifications.registration_status_changed(&event, &change).await;
        }

        Ok(change.registration)
    }

    pub async fn list_for_user(&self, principal: &Principal) -> Result<Vec<RegistrationWithEvent>> {
        self.store.list_registrations_for_user(principal.id).await
    }

    /// Registrations of one event; organizer or admin only
    pub async fn list_for_event(&self, principal: &Principal, event_id: Uuid) -> Result<Vec<Registration>> {
        let event = self
            .store
            .find_event(event_id)
            .await?
            .ok_or(CampusFlowError::EventNotFound { event_id })?;

        if !principal.can_manage(event.organizer_id) {
            return Err(CampusFlowError::Unauthorized(
                "Not authorized to view registrations for this event".to_string(),
            ));
        }

        self.store.list_registrations_for_event(event_id).await
    }
}
