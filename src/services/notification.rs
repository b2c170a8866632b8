//! Notification fan-out
//!
//! Informs interested parties about state transitions: a new event goes out
//! as a push broadcast, a registration status change as a push to the
//! registrant plus a queued e-mail. Nothing here can fail the caller.

use std::sync::Arc;
use serde_json::json;
use tracing::{debug, warn};
use crate::models::{Event, Registration, RegistrationStatus, StatusChange};
use crate::services::email::{EmailMessage, EmailQueue};
use crate::services::push::{PushChannel, PushMessage, PushTopic};
use crate::utils::helpers::{format_timestamp, is_valid_email};

#[derive(Clone)]
pub struct NotificationService {
    push: Arc<dyn PushChannel>,
    email: EmailQueue,
}

impl NotificationService {
    pub fn new(push: Arc<dyn PushChannel>, email: EmailQueue) -> Self {
        Self { push, email }
    }

    /// Broadcast a freshly created event
    pub async fn event_created(&self, event: &Event) {
        let payload = match serde_json::to_value(event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(event_id = %event.id, error = %e, "Failed to serialize event for push");
                return;
            }
        };

        if let Err(e) = self.push.publish(PushMessage::broadcast(PushTopic::NewEvent, payload)).await {
            warn!(event_id = %event.id, error = %e, "Failed to publish new_event");
        }
    }

    /// Tell the registrant their status changed; no-op when it did not
    pub async fn registration_status_changed(&self, event: &Event, change: &StatusChange) {
        if !change.changed() {
            return;
        }

        let registration = &change.registration;
        let payload = json!({
            "id": registration.id,
            "eventId": event.id,
            "event": event.title,
            "status": registration.status,
            "previousStatus": change.previous,
        });

        let message = PushMessage::to_user(PushTopic::RegistrationUpdate, registration.user_id, payload);
        if let Err(e) = self.push.publish(message).await {
            warn!(registration_id = %registration.id, error = %e, "Failed to publish registration_update");
        }

        match compose_status_email(event, registration) {
            Some(mail) => {
                if self.email.enqueue(mail) {
                    debug!(registration_id = %registration.id, "Status e-mail queued");
                }
            }
            None => warn!(
                registration_id = %registration.id,
                "Registrant has no e-mail address, skipping status e-mail"
            ),
        }
    }
}

/// Build the status-change mail, if the registrant left an address
pub fn compose_status_email(event: &Event, registration: &Registration) -> Option<EmailMessage> {
    let to = registration.user_email.clone().filter(|email| is_valid_email(email))?;
    let name = registration.user_name.as_deref().unwrap_or("there");

    let mut body = format!(
        "Hello {},\n\nYour registration status for \"{}\" has been updated to: {}.\n\n",
        name,
        event.title,
        registration.status.as_str().to_uppercase()
    );

    match registration.status {
        RegistrationStatus::Confirmed => body.push_str(&format!(
            "Congratulations! We look forward to seeing you at the event.\n\nDate: {}\nLocation: {}",
            format_timestamp(event.timeline.start),
            event.location
        )),
        RegistrationStatus::Rejected => body.push_str(
            "We appreciate your interest, but unfortunately we are unable to accept your registration at this time.\n\nBest regards,\nCampus Flow Team",
        ),
        RegistrationStatus::Pending | RegistrationStatus::Waitlisted => {}
    }

    Some(EmailMessage {
        to,
        subject: format!("Registration Update: {}", event.title),
        body,
    })
}
