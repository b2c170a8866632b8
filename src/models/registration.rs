//! Registration model

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use chrono::{DateTime, Utc};
use uuid::Uuid;
use super::event::EventSummary;

/// Lifecycle status of a registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Pending,
    Confirmed,
    Waitlisted,
    Rejected,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Waitlisted => "waitlisted",
            RegistrationStatus::Rejected => "rejected",
        }
    }

    /// Whether a registration in this status takes up a seat
    pub fn occupies_seat(&self) -> bool {
        matches!(self, RegistrationStatus::Pending | RegistrationStatus::Confirmed)
    }

    /// Allowed status changes
    ///
    /// Writing the current value is always allowed and is a no-op.
    pub fn can_transition_to(&self, next: RegistrationStatus) -> bool {
        use RegistrationStatus::*;

        if *self == next {
            return true;
        }

        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Waitlisted)
                | (Pending, Rejected)
                | (Waitlisted, Pending)
                | (Waitlisted, Confirmed)
                | (Waitlisted, Rejected)
                | (Confirmed, Waitlisted)
                | (Confirmed, Rejected)
                | (Rejected, Pending)
        )
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RegistrationStatus::Pending),
            "confirmed" => Ok(RegistrationStatus::Confirmed),
            "waitlisted" => Ok(RegistrationStatus::Waitlisted),
            "rejected" => Ok(RegistrationStatus::Rejected),
            other => Err(format!("Invalid status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: RegistrationStatus,
    pub responses: Map<String, Value>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration to be inserted by the ledger
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub responses: Map<String, Value>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

/// A caller's registration together with the event it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationWithEvent {
    #[serde(flatten)]
    pub registration: Registration,
    pub event: EventSummary,
}

/// Result of a status write
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub registration: Registration,
    pub previous: RegistrationStatus,
}

impl StatusChange {
    pub fn changed(&self) -> bool {
        self.previous != self.registration.status
    }
}

/// Body of `POST /registrations/:eventId`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub responses: Map<String, Value>,
}

/// Body of `PUT /registrations/:id`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}
