//! Authenticated principal model

use std::fmt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role carried by an authenticated principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Organizer,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Student => write!(f, "student"),
            Role::Organizer => write!(f, "organizer"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// The actor behind a request, as vouched for by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Principal {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self {
            id,
            role,
            name: None,
            email: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Organizers and admins may create events
    pub fn can_organize(&self) -> bool {
        matches!(self.role, Role::Organizer | Role::Admin)
    }

    /// Whether this principal may manage an event organised by `organizer_id`
    pub fn can_manage(&self, organizer_id: Uuid) -> bool {
        self.is_admin() || self.id == organizer_id
    }
}
