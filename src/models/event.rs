//! Event model

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use super::module::{Module, ModuleKind, ModuleSpec, RegistrationConfig, VotingConfig};

/// Publication status of an event
///
/// Any value may be written at any time; there is no transition graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Draft,
    Published,
    Ongoing,
    Archived,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::Published => "published",
            EventStatus::Ongoing => "ongoing",
            EventStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(EventStatus::Draft),
            "published" => Ok(EventStatus::Published),
            "ongoing" => Ok(EventStatus::Ongoing),
            "archived" => Ok(EventStatus::Archived),
            other => Err(format!("Invalid event status: {}", other)),
        }
    }
}

/// Start and end of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Timeline {
    pub fn is_valid(&self) -> bool {
        self.start < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: EventStatus,
    pub timeline: Timeline,
    pub location: String,
    pub theme_config: Value,
    pub modules: Vec<Module>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// The attached module of the given kind, if any
    pub fn module(&self, kind: ModuleKind) -> Option<&Module> {
        self.modules.iter().find(|module| module.kind() == kind)
    }

    pub fn registration_config(&self) -> Option<&RegistrationConfig> {
        self.modules.iter().find_map(|module| match module {
            Module::Registration(config) => Some(config),
            Module::Voting(_) => None,
        })
    }

    pub fn voting_config(&self) -> Option<&VotingConfig> {
        self.modules.iter().find_map(|module| match module {
            Module::Voting(config) => Some(config),
            Module::Registration(_) => None,
        })
    }

    /// Registration capacity, when a registration module sets one
    pub fn registration_limit(&self) -> Option<u32> {
        self.registration_config()
            .and_then(|config| config.limit)
            .map(|limit| limit.get())
    }

    pub fn summary(&self) -> EventSummary {
        EventSummary {
            id: self.id,
            title: self.title.clone(),
            timeline: self.timeline,
            location: self.location.clone(),
            status: self.status,
        }
    }
}

/// Short form of an event embedded in other listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub id: Uuid,
    pub title: String,
    pub timeline: Timeline,
    pub location: String,
    pub status: EventStatus,
}

/// Body of `POST /events`
///
/// Required fields are optional here so that their absence is reported as a
/// validation error rather than a decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<EventStatus>,
    pub timeline: Option<Timeline>,
    pub location: Option<String>,
    pub theme_config: Option<Value>,
    pub modules: Option<Vec<ModuleSpec>>,
}

/// Body of `PUT /events/:id`; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<EventStatus>,
    pub timeline: Option<Timeline>,
    pub location: Option<String>,
    pub theme_config: Option<Value>,
    pub modules: Option<Vec<ModuleSpec>>,
}

/// A fully validated event ready to be stored
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub organizer_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: EventStatus,
    pub timeline: Timeline,
    pub location: String,
    pub theme_config: Value,
    pub modules: Vec<Module>,
}

/// Filters for the public event listing
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub status: Option<EventStatus>,
    pub starts_from: Option<DateTime<Utc>>,
    pub organizer_id: Option<Uuid>,
    pub exclude_archived: bool,
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        self.status.map_or(true, |status| event.status == status)
            && self.starts_from.map_or(true, |from| event.timeline.start >= from)
            && self.organizer_id.map_or(true, |organizer| event.organizer_id == organizer)
            && !(self.exclude_archived && event.status == EventStatus::Archived)
    }
}
