//! Test data builders
//!
//! Principals and event payloads filled with fake but plausible values.

use chrono::{Duration, Utc};
use fake::faker::address::en::CityName;
use fake::faker::internet::en::SafeEmail;
use fake::faker::lorem::en::{Sentence, Word};
use fake::faker::name::en::Name;
use fake::Fake;
use serde_json::{json, Value};
use uuid::Uuid;
use CampusFlow::models::{CreateEventRequest, ModuleSpec, Principal, Role, Timeline};

pub fn principal(role: Role) -> Principal {
    Principal {
        name: Some(Name().fake()),
        email: Some(SafeEmail().fake()),
        ..Principal::new(Uuid::new_v4(), role)
    }
}

pub fn student() -> Principal {
    principal(Role::Student)
}

pub fn organizer() -> Principal {
    principal(Role::Organizer)
}

pub fn admin() -> Principal {
    principal(Role::Admin)
}

/// A timeline a week from now, three hours long
pub fn next_week() -> Timeline {
    let start = Utc::now() + Duration::days(7);
    Timeline {
        start,
        end: start + Duration::hours(3),
    }
}

pub fn event_title() -> String {
    let word: String = Word().fake();
    format!("{} Night", word)
}

/// JSON body for `POST /events` with the given modules
pub fn event_body(modules: Value) -> Value {
    let description: String = Sentence(4..10).fake();
    let location: String = CityName().fake();

    json!({
        "title": event_title(),
        "description": description,
        "location": location,
        "timeline": next_week(),
        "modules": modules,
    })
}

pub fn registration_module(limit: Option<u32>) -> Value {
    match limit {
        Some(limit) => json!({ "type": "registration", "config": { "limit": limit } }),
        None => json!({ "type": "registration", "config": {} }),
    }
}

pub fn voting_module(polls: &[&str]) -> Value {
    let polls: Vec<Value> = polls
        .iter()
        .map(|id| json!({ "id": id, "question": format!("Pick a {}", id), "options": ["a", "b"] }))
        .collect();

    json!({ "type": "voting", "config": { "polls": polls } })
}

/// Typed request for building events through the services directly
pub fn create_event_request(modules: Vec<ModuleSpec>) -> CreateEventRequest {
    CreateEventRequest {
        title: Some(event_title()),
        description: Some(Sentence(4..10).fake()),
        location: Some(CityName().fake()),
        timeline: Some(next_week()),
        modules: Some(modules),
        ..CreateEventRequest::default()
    }
}
