//! Vote model

use serde::{Deserialize, Serialize};
use serde_json::Value;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub target_id: String,
    pub value: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of a cast: the stored vote and whether it was newly inserted
#[derive(Debug, Clone)]
pub struct VoteOutcome {
    pub vote: Vote,
    pub created: bool,
}

/// Count of votes sharing a `(targetId, value)` pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    pub target_id: String,
    pub value: Value,
    pub count: i64,
}

/// Body of `POST /votes/:eventId`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteRequest {
    pub target_id: Option<String>,
    pub value: Option<Value>,
}

/// Vote values are scalars
pub fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}
