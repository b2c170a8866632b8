//! Vote ledger
//!
//! One recorded value per `(event, user, target)`; casting again replaces it.

use std::sync::Arc;
use uuid::Uuid;
use crate::database::Store;
use crate::models::{is_scalar, CastVoteRequest, Module, ModuleKind, Principal, Vote, VoteOutcome, VoteTally};
use crate::services::events::require_module;
use crate::utils::errors::{CampusFlowError, Result};
use crate::utils::logging::log_vote_cast;

#[derive(Clone)]
pub struct VoteLedger {
    store: Arc<dyn Store>,
}

impl VoteLedger {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn cast_or_update(&self, principal: &Principal, event_id: Uuid, request: CastVoteRequest) -> Result<VoteOutcome> {
        let target_id = match request.target_id {
            Some(target) if !target.trim().is_empty() => target,
            _ => return Err(CampusFlowError::Validation("Please provide a targetId".to_string())),
        };
        let value = match request.value {
            Some(value) if is_scalar(&value) => value,
            Some(_) => {
                return Err(CampusFlowError::Validation(
                    "Vote value must be a string, number or boolean".to_string(),
                ))
            }
            None => return Err(CampusFlowError::Validation("Please provide a value".to_string())),
        };

        let event = self
            .store
            .find_event(event_id)
            .await?
            .ok_or(CampusFlowError::EventNotFound { event_id })?;

        if let Module::Voting(config) = require_module(&event, ModuleKind::Voting)? {
            if !config.accepts_target(&target_id) {
                return Err(CampusFlowError::Validation(format!("Unknown poll: {}", target_id)));
            }
        }

        let outcome = self.store.upsert_vote(event_id, principal.id, &target_id, &value).await?;
        log_vote_cast(event_id, principal.id, &target_id, outcome.created);

        Ok(outcome)
    }

    /// Vote counts per `(target, value)`, read from committed votes
    pub async fn aggregate(&self, event_id: Uuid) -> Result<Vec<VoteTally>> {
        if self.store.find_event(event_id).await?.is_none() {
            return Err(CampusFlowError::EventNotFound { event_id });
        }

        self.store.tally_votes(event_id).await
    }

    pub async fn list_for_user(&self, principal: &Principal, event_id: Uuid) -> Result<Vec<Vote>> {
        self.store.list_votes_for_user(event_id, principal.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use crate::database::MemoryStore;
    use crate::models::{EventStatus, NewEvent, PollSpec, Role, Timeline, VotingConfig};

    async fn setup(modules: Vec<Module>) -> (VoteLedger, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let start = Utc::now();
        let event = store
            .create_event(NewEvent {
                organizer_id: Uuid::new_v4(),
                title: "Demo Day".to_string(),
                description: "Pick the best project".to_string(),
                status: EventStatus::Published,
                timeline: Timeline { start, end: start + Duration::hours(2) },
                location: "Auditorium".to_string(),
                theme_config: json!({}),
                modules,
            })
            .await
            .unwrap();

        (VoteLedger::new(store), event.id)
    }

    fn poll(id: &str) -> Module {
        Module::Voting(VotingConfig {
            polls: vec![PollSpec { id: id.to_string(), question: "Ship it?".to_string(), options: vec![] }],
        })
    }

    fn cast(target: &str, value: Value) -> CastVoteRequest {
        CastVoteRequest { target_id: Some(target.to_string()), value: Some(value) }
    }

    #[tokio::test]
    async fn test_recast_replaces_value() {
        let (ledger, event_id) = setup(vec![poll("p1")]).await;
        let voter = Principal::new(Uuid::new_v4(), Role::Student);

        let first = ledger.cast_or_update(&voter, event_id, cast("p1", json!("yes"))).await.unwrap();
        assert!(first.created);

        let second = ledger.cast_or_update(&voter, event_id, cast("p1", json!("no"))).await.unwrap();
        assert!(!second.created);
        assert_eq!(second.vote.id, first.vote.id);

        let tallies = ledger.aggregate(event_id).await.unwrap();
        assert_eq!(tallies, vec![VoteTally { target_id: "p1".to_string(), value: json!("no"), count: 1 }]);
    }

    #[tokio::test]
    async fn test_counts_distinct_voters() {
        let (ledger, event_id) = setup(vec![poll("p1")]).await;

        for _ in 0..3 {
            let voter = Principal::new(Uuid::new_v4(), Role::Student);
            ledger.cast_or_update(&voter, event_id, cast("p1", json!(true))).await.unwrap();
            ledger.cast_or_update(&voter, event_id, cast("p1", json!(true))).await.unwrap();
        }

        let tallies = ledger.aggregate(event_id).await.unwrap();
        assert_eq!(tallies.iter().map(|t| t.count).sum::<i64>(), 3);
    }

    #[tokio::test]
    async fn test_rejects_bad_votes() {
        let (ledger, event_id) = setup(vec![poll("p1")]).await;
        let voter = Principal::new(Uuid::new_v4(), Role::Student);

        assert_matches!(
            ledger.cast_or_update(&voter, event_id, cast("p2", json!("yes"))).await,
            Err(CampusFlowError::Validation(_))
        );
        assert_matches!(
            ledger.cast_or_update(&voter, event_id, cast("p1", json!({"nested": 1}))).await,
            Err(CampusFlowError::Validation(_))
        );
        assert_matches!(
            ledger.cast_or_update(&voter, event_id, CastVoteRequest::default()).await,
            Err(CampusFlowError::Validation(_))
        );
    }

    #[tokio::test]
    async fn test_requires_voting_module() {
        let (ledger, event_id) = setup(vec![]).await;
        let voter = Principal::new(Uuid::new_v4(), Role::Student);

        assert_matches!(
            ledger.cast_or_update(&voter, event_id, cast("p1", json!("yes"))).await,
            Err(CampusFlowError::ModuleNotEnabled { module: ModuleKind::Voting })
        );
    }

    #[tokio::test]
    async fn test_pollless_module_accepts_any_target() {
        let (ledger, event_id) = setup(vec![Module::Voting(VotingConfig::default())]).await;
        let voter = Principal::new(Uuid::new_v4(), Role::Student);

        ledger.cast_or_update(&voter, event_id, cast("best-demo", json!(3))).await.unwrap();
        let mine = ledger.list_for_user(&voter, event_id).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].target_id, "best-demo");
    }
}
