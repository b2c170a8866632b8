//! Vote repository implementation

use sqlx::{FromRow, PgPool};
use sqlx::types::Json;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;
use crate::models::{Vote, VoteOutcome, VoteTally};
use crate::utils::errors::Result;

const VOTE_COLUMNS: &str = "id, event_id, user_id, target_id, value, created_at, updated_at";

#[derive(Debug, FromRow)]
struct VoteRow {
    id: Uuid,
    event_id: Uuid,
    user_id: Uuid,
    target_id: String,
    value: Json<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<VoteRow> for Vote {
    fn from(row: VoteRow) -> Self {
        Vote {
            id: row.id,
            event_id: row.event_id,
            user_id: row.user_id,
            target_id: row.target_id,
            value: row.value.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    vote: VoteRow,
    created: bool,
}

#[derive(Debug, FromRow)]
struct TallyRow {
    target_id: String,
    value: Json<Value>,
    count: i64,
}

#[derive(Debug, Clone)]
pub struct VoteRepository {
    pool: PgPool,
}

impl VoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a vote or replace the value of the existing one
    ///
    /// `xmax` is zero only for a freshly inserted tuple, which tells the
    /// caller whether this was a new vote.
    pub async fn upsert(&self, event_id: Uuid, user_id: Uuid, target_id: &str, value: &Value) -> Result<VoteOutcome> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, UpsertRow>(&format!(
            r#"
            INSERT INTO votes (id, event_id, user_id, target_id, value, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ON CONFLICT (event_id, user_id, target_id)
            DO UPDATE SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at
            RETURNING {VOTE_COLUMNS}, (xmax = 0) AS created
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(event_id)
        .bind(user_id)
        .bind(target_id)
        .bind(Json(value))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(VoteOutcome { vote: row.vote.into(), created: row.created })
    }

    /// Count votes per target and value
    pub async fn tally(&self, event_id: Uuid) -> Result<Vec<VoteTally>> {
        let rows = sqlx::query_as::<_, TallyRow>(
            r#"
            SELECT target_id, value, COUNT(*) AS count
            FROM votes
            WHERE event_id = $1
            GROUP BY target_id, value
            ORDER BY target_id ASC, count DESC
            "#
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| VoteTally { target_id: row.target_id, value: row.value.0, count: row.count })
            .collect())
    }

    /// Get a user's votes for an event
    pub async fn get_user_votes(&self, event_id: Uuid, user_id: Uuid) -> Result<Vec<Vote>> {
        let rows = sqlx::query_as::<_, VoteRow>(&format!(
            "SELECT {VOTE_COLUMNS} FROM votes WHERE event_id = $1 AND user_id = $2 ORDER BY target_id ASC"
        ))
        .bind(event_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Vote::from).collect())
    }
}
