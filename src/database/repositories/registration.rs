//! Registration repository implementation

use sqlx::{FromRow, PgConnection, PgPool};
use sqlx::types::Json;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;
use crate::models::{EventSummary, NewRegistration, Registration, RegistrationStatus, RegistrationWithEvent, Timeline};
use crate::utils::errors::{CampusFlowError, Result};

const REGISTRATION_COLUMNS: &str = "id, event_id, user_id, status, responses, user_name, user_email, created_at, updated_at";

/// Name of the unique index guarding `(event_id, user_id)`
pub const UNIQUE_EVENT_USER: &str = "registrations_event_user_key";

#[derive(Debug, FromRow)]
struct RegistrationRow {
    id: Uuid,
    event_id: Uuid,
    user_id: Uuid,
    status: String,
    responses: Json<Map<String, Value>>,
    user_name: Option<String>,
    user_email: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RegistrationRow> for Registration {
    type Error = CampusFlowError;

    fn try_from(row: RegistrationRow) -> Result<Self> {
        Ok(Registration {
            id: row.id,
            event_id: row.event_id,
            user_id: row.user_id,
            status: parse_status(&row.status)?,
            responses: row.responses.0,
            user_name: row.user_name,
            user_email: row.user_email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct RegistrationWithEventRow {
    #[sqlx(flatten)]
    registration: RegistrationRow,
    event_title: String,
    event_starts_at: DateTime<Utc>,
    event_ends_at: DateTime<Utc>,
    event_location: String,
    event_status: String,
}

fn parse_status(value: &str) -> Result<RegistrationStatus> {
    value
        .parse()
        .map_err(|e: String| CampusFlowError::Database(sqlx::Error::Decode(e.into())))
}

#[derive(Debug, Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a pending registration inside the caller's transaction
    pub async fn insert(conn: &mut PgConnection, request: NewRegistration) -> Result<Registration> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            r#"
            INSERT INTO registrations (id, event_id, user_id, status, responses, user_name, user_email, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(request.event_id)
        .bind(request.user_id)
        .bind(RegistrationStatus::Pending.as_str())
        .bind(Json(request.responses))
        .bind(request.user_name)
        .bind(request.user_email)
        .bind(now)
        .fetch_one(conn)
        .await?;

        row.try_into()
    }

    /// Find registration by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Registration>> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Registration::try_from).transpose()
    }

    /// Lock a registration row inside the caller's transaction
    pub async fn lock_for_update(conn: &mut PgConnection, id: Uuid) -> Result<Option<Registration>> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        row.map(Registration::try_from).transpose()
    }

    /// Whether the user already holds a registration for the event
    pub async fn exists(conn: &mut PgConnection, event_id: Uuid, user_id: Uuid) -> Result<bool> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM registrations WHERE event_id = $1 AND user_id = $2"
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_one(conn)
        .await?;

        Ok(count.0 > 0)
    }

    /// Count registrations holding a seat
    pub async fn count_occupied(conn: &mut PgConnection, event_id: Uuid) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM registrations WHERE event_id = $1 AND status IN ('pending', 'confirmed')"
        )
        .bind(event_id)
        .fetch_one(conn)
        .await?;

        Ok(count.0)
    }

    /// Update registration status
    pub async fn update_status(conn: &mut PgConnection, id: Uuid, status: RegistrationStatus) -> Result<Registration> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            r#"
            UPDATE registrations
            SET status = $2, updated_at = $3
            WHERE id = $1
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

        row.try_into()
    }

    /// Get registrations for an event in sign-up order
    pub async fn get_event_registrations(&self, event_id: Uuid) -> Result<Vec<Registration>> {
        let rows = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE event_id = $1 ORDER BY created_at ASC"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Registration::try_from).collect()
    }

    /// Get a user's registrations with their events
    pub async fn get_user_registrations(&self, user_id: Uuid) -> Result<Vec<RegistrationWithEvent>> {
        let rows = sqlx::query_as::<_, RegistrationWithEventRow>(
            r#"
            SELECT r.id, r.event_id, r.user_id, r.status, r.responses, r.user_name, r.user_email, r.created_at, r.updated_at,
                   e.title AS event_title, e.starts_at AS event_starts_at, e.ends_at AS event_ends_at,
                   e.location AS event_location, e.status AS event_status
            FROM registrations r
            INNER JOIN events e ON e.id = r.event_id
            WHERE r.user_id = $1
            ORDER BY r.created_at ASC
            "#
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let event = EventSummary {
                    id: row.registration.event_id,
                    title: row.event_title,
                    timeline: Timeline { start: row.event_starts_at, end: row.event_ends_at },
                    location: row.event_location,
                    status: row
                        .event_status
                        .parse()
                        .map_err(|e: String| CampusFlowError::Database(sqlx::Error::Decode(e.into())))?,
                };

                Ok(RegistrationWithEvent {
                    registration: row.registration.try_into()?,
                    event,
                })
            })
            .collect()
    }

    /// Seats held for an event, outside any transaction
    pub async fn get_occupied_count(&self, event_id: Uuid) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        Self::count_occupied(&mut conn, event_id).await
    }
}
