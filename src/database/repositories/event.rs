//! Event repository implementation

use sqlx::{FromRow, PgConnection, PgPool};
use sqlx::types::Json;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;
use crate::models::{Event, EventFilter, Module, NewEvent, Timeline};
use crate::utils::errors::{CampusFlowError, Result};

const EVENT_COLUMNS: &str = "id, organizer_id, title, description, status, starts_at, ends_at, location, theme_config, modules, created_at, updated_at";

#[derive(Debug, FromRow)]
struct EventRow {
    id: Uuid,
    organizer_id: Uuid,
    title: String,
    description: String,
    status: String,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    location: String,
    theme_config: Json<Value>,
    modules: Json<Vec<Module>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = CampusFlowError;

    fn try_from(row: EventRow) -> Result<Self> {
        let status = row
            .status
            .parse()
            .map_err(|e: String| CampusFlowError::Database(sqlx::Error::Decode(e.into())))?;

        Ok(Event {
            id: row.id,
            organizer_id: row.organizer_id,
            title: row.title,
            description: row.description,
            status,
            timeline: Timeline { start: row.starts_at, end: row.ends_at },
            location: row.location,
            theme_config: row.theme_config.0,
            modules: row.modules.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new event
    pub async fn create(&self, request: NewEvent) -> Result<Event> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            INSERT INTO events (id, organizer_id, title, description, status, starts_at, ends_at, location, theme_config, modules, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(request.organizer_id)
        .bind(request.title)
        .bind(request.description)
        .bind(request.status.as_str())
        .bind(request.timeline.start)
        .bind(request.timeline.end)
        .bind(request.location)
        .bind(Json(request.theme_config))
        .bind(Json(request.modules))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    /// Find event by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Event::try_from).transpose()
    }

    /// Lock an event row for the rest of the surrounding transaction
    ///
    /// This is the per-event serialization point for registration writes.
    pub async fn lock_for_update(conn: &mut PgConnection, id: Uuid) -> Result<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 FOR UPDATE"))
            .bind(id)
            .fetch_optional(conn)
            .await?;

        row.map(Event::try_from).transpose()
    }

    /// Update event
    pub async fn update(&self, event: &Event) -> Result<Event> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            UPDATE events
            SET title = $2,
                description = $3,
                status = $4,
                starts_at = $5,
                ends_at = $6,
                location = $7,
                theme_config = $8,
                modules = $9,
                updated_at = $10
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.status.as_str())
        .bind(event.timeline.start)
        .bind(event.timeline.end)
        .bind(&event.location)
        .bind(Json(&event.theme_config))
        .bind(Json(&event.modules))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(CampusFlowError::EventNotFound { event_id: event.id })?
            .try_into()
    }

    /// Delete event; registrations and votes go with it
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List events matching a filter, soonest first
    pub async fn list(&self, filter: &EventFilter) -> Result<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            SELECT {EVENT_COLUMNS} FROM events
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::timestamptz IS NULL OR starts_at >= $2)
              AND ($3::uuid IS NULL OR organizer_id = $3)
              AND (NOT $4 OR status <> 'archived')
            ORDER BY starts_at ASC, created_at ASC
            "#
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.starts_from)
        .bind(filter.organizer_id)
        .bind(filter.exclude_archived)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Event::try_from).collect()
    }

    /// Get events created by an organizer, newest first
    pub async fn get_organizer_events(&self, organizer_id: Uuid) -> Result<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE organizer_id = $1 ORDER BY created_at DESC"
        ))
        .bind(organizer_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Event::try_from).collect()
    }
}
