//! Event repository implementation

use sqlx::PgPool;
use chrono::{DateTime, Utc};
use crate::models::checkin::PublicEvent;
use crate::models::event::{CreateEventRequest, Event, EventFilter, EventType, UpdateEventRequest};
use crate::utils::errors::ShepherdError;

const EVENT_COLUMNS: &str = "id, church_id, title, event_type, description, starts_at, ends_at, location, is_active, created_by, created_at, updated_at";

const FILTER_CLAUSE: &str = "church_id = $1 AND ($2::timestamptz IS NULL OR starts_at >= $2) AND ($3::timestamptz IS NULL OR starts_at <= $3) AND ($4 = FALSE OR (starts_at >= NOW() AND is_active = TRUE))";

#[derive(Clone, Debug)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new event
    pub async fn create(&self, church_id: i64, created_by: Option<i64>, request: CreateEventRequest) -> Result<Event, ShepherdError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (church_id, title, event_type, description, starts_at, ends_at, location, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(church_id)
        .bind(request.title.trim())
        .bind(request.event_type.unwrap_or(EventType::Service).as_str())
        .bind(request.description)
        .bind(request.starts_at)
        .bind(request.ends_at)
        .bind(request.location)
        .bind(created_by)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    /// Find event within a church
    pub async fn find_by_id(&self, church_id: i64, id: i64) -> Result<Option<Event>, ShepherdError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE church_id = $1 AND id = $2"
        ))
        .bind(church_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// List events with filters
    pub async fn list(&self, church_id: i64, filter: &EventFilter, limit: i64, offset: i64) -> Result<Vec<Event>, ShepherdError> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE {FILTER_CLAUSE} ORDER BY starts_at ASC, id ASC LIMIT $5 OFFSET $6"
        ))
        .bind(church_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.upcoming)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Count events matching filters
    pub async fn count(&self, church_id: i64, filter: &EventFilter) -> Result<i64, ShepherdError> {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM events WHERE {FILTER_CLAUSE}"))
            .bind(church_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.upcoming)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    /// Active events starting inside a window, for the public check-in page
    pub async fn list_active_between(&self, church_id: i64, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<PublicEvent>, ShepherdError> {
        let events = sqlx::query_as::<_, PublicEvent>(
            r#"
            SELECT id, title, starts_at FROM events
            WHERE church_id = $1 AND is_active = TRUE AND starts_at >= $2 AND starts_at < $3
            ORDER BY starts_at ASC
            "#
        )
        .bind(church_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Update event
    pub async fn update(&self, church_id: i64, id: i64, request: UpdateEventRequest) -> Result<Event, ShepherdError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events
            SET title = COALESCE($3, title),
                event_type = COALESCE($4, event_type),
                description = COALESCE($5, description),
                starts_at = COALESCE($6, starts_at),
                ends_at = COALESCE($7, ends_at),
                location = COALESCE($8, location),
                is_active = COALESCE($9, is_active),
                updated_at = $10
            WHERE church_id = $1 AND id = $2
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(church_id)
        .bind(id)
        .bind(request.title)
        .bind(request.event_type.map(|t| t.as_str()))
        .bind(request.description)
        .bind(request.starts_at)
        .bind(request.ends_at)
        .bind(request.location)
        .bind(request.is_active)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        event.ok_or_else(|| ShepherdError::not_found("Event", id))
    }

    /// Delete event
    pub async fn delete(&self, church_id: i64, id: i64) -> Result<bool, ShepherdError> {
        let result = sqlx::query("DELETE FROM events WHERE church_id = $1 AND id = $2")
            .bind(church_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count upcoming active events
    pub async fn count_upcoming(&self, church_id: i64) -> Result<i64, ShepherdError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM events WHERE church_id = $1 AND is_active = TRUE AND starts_at >= NOW()"
        )
        .bind(church_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }
}
