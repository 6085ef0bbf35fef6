//! Visitor repository implementation

use sqlx::{PgConnection, PgPool};
use chrono::{NaiveDate, Utc};
use crate::models::visitor::{FollowUpStatus, UpdateVisitorRequest, Visitor, VisitorFilter};
use crate::utils::errors::ShepherdError;

const VISITOR_COLUMNS: &str = "id, church_id, first_name, last_name, email, phone, visit_date, invited_by, notes, follow_up_status, converted_member_id, created_at, updated_at";

const FILTER_CLAUSE: &str = "church_id = $1 AND ($2::date IS NULL OR visit_date >= $2) AND ($3::date IS NULL OR visit_date <= $3) AND ($4::text IS NULL OR follow_up_status = $4)";

/// Visitor row ready for insertion
#[derive(Debug, Clone)]
pub struct NewVisitor {
    pub church_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub visit_date: NaiveDate,
    pub invited_by: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug)]
pub struct VisitorRepository {
    pool: PgPool,
}

impl VisitorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new visitor
    pub async fn create(&self, visitor: NewVisitor) -> Result<Visitor, ShepherdError> {
        let visitor = sqlx::query_as::<_, Visitor>(&format!(
            r#"
            INSERT INTO visitors (church_id, first_name, last_name, email, phone, visit_date, invited_by, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING {VISITOR_COLUMNS}
            "#
        ))
        .bind(visitor.church_id)
        .bind(visitor.first_name)
        .bind(visitor.last_name)
        .bind(visitor.email)
        .bind(visitor.phone)
        .bind(visitor.visit_date)
        .bind(visitor.invited_by)
        .bind(visitor.notes)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(visitor)
    }

    /// Find visitor within a church
    pub async fn find_by_id(&self, church_id: i64, id: i64) -> Result<Option<Visitor>, ShepherdError> {
        let visitor = sqlx::query_as::<_, Visitor>(&format!(
            "SELECT {VISITOR_COLUMNS} FROM visitors WHERE church_id = $1 AND id = $2"
        ))
        .bind(church_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(visitor)
    }

    /// Lock a visitor row for the rest of the transaction
    pub async fn find_for_update_with(conn: &mut PgConnection, church_id: i64, id: i64) -> Result<Option<Visitor>, ShepherdError> {
        let visitor = sqlx::query_as::<_, Visitor>(&format!(
            "SELECT {VISITOR_COLUMNS} FROM visitors WHERE church_id = $1 AND id = $2 FOR UPDATE"
        ))
        .bind(church_id)
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(visitor)
    }

    /// List visitors with filters
    pub async fn list(&self, church_id: i64, filter: &VisitorFilter, limit: i64, offset: i64) -> Result<Vec<Visitor>, ShepherdError> {
        let visitors = sqlx::query_as::<_, Visitor>(&format!(
            "SELECT {VISITOR_COLUMNS} FROM visitors WHERE {FILTER_CLAUSE} ORDER BY visit_date DESC, id DESC LIMIT $5 OFFSET $6"
        ))
        .bind(church_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(visitors)
    }

    /// Count visitors matching filters
    pub async fn count(&self, church_id: i64, filter: &VisitorFilter) -> Result<i64, ShepherdError> {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM visitors WHERE {FILTER_CLAUSE}"))
            .bind(church_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.status.map(|s| s.as_str()))
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    /// Every visitor of a church, for exports
    pub async fn list_all(&self, church_id: i64) -> Result<Vec<Visitor>, ShepherdError> {
        let visitors = sqlx::query_as::<_, Visitor>(&format!(
            "SELECT {VISITOR_COLUMNS} FROM visitors WHERE church_id = $1 ORDER BY visit_date DESC, id DESC"
        ))
        .bind(church_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(visitors)
    }

    /// Update visitor
    pub async fn update(&self, church_id: i64, id: i64, request: UpdateVisitorRequest) -> Result<Visitor, ShepherdError> {
        let visitor = sqlx::query_as::<_, Visitor>(&format!(
            r#"
            UPDATE visitors
            SET first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                email = COALESCE($5, email),
                phone = COALESCE($6, phone),
                visit_date = COALESCE($7, visit_date),
                invited_by = COALESCE($8, invited_by),
                notes = COALESCE($9, notes),
                follow_up_status = COALESCE($10, follow_up_status),
                updated_at = $11
            WHERE church_id = $1 AND id = $2
            RETURNING {VISITOR_COLUMNS}
            "#
        ))
        .bind(church_id)
        .bind(id)
        .bind(request.first_name)
        .bind(request.last_name)
        .bind(request.email)
        .bind(request.phone)
        .bind(request.visit_date)
        .bind(request.invited_by)
        .bind(request.notes)
        .bind(request.follow_up_status.map(|s| s.as_str()))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        visitor.ok_or_else(|| ShepherdError::not_found("Visitor", id))
    }

    /// Mark a visitor as converted into a member
    pub async fn mark_converted_with(conn: &mut PgConnection, church_id: i64, id: i64, member_id: i64) -> Result<Visitor, ShepherdError> {
        let visitor = sqlx::query_as::<_, Visitor>(&format!(
            r#"
            UPDATE visitors
            SET follow_up_status = $3, converted_member_id = $4, updated_at = $5
            WHERE church_id = $1 AND id = $2
            RETURNING {VISITOR_COLUMNS}
            "#
        ))
        .bind(church_id)
        .bind(id)
        .bind(FollowUpStatus::Converted.as_str())
        .bind(member_id)
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

        Ok(visitor)
    }

    /// Delete visitor
    pub async fn delete(&self, church_id: i64, id: i64) -> Result<bool, ShepherdError> {
        let result = sqlx::query("DELETE FROM visitors WHERE church_id = $1 AND id = $2")
            .bind(church_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
