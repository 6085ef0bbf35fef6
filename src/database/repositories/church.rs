//! Church repository implementation

use sqlx::{PgConnection, PgPool};
use chrono::Utc;
use crate::models::church::{Church, CreateChurchRequest, UpdateChurchRequest};
use crate::models::report::ChurchOverview;
use crate::utils::errors::ShepherdError;

const CHURCH_COLUMNS: &str = "id, name, slug, email, phone, address, utc_offset_minutes, checkin_pin_hash, checkin_enabled, is_active, created_at, updated_at";

const OVERVIEW_SELECT: &str = r#"
    SELECT c.id, c.name, c.slug, c.email, c.is_active,
           s.plan, s.status AS subscription_status, s.trial_ends_at,
           (SELECT COUNT(*) FROM members m WHERE m.church_id = c.id) AS member_count,
           (SELECT COUNT(*) FROM church_users u WHERE u.church_id = c.id) AS user_count,
           c.created_at
    FROM churches c
    LEFT JOIN subscriptions s ON s.church_id = c.id
"#;

#[derive(Clone, Debug)]
pub struct ChurchRepository {
    pool: PgPool,
}

impl ChurchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new church on an existing connection or transaction
    pub async fn create_with(conn: &mut PgConnection, request: CreateChurchRequest) -> Result<Church, ShepherdError> {
        sqlx::query_as::<_, Church>(&format!(
            r#"
            INSERT INTO churches (name, slug, email, phone, address, utc_offset_minutes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING {CHURCH_COLUMNS}
            "#
        ))
        .bind(request.name)
        .bind(request.slug)
        .bind(request.email)
        .bind(request.phone)
        .bind(request.address)
        .bind(request.utc_offset_minutes)
        .bind(Utc::now())
        .fetch_one(conn)
        .await
        .map_err(|e| ShepherdError::on_unique_violation(e, "A church with this slug already exists"))
    }

    /// Find church by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Church>, ShepherdError> {
        let church = sqlx::query_as::<_, Church>(&format!("SELECT {CHURCH_COLUMNS} FROM churches WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(church)
    }

    /// Find church by its public slug
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Church>, ShepherdError> {
        let church = sqlx::query_as::<_, Church>(&format!("SELECT {CHURCH_COLUMNS} FROM churches WHERE slug = $1"))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        Ok(church)
    }

    /// Check whether a slug is taken
    pub async fn slug_exists(&self, slug: &str) -> Result<bool, ShepherdError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM churches WHERE slug = $1")
            .bind(slug)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0 > 0)
    }

    /// Update church profile
    pub async fn update(&self, id: i64, request: UpdateChurchRequest) -> Result<Church, ShepherdError> {
        let church = sqlx::query_as::<_, Church>(&format!(
            r#"
            UPDATE churches
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address),
                utc_offset_minutes = COALESCE($6, utc_offset_minutes),
                updated_at = $7
            WHERE id = $1
            RETURNING {CHURCH_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.name)
        .bind(request.email)
        .bind(request.phone)
        .bind(request.address)
        .bind(request.utc_offset_minutes)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        church.ok_or_else(|| ShepherdError::not_found("Church", id))
    }

    /// Enable or disable the public check-in link, optionally replacing the PIN
    pub async fn update_checkin_link(&self, id: i64, enabled: bool, pin_hash: Option<String>) -> Result<Church, ShepherdError> {
        let church = sqlx::query_as::<_, Church>(&format!(
            r#"
            UPDATE churches
            SET checkin_enabled = $2,
                checkin_pin_hash = COALESCE($3, checkin_pin_hash),
                updated_at = $4
            WHERE id = $1
            RETURNING {CHURCH_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(enabled)
        .bind(pin_hash)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        church.ok_or_else(|| ShepherdError::not_found("Church", id))
    }

    /// Activate or suspend a tenant
    pub async fn set_active(&self, id: i64, is_active: bool) -> Result<Church, ShepherdError> {
        let church = sqlx::query_as::<_, Church>(&format!(
            "UPDATE churches SET is_active = $2, updated_at = $3 WHERE id = $1 RETURNING {CHURCH_COLUMNS}"
        ))
        .bind(id)
        .bind(is_active)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        church.ok_or_else(|| ShepherdError::not_found("Church", id))
    }

    /// List churches for the admin console
    pub async fn list_overview(&self, pattern: Option<&str>, limit: i64, offset: i64) -> Result<Vec<ChurchOverview>, ShepherdError> {
        let churches = sqlx::query_as::<_, ChurchOverview>(&format!(
            r#"
            {OVERVIEW_SELECT}
            WHERE ($1::text IS NULL OR c.name ILIKE $1 OR c.slug ILIKE $1 OR c.email ILIKE $1)
            ORDER BY c.created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(churches)
    }

    /// Count churches matching an admin search
    pub async fn count_overview(&self, pattern: Option<&str>) -> Result<i64, ShepherdError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM churches c WHERE ($1::text IS NULL OR c.name ILIKE $1 OR c.slug ILIKE $1 OR c.email ILIKE $1)"
        )
        .bind(pattern)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    /// Single church for the admin console
    pub async fn find_overview(&self, id: i64) -> Result<Option<ChurchOverview>, ShepherdError> {
        let church = sqlx::query_as::<_, ChurchOverview>(&format!("{OVERVIEW_SELECT} WHERE c.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(church)
    }

    /// Count churches, optionally only active ones
    pub async fn count(&self, only_active: bool) -> Result<i64, ShepherdError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM churches WHERE ($1 = FALSE OR is_active = TRUE)")
            .bind(only_active)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
