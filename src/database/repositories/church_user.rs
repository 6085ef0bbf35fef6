//! Church user repository implementation

use sqlx::{PgConnection, PgPool};
use chrono::Utc;
use crate::models::church_user::{ChurchRole, ChurchUser, NewChurchUser};
use crate::utils::errors::ShepherdError;

const USER_COLUMNS: &str = "id, church_id, email, password_hash, full_name, role, is_active, last_login_at, created_at, updated_at";

/// Column changes for a staff account; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct ChurchUserChanges {
    pub full_name: Option<String>,
    pub role: Option<ChurchRole>,
    pub is_active: Option<bool>,
    pub password_hash: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ChurchUserRepository {
    pool: PgPool,
}

impl ChurchUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a user on an existing connection or transaction
    pub async fn create_with(conn: &mut PgConnection, user: NewChurchUser) -> Result<ChurchUser, ShepherdError> {
        sqlx::query_as::<_, ChurchUser>(&format!(
            r#"
            INSERT INTO church_users (church_id, email, password_hash, full_name, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.church_id)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.full_name)
        .bind(user.role.as_str())
        .bind(Utc::now())
        .fetch_one(conn)
        .await
        .map_err(|e| ShepherdError::on_unique_violation(e, "An account with this email already exists"))
    }

    /// Create a new user
    pub async fn create(&self, user: NewChurchUser) -> Result<ChurchUser, ShepherdError> {
        let mut conn = self.pool.acquire().await?;
        Self::create_with(&mut conn, user).await
    }

    /// Find user within a church
    pub async fn find_by_id(&self, church_id: i64, id: i64) -> Result<Option<ChurchUser>, ShepherdError> {
        let user = sqlx::query_as::<_, ChurchUser>(&format!(
            "SELECT {USER_COLUMNS} FROM church_users WHERE church_id = $1 AND id = $2"
        ))
        .bind(church_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find user by login email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<ChurchUser>, ShepherdError> {
        let user = sqlx::query_as::<_, ChurchUser>(&format!("SELECT {USER_COLUMNS} FROM church_users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// List all users of a church
    pub async fn list(&self, church_id: i64) -> Result<Vec<ChurchUser>, ShepherdError> {
        let users = sqlx::query_as::<_, ChurchUser>(&format!(
            "SELECT {USER_COLUMNS} FROM church_users WHERE church_id = $1 ORDER BY full_name ASC"
        ))
        .bind(church_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Update user
    pub async fn update(&self, church_id: i64, id: i64, changes: ChurchUserChanges) -> Result<ChurchUser, ShepherdError> {
        let user = sqlx::query_as::<_, ChurchUser>(&format!(
            r#"
            UPDATE church_users
            SET full_name = COALESCE($3, full_name),
                role = COALESCE($4, role),
                is_active = COALESCE($5, is_active),
                password_hash = COALESCE($6, password_hash),
                updated_at = $7
            WHERE church_id = $1 AND id = $2
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(church_id)
        .bind(id)
        .bind(changes.full_name)
        .bind(changes.role.map(|r| r.as_str()))
        .bind(changes.is_active)
        .bind(changes.password_hash)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or_else(|| ShepherdError::not_found("User", id))
    }

    /// Delete user
    pub async fn delete(&self, church_id: i64, id: i64) -> Result<bool, ShepherdError> {
        let result = sqlx::query("DELETE FROM church_users WHERE church_id = $1 AND id = $2")
            .bind(church_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count active accounts, optionally restricted to one role
    pub async fn count_active(&self, church_id: i64, role: Option<ChurchRole>) -> Result<i64, ShepherdError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM church_users WHERE church_id = $1 AND is_active = TRUE AND ($2::text IS NULL OR role = $2)"
        )
        .bind(church_id)
        .bind(role.map(|r| r.as_str()))
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    /// Count users across the platform
    pub async fn count_all(&self) -> Result<i64, ShepherdError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM church_users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    /// Record a successful login
    pub async fn touch_login(&self, id: i64) -> Result<(), ShepherdError> {
        sqlx::query("UPDATE church_users SET last_login_at = $2 WHERE id = $1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
