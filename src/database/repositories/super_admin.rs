//! Super admin repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::super_admin::{NewSuperAdmin, SuperAdmin};
use crate::utils::errors::ShepherdError;

const ADMIN_COLUMNS: &str = "id, email, password_hash, full_name, last_login_at, created_at";

#[derive(Clone, Debug)]
pub struct SuperAdminRepository {
    pool: PgPool,
}

impl SuperAdminRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new super admin
    pub async fn create(&self, admin: NewSuperAdmin) -> Result<SuperAdmin, ShepherdError> {
        sqlx::query_as::<_, SuperAdmin>(&format!(
            r#"
            INSERT INTO super_admins (email, password_hash, full_name, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING {ADMIN_COLUMNS}
            "#
        ))
        .bind(admin.email)
        .bind(admin.password_hash)
        .bind(admin.full_name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ShepherdError::on_unique_violation(e, "A super admin with this email already exists"))
    }

    /// Find super admin by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<SuperAdmin>, ShepherdError> {
        let admin = sqlx::query_as::<_, SuperAdmin>(&format!("SELECT {ADMIN_COLUMNS} FROM super_admins WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(admin)
    }

    /// Find super admin by email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<SuperAdmin>, ShepherdError> {
        let admin = sqlx::query_as::<_, SuperAdmin>(&format!("SELECT {ADMIN_COLUMNS} FROM super_admins WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(admin)
    }

    /// Count super admins
    pub async fn count(&self) -> Result<i64, ShepherdError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM super_admins")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    /// Record a successful login
    pub async fn touch_login(&self, id: i64) -> Result<(), ShepherdError> {
        sqlx::query("UPDATE super_admins SET last_login_at = $2 WHERE id = $1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
