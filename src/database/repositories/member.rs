//! Member repository implementation

use sqlx::{PgConnection, PgPool};
use chrono::Utc;
use crate::models::checkin::PublicMember;
use crate::models::member::{CreateMemberRequest, Member, MemberStatus, UpdateMemberRequest};
use crate::utils::errors::ShepherdError;

const MEMBER_COLUMNS: &str = "id, church_id, first_name, last_name, email, phone, gender, date_of_birth, address, status, joined_on, biometric_hash, notes, created_at, updated_at";

const SEARCH_CLAUSE: &str = "($2::text IS NULL OR first_name ILIKE $2 OR last_name ILIKE $2 OR (first_name || ' ' || last_name) ILIKE $2 OR email ILIKE $2 OR phone ILIKE $2)";

#[derive(Clone, Debug)]
pub struct MemberRepository {
    pool: PgPool,
}

impl MemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a member on an existing connection or transaction
    pub async fn create_with(conn: &mut PgConnection, church_id: i64, request: CreateMemberRequest) -> Result<Member, ShepherdError> {
        let member = sqlx::query_as::<_, Member>(&format!(
            r#"
            INSERT INTO members (church_id, first_name, last_name, email, phone, gender, date_of_birth, address, status, joined_on, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
            RETURNING {MEMBER_COLUMNS}
            "#
        ))
        .bind(church_id)
        .bind(request.first_name.trim())
        .bind(request.last_name.trim())
        .bind(request.email)
        .bind(request.phone)
        .bind(request.gender)
        .bind(request.date_of_birth)
        .bind(request.address)
        .bind(request.status.unwrap_or(MemberStatus::Active).as_str())
        .bind(request.joined_on)
        .bind(request.notes)
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

        Ok(member)
    }

    /// Create a new member
    pub async fn create(&self, church_id: i64, request: CreateMemberRequest) -> Result<Member, ShepherdError> {
        let mut conn = self.pool.acquire().await?;
        Self::create_with(&mut conn, church_id, request).await
    }

    /// Find member within a church
    pub async fn find_by_id(&self, church_id: i64, id: i64) -> Result<Option<Member>, ShepherdError> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE church_id = $1 AND id = $2"
        ))
        .bind(church_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    /// List members with search and pagination
    pub async fn list(&self, church_id: i64, pattern: Option<&str>, status: Option<MemberStatus>, limit: i64, offset: i64) -> Result<Vec<Member>, ShepherdError> {
        let members = sqlx::query_as::<_, Member>(&format!(
            r#"
            SELECT {MEMBER_COLUMNS} FROM members
            WHERE church_id = $1 AND {SEARCH_CLAUSE} AND ($3::text IS NULL OR status = $3)
            ORDER BY last_name ASC, first_name ASC, id ASC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(church_id)
        .bind(pattern)
        .bind(status.map(|s| s.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// Count members matching a directory search
    pub async fn count(&self, church_id: i64, pattern: Option<&str>, status: Option<MemberStatus>) -> Result<i64, ShepherdError> {
        let count: (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM members WHERE church_id = $1 AND {SEARCH_CLAUSE} AND ($3::text IS NULL OR status = $3)"
        ))
        .bind(church_id)
        .bind(pattern)
        .bind(status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    /// Every member of a church, for exports
    pub async fn list_all(&self, church_id: i64) -> Result<Vec<Member>, ShepherdError> {
        let members = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE church_id = $1 ORDER BY last_name ASC, first_name ASC, id ASC"
        ))
        .bind(church_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// Active members matching a name or phone search
    pub async fn search_active(&self, church_id: i64, pattern: &str, limit: i64) -> Result<Vec<Member>, ShepherdError> {
        let members = sqlx::query_as::<_, Member>(&format!(
            r#"
            SELECT {MEMBER_COLUMNS} FROM members
            WHERE church_id = $1 AND {SEARCH_CLAUSE} AND status = 'active'
            ORDER BY last_name ASC, first_name ASC
            LIMIT $3
            "#
        ))
        .bind(church_id)
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// Names only, for the public check-in page
    pub async fn search_public(&self, church_id: i64, pattern: &str, limit: i64) -> Result<Vec<PublicMember>, ShepherdError> {
        let members = sqlx::query_as::<_, PublicMember>(
            r#"
            SELECT id, first_name, last_name FROM members
            WHERE church_id = $1 AND status = 'active'
              AND (first_name ILIKE $2 OR last_name ILIKE $2 OR (first_name || ' ' || last_name) ILIKE $2)
            ORDER BY last_name ASC, first_name ASC
            LIMIT $3
            "#
        )
        .bind(church_id)
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// Update member
    pub async fn update(&self, church_id: i64, id: i64, request: UpdateMemberRequest) -> Result<Member, ShepherdError> {
        let member = sqlx::query_as::<_, Member>(&format!(
            r#"
            UPDATE members
            SET first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                email = COALESCE($5, email),
                phone = COALESCE($6, phone),
                gender = COALESCE($7, gender),
                date_of_birth = COALESCE($8, date_of_birth),
                address = COALESCE($9, address),
                status = COALESCE($10, status),
                joined_on = COALESCE($11, joined_on),
                notes = COALESCE($12, notes),
                updated_at = $13
            WHERE church_id = $1 AND id = $2
            RETURNING {MEMBER_COLUMNS}
            "#
        ))
        .bind(church_id)
        .bind(id)
        .bind(request.first_name.map(|v| v.trim().to_string()))
        .bind(request.last_name.map(|v| v.trim().to_string()))
        .bind(request.email)
        .bind(request.phone)
        .bind(request.gender)
        .bind(request.date_of_birth)
        .bind(request.address)
        .bind(request.status.map(|s| s.as_str()))
        .bind(request.joined_on)
        .bind(request.notes)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        member.ok_or_else(|| ShepherdError::not_found("Member", id))
    }

    /// Delete member
    pub async fn delete(&self, church_id: i64, id: i64) -> Result<bool, ShepherdError> {
        let result = sqlx::query("DELETE FROM members WHERE church_id = $1 AND id = $2")
            .bind(church_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Store or clear the biometric digest
    pub async fn set_biometric(&self, church_id: i64, id: i64, digest: Option<String>) -> Result<Member, ShepherdError> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "UPDATE members SET biometric_hash = $3, updated_at = $4 WHERE church_id = $1 AND id = $2 RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(church_id)
        .bind(id)
        .bind(digest)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ShepherdError::on_unique_violation(e, "This template is already enrolled for another member"))?;

        member.ok_or_else(|| ShepherdError::not_found("Member", id))
    }

    /// Find member by biometric digest
    pub async fn find_by_biometric(&self, church_id: i64, digest: &str) -> Result<Option<Member>, ShepherdError> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE church_id = $1 AND biometric_hash = $2"
        ))
        .bind(church_id)
        .bind(digest)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    /// Count members across the platform
    pub async fn count_all(&self) -> Result<i64, ShepherdError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM members")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
