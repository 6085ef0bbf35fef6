//! Attendance repository implementation

use sqlx::PgPool;
use chrono::{NaiveDate, Utc};
use crate::models::attendance::{AttendanceEntry, AttendanceFilter, AttendanceRecord, NewAttendance};
use crate::models::report::{DailyCount, EventCount, MethodCount};
use crate::utils::errors::ShepherdError;

const ATTENDANCE_COLUMNS: &str = "id, church_id, member_id, event_id, attendance_date, checked_in_at, method, recorded_by, notes";

const ENTRY_SELECT: &str = r#"
    SELECT a.id, a.member_id, m.first_name AS member_first_name, m.last_name AS member_last_name,
           a.event_id, e.title AS event_title, a.attendance_date, a.checked_in_at, a.method, a.notes
    FROM attendance_records a
    JOIN members m ON m.id = a.member_id
    LEFT JOIN events e ON e.id = a.event_id
"#;

const FILTER_CLAUSE: &str = "a.church_id = $1 AND ($2::date IS NULL OR a.attendance_date >= $2) AND ($3::date IS NULL OR a.attendance_date <= $3) AND ($4::bigint IS NULL OR a.event_id = $4) AND ($5::bigint IS NULL OR a.member_id = $5)";

pub const DUPLICATE_CHECK_IN: &str = "Member is already checked in for this event today";

#[derive(Clone, Debug)]
pub struct AttendanceRepository {
    pool: PgPool,
}

impl AttendanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Whether a member already has a check-in for the event (or general attendance) on a date
    pub async fn exists(&self, member_id: i64, event_id: Option<i64>, date: NaiveDate) -> Result<bool, ShepherdError> {
        let found: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM attendance_records
                WHERE member_id = $1 AND COALESCE(event_id, 0) = COALESCE($2, 0) AND attendance_date = $3
            )
            "#
        )
        .bind(member_id)
        .bind(event_id)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        Ok(found.0)
    }

    /// Record a check-in; a concurrent duplicate surfaces as a conflict
    pub async fn create(&self, attendance: NewAttendance) -> Result<AttendanceRecord, ShepherdError> {
        sqlx::query_as::<_, AttendanceRecord>(&format!(
            r#"
            INSERT INTO attendance_records (church_id, member_id, event_id, attendance_date, checked_in_at, method, recorded_by, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ATTENDANCE_COLUMNS}
            "#
        ))
        .bind(attendance.church_id)
        .bind(attendance.member_id)
        .bind(attendance.event_id)
        .bind(attendance.attendance_date)
        .bind(Utc::now())
        .bind(attendance.method.as_str())
        .bind(attendance.recorded_by)
        .bind(attendance.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ShepherdError::on_unique_violation(e, DUPLICATE_CHECK_IN))
    }

    /// Find record within a church
    pub async fn find_by_id(&self, church_id: i64, id: i64) -> Result<Option<AttendanceRecord>, ShepherdError> {
        let record = sqlx::query_as::<_, AttendanceRecord>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance_records WHERE church_id = $1 AND id = $2"
        ))
        .bind(church_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Delete record
    pub async fn delete(&self, church_id: i64, id: i64) -> Result<bool, ShepherdError> {
        let result = sqlx::query("DELETE FROM attendance_records WHERE church_id = $1 AND id = $2")
            .bind(church_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List check-ins with member and event names
    pub async fn list(&self, church_id: i64, filter: &AttendanceFilter, limit: i64, offset: i64) -> Result<Vec<AttendanceEntry>, ShepherdError> {
        let entries = sqlx::query_as::<_, AttendanceEntry>(&format!(
            "{ENTRY_SELECT} WHERE {FILTER_CLAUSE} ORDER BY a.attendance_date DESC, a.checked_in_at DESC LIMIT $6 OFFSET $7"
        ))
        .bind(church_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.event_id)
        .bind(filter.member_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Count check-ins matching filters
    pub async fn count(&self, church_id: i64, filter: &AttendanceFilter) -> Result<i64, ShepherdError> {
        let count: (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM attendance_records a WHERE {FILTER_CLAUSE}"
        ))
        .bind(church_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.event_id)
        .bind(filter.member_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    /// Every check-in in a date range, for exports
    pub async fn list_between(&self, church_id: i64, from: NaiveDate, to: NaiveDate) -> Result<Vec<AttendanceEntry>, ShepherdError> {
        let entries = sqlx::query_as::<_, AttendanceEntry>(&format!(
            "{ENTRY_SELECT} WHERE a.church_id = $1 AND a.attendance_date BETWEEN $2 AND $3 ORDER BY a.attendance_date ASC, a.checked_in_at ASC"
        ))
        .bind(church_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Total check-ins in an inclusive date range
    pub async fn count_between(&self, church_id: i64, from: NaiveDate, to: NaiveDate) -> Result<i64, ShepherdError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM attendance_records WHERE church_id = $1 AND attendance_date BETWEEN $2 AND $3"
        )
        .bind(church_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    /// Distinct members seen in a date range
    pub async fn unique_members(&self, church_id: i64, from: NaiveDate, to: NaiveDate) -> Result<i64, ShepherdError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(DISTINCT member_id) FROM attendance_records WHERE church_id = $1 AND attendance_date BETWEEN $2 AND $3"
        )
        .bind(church_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    pub async fn daily_counts(&self, church_id: i64, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailyCount>, ShepherdError> {
        let counts = sqlx::query_as::<_, DailyCount>(
            r#"
            SELECT attendance_date AS date, COUNT(*) AS count
            FROM attendance_records
            WHERE church_id = $1 AND attendance_date BETWEEN $2 AND $3
            GROUP BY attendance_date
            ORDER BY attendance_date ASC
            "#
        )
        .bind(church_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    pub async fn event_counts(&self, church_id: i64, from: NaiveDate, to: NaiveDate) -> Result<Vec<EventCount>, ShepherdError> {
        let counts = sqlx::query_as::<_, EventCount>(
            r#"
            SELECT a.event_id, e.title, COUNT(*) AS count
            FROM attendance_records a
            LEFT JOIN events e ON e.id = a.event_id
            WHERE a.church_id = $1 AND a.attendance_date BETWEEN $2 AND $3
            GROUP BY a.event_id, e.title
            ORDER BY count DESC, a.event_id ASC NULLS FIRST
            "#
        )
        .bind(church_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    pub async fn method_counts(&self, church_id: i64, from: NaiveDate, to: NaiveDate) -> Result<Vec<MethodCount>, ShepherdError> {
        let counts = sqlx::query_as::<_, MethodCount>(
            r#"
            SELECT method, COUNT(*) AS count
            FROM attendance_records
            WHERE church_id = $1 AND attendance_date BETWEEN $2 AND $3
            GROUP BY method
            ORDER BY count DESC, method ASC
            "#
        )
        .bind(church_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    /// Platform-wide check-ins since a date
    pub async fn count_since_all(&self, since: NaiveDate) -> Result<i64, ShepherdError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM attendance_records WHERE attendance_date >= $1")
            .bind(since)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
