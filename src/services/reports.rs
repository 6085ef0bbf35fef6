//! Reports and CSV exports

use chrono::{Datelike, Duration, NaiveDate, Utc};
use crate::database::DatabaseService;
use crate::models::*;
use crate::utils::csv::{opt, CsvDocument};
use crate::utils::errors::{Result, ShepherdError};
use crate::utils::helpers::{format_timestamp, local_date};

/// A rendered CSV download
#[derive(Debug, Clone)]
pub struct CsvExport {
    pub filename: String,
    pub body: String,
    pub rows: usize,
}

/// Average check-ins per calendar day in an inclusive range
pub fn average_per_day(total: i64, from: NaiveDate, to: NaiveDate) -> f64 {
    let days = (to - from).num_days() + 1;
    if days <= 0 {
        return 0.0;
    }
    let average = total as f64 / days as f64;
    (average * 100.0).round() / 100.0
}

#[derive(Clone)]
pub struct ReportService {
    db: DatabaseService,
}

impl ReportService {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    /// Church-local today
    pub async fn today(&self, church_id: i64) -> Result<NaiveDate> {
        let church = self
            .db
            .churches
            .find_by_id(church_id)
            .await?
            .ok_or_else(|| ShepherdError::not_found("Church", church_id))?;
        Ok(local_date(Utc::now(), church.utc_offset_minutes))
    }

    pub async fn dashboard(&self, church_id: i64) -> Result<DashboardSummary> {
        let today = self.today(church_id).await?;
        let month_start = today.with_day(1).unwrap_or(today);

        let visitors_this_month = self
            .db
            .visitors
            .count(church_id, &VisitorFilter {
                from: Some(month_start),
                to: Some(today),
                ..Default::default()
            })
            .await?;

        Ok(DashboardSummary {
            active_members: self.db.members.count(church_id, None, Some(MemberStatus::Active)).await?,
            total_members: self.db.members.count(church_id, None, None).await?,
            visitors_this_month,
            upcoming_events: self.db.events.count_upcoming(church_id).await?,
            attendance_last_7_days: self
                .db
                .attendance
                .count_between(church_id, today - Duration::days(6), today)
                .await?,
            check_ins_today: self.db.attendance.count_between(church_id, today, today).await?,
        })
    }

    pub async fn attendance_report(&self, church_id: i64, range: &DateRangeQuery) -> Result<AttendanceReport> {
        let today = self.today(church_id).await?;
        let (from, to) = range.resolve(today)?;

        let total_check_ins = self.db.attendance.count_between(church_id, from, to).await?;

        Ok(AttendanceReport {
            from,
            to,
            total_check_ins,
            unique_members: self.db.attendance.unique_members(church_id, from, to).await?,
            average_per_day: average_per_day(total_check_ins, from, to),
            by_day: self.db.attendance.daily_counts(church_id, from, to).await?,
            by_event: self.db.attendance.event_counts(church_id, from, to).await?,
            by_method: self.db.attendance.method_counts(church_id, from, to).await?,
        })
    }

    pub async fn export_members(&self, church_id: i64) -> Result<CsvExport> {
        let members = self.db.members.list_all(church_id).await?;

        let mut doc = CsvDocument::with_header(&[
            "id", "first_name", "last_name", "email", "phone", "gender",
            "date_of_birth", "address", "status", "joined_on", "notes", "created_at",
        ]);
        for m in &members {
            doc.push_row([
                m.id.to_string(),
                m.first_name.clone(),
                m.last_name.clone(),
                opt(&m.email),
                opt(&m.phone),
                opt(&m.gender),
                opt(&m.date_of_birth),
                opt(&m.address),
                m.status.clone(),
                opt(&m.joined_on),
                opt(&m.notes),
                format_timestamp(m.created_at),
            ]);
        }

        Ok(finish(doc, "members.csv"))
    }

    pub async fn export_visitors(&self, church_id: i64) -> Result<CsvExport> {
        let visitors = self.db.visitors.list_all(church_id).await?;

        let mut doc = CsvDocument::with_header(&[
            "id", "first_name", "last_name", "email", "phone", "visit_date",
            "invited_by", "follow_up_status", "converted_member_id", "notes",
        ]);
        for v in &visitors {
            doc.push_row([
                v.id.to_string(),
                v.first_name.clone(),
                v.last_name.clone(),
                opt(&v.email),
                opt(&v.phone),
                v.visit_date.to_string(),
                opt(&v.invited_by),
                v.follow_up_status.clone(),
                opt(&v.converted_member_id),
                opt(&v.notes),
            ]);
        }

        Ok(finish(doc, "visitors.csv"))
    }

    pub async fn export_attendance(&self, church_id: i64, range: &DateRangeQuery) -> Result<CsvExport> {
        let today = self.today(church_id).await?;
        let (from, to) = range.resolve(today)?;
        let entries = self.db.attendance.list_between(church_id, from, to).await?;

        let mut doc = CsvDocument::with_header(&[
            "date", "member_id", "first_name", "last_name", "event_id", "event",
            "method", "checked_in_at", "notes",
        ]);
        for e in &entries {
            doc.push_row([
                e.attendance_date.to_string(),
                e.member_id.to_string(),
                e.member_first_name.clone(),
                e.member_last_name.clone(),
                opt(&e.event_id),
                opt(&e.event_title),
                e.method.clone(),
                format_timestamp(e.checked_in_at),
                opt(&e.notes),
            ]);
        }

        Ok(finish(doc, &format!("attendance-{}-to-{}.csv", from, to)))
    }

    pub async fn platform_stats(&self) -> Result<PlatformStats> {
        let since = Utc::now().date_naive() - Duration::days(30);
        Ok(PlatformStats {
            total_churches: self.db.churches.count(false).await?,
            active_churches: self.db.churches.count(true).await?,
            total_members: self.db.members.count_all().await?,
            total_users: self.db.users.count_all().await?,
            check_ins_last_30_days: self.db.attendance.count_since_all(since).await?,
            subscriptions: self.db.subscriptions.counts_by_plan().await?,
        })
    }
}

fn finish(doc: CsvDocument, filename: &str) -> CsvExport {
    let rows = doc.row_count();
    CsvExport {
        filename: filename.to_string(),
        body: doc.into_string(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_average_per_day() {
        assert_eq!(average_per_day(70, date(2024, 3, 1), date(2024, 3, 7)), 10.0);
        assert_eq!(average_per_day(10, date(2024, 3, 1), date(2024, 3, 3)), 3.33);
        assert_eq!(average_per_day(5, date(2024, 3, 1), date(2024, 3, 1)), 5.0);
        assert_eq!(average_per_day(5, date(2024, 3, 2), date(2024, 3, 1)), 0.0);
    }

    #[test]
    fn test_finish_counts_data_rows() {
        let mut doc = CsvDocument::with_header(&["a", "b"]);
        doc.push_row(["1", "2"]);
        let export = finish(doc, "members.csv");
        assert_eq!(export.rows, 1);
        assert_eq!(export.body, "a,b\r\n1,2\r\n");
    }
}
