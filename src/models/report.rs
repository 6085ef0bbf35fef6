//! Report and console shapes

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use super::{FieldErrors, Validate};
use crate::utils::errors::{Result, ShepherdError};

/// Longest range a report may cover
pub const MAX_REPORT_DAYS: i64 = 366;

/// Range covered when `from` is omitted
pub const DEFAULT_REPORT_DAYS: i64 = 30;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateRangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRangeQuery {
    /// Resolve open ends: `to` defaults to `today`, `from` to 30 days before `to`
    pub fn resolve(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
        let to = self.to.unwrap_or(today);
        let from = match self.from {
            Some(from) => from,
            None => to
                .checked_sub_signed(chrono::Duration::days(DEFAULT_REPORT_DAYS))
                .ok_or_else(|| ShepherdError::Validation("to is out of range".to_string()))?,
        };
        let mut errors = FieldErrors::default();
        errors.check(from <= to, "from must not be after to");
        errors.check(
            (to - from).num_days() <= MAX_REPORT_DAYS,
            "date range must not exceed 366 days",
        );
        errors.finish()?;
        Ok((from, to))
    }
}

impl Validate for DateRangeQuery {
    fn validate(&self) -> Result<()> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            let mut errors = FieldErrors::default();
            errors.check(from <= to, "from must not be after to");
            return errors.finish();
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub active_members: i64,
    pub total_members: i64,
    pub visitors_this_month: i64,
    pub upcoming_events: i64,
    pub attendance_last_7_days: i64,
    pub check_ins_today: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventCount {
    pub event_id: Option<i64>,
    pub title: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MethodCount {
    pub method: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub total_check_ins: i64,
    pub unique_members: i64,
    pub average_per_day: f64,
    pub by_day: Vec<DailyCount>,
    pub by_event: Vec<EventCount>,
    pub by_method: Vec<MethodCount>,
}

/// Church row as listed in the super admin console
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChurchOverview {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub email: Option<String>,
    pub is_active: bool,
    pub plan: Option<String>,
    pub subscription_status: Option<String>,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub member_count: i64,
    pub user_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlanCount {
    pub plan: String,
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformStats {
    pub total_churches: i64,
    pub active_churches: i64,
    pub total_members: i64,
    pub total_users: i64,
    pub check_ins_last_30_days: i64,
    pub subscriptions: Vec<PlanCount>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_resolve_defaults() {
        let today = date(2024, 6, 30);
        let (from, to) = DateRangeQuery::default().resolve(today).unwrap();
        assert_eq!(to, today);
        assert_eq!(from, date(2024, 5, 31));

        let only_to = DateRangeQuery { from: None, to: Some(date(2024, 3, 15)) };
        assert_eq!(only_to.resolve(today).unwrap(), (date(2024, 2, 14), date(2024, 3, 15)));

        let only_from = DateRangeQuery { from: Some(date(2024, 6, 1)), to: None };
        assert_eq!(only_from.resolve(today).unwrap(), (date(2024, 6, 1), today));
    }

    #[test]
    fn test_resolve_range_length_limit() {
        let today = date(2025, 1, 1);
        let from = date(2024, 1, 1);

        let longest = DateRangeQuery { from: Some(from), to: Some(from + chrono::Duration::days(366)) };
        assert_eq!(longest.resolve(today).unwrap(), (from, date(2025, 1, 1)));

        let too_long = DateRangeQuery { from: Some(from), to: Some(from + chrono::Duration::days(367)) };
        assert_matches!(too_long.resolve(today), Err(ShepherdError::Validation(msg)) if msg.contains("366 days"));

        let single_day = DateRangeQuery { from: Some(from), to: Some(from) };
        assert!(single_day.resolve(today).is_ok());
    }

    #[test]
    fn test_resolve_rejects_inverted_range() {
        let today = date(2024, 6, 30);
        let reversed = DateRangeQuery { from: Some(date(2024, 6, 10)), to: Some(date(2024, 6, 1)) };
        assert_matches!(reversed.resolve(today), Err(ShepherdError::Validation(msg)) if msg.contains("from must not be after to"));
        assert!(reversed.validate().is_err());
    }

    #[test]
    fn test_resolve_extreme_dates_are_rejected_not_panicking() {
        let today = date(2024, 6, 30);
        let earliest = DateRangeQuery { from: None, to: Some(NaiveDate::MIN) };
        assert_matches!(earliest.resolve(today), Err(ShepherdError::Validation(_)));

        let deep_past = DateRangeQuery { from: Some(NaiveDate::MIN), to: None };
        assert_matches!(deep_past.resolve(today), Err(ShepherdError::Validation(_)));

        let far_future = DateRangeQuery { from: Some(today), to: Some(NaiveDate::MAX) };
        assert_matches!(far_future.resolve(today), Err(ShepherdError::Validation(_)));
    }
}
