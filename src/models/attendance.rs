//! Attendance model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use super::{FieldErrors, Validate};
use crate::utils::errors::Result;

text_enum! {
    /// How a check-in was captured
    pub enum CheckInMethod {
        Manual => "manual",
        Kiosk => "kiosk",
        Biometric => "biometric",
        ExternalLink => "external_link",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttendanceRecord {
    pub id: i64,
    pub church_id: i64,
    pub member_id: i64,
    pub event_id: Option<i64>,
    pub attendance_date: NaiveDate,
    pub checked_in_at: DateTime<Utc>,
    pub method: String,
    pub recorded_by: Option<i64>,
    pub notes: Option<String>,
}

impl AttendanceRecord {
    pub fn method(&self) -> CheckInMethod {
        self.method.parse().unwrap_or(CheckInMethod::Manual)
    }
}

/// Attendance row joined with member and event names for listings and exports
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttendanceEntry {
    pub id: i64,
    pub member_id: i64,
    pub member_first_name: String,
    pub member_last_name: String,
    pub event_id: Option<i64>,
    pub event_title: Option<String>,
    pub attendance_date: NaiveDate,
    pub checked_in_at: DateTime<Utc>,
    pub method: String,
    pub notes: Option<String>,
}

/// Staff-entered check-in
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckInRequest {
    pub member_id: i64,
    pub event_id: Option<i64>,
    /// Back-dated entry; defaults to the church-local date
    pub attendance_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl Validate for CheckInRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        errors.check(self.member_id > 0, "member_id is required");
        errors.max_len(self.notes.as_deref(), 1000, "notes");
        errors.finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KioskCheckInRequest {
    pub member_id: i64,
    pub event_id: Option<i64>,
}

impl Validate for KioskCheckInRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        errors.check(self.member_id > 0, "member_id is required");
        errors.finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiometricCheckInRequest {
    pub template: String,
    pub event_id: Option<i64>,
}

impl Validate for BiometricCheckInRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        errors.required(&self.template, "template");
        errors.finish()
    }
}

/// Fully resolved row for insertion
#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub church_id: i64,
    pub member_id: i64,
    pub event_id: Option<i64>,
    pub attendance_date: NaiveDate,
    pub method: CheckInMethod,
    pub recorded_by: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttendanceFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub event_id: Option<i64>,
    pub member_id: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_in_requires_member() {
        assert!(CheckInRequest::default().validate().is_err());
        let request = CheckInRequest { member_id: 3, ..Default::default() };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_method_strings() {
        assert_eq!(CheckInMethod::ExternalLink.as_str(), "external_link");
        assert_eq!("kiosk".parse::<CheckInMethod>().unwrap(), CheckInMethod::Kiosk);
    }
}
