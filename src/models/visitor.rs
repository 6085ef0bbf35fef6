//! Visitor model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use super::{FieldErrors, Validate};
use crate::utils::errors::Result;

text_enum! {
    pub enum FollowUpStatus {
        Pending => "pending",
        Contacted => "contacted",
        Converted => "converted",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Visitor {
    pub id: i64,
    pub church_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub visit_date: NaiveDate,
    pub invited_by: Option<String>,
    pub notes: Option<String>,
    pub follow_up_status: String,
    pub converted_member_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Visitor {
    pub fn follow_up_status(&self) -> FollowUpStatus {
        self.follow_up_status.parse().unwrap_or(FollowUpStatus::Pending)
    }

    pub fn is_converted(&self) -> bool {
        self.converted_member_id.is_some() || self.follow_up_status() == FollowUpStatus::Converted
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateVisitorRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Defaults to the church-local date of the request
    pub visit_date: Option<NaiveDate>,
    pub invited_by: Option<String>,
    pub notes: Option<String>,
}

impl Validate for CreateVisitorRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        errors.required(&self.first_name, "first_name");
        errors.required(&self.last_name, "last_name");
        errors.max_len(Some(&self.first_name), 100, "first_name");
        errors.max_len(Some(&self.last_name), 100, "last_name");
        errors.email(self.email.as_deref(), "email");
        errors.phone(self.phone.as_deref(), "phone");
        errors.max_len(self.invited_by.as_deref(), 200, "invited_by");
        errors.max_len(self.notes.as_deref(), 4000, "notes");
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateVisitorRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub visit_date: Option<NaiveDate>,
    pub invited_by: Option<String>,
    pub notes: Option<String>,
    pub follow_up_status: Option<FollowUpStatus>,
}

impl Validate for UpdateVisitorRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        if let Some(ref first_name) = self.first_name {
            errors.required(first_name, "first_name");
        }
        if let Some(ref last_name) = self.last_name {
            errors.required(last_name, "last_name");
        }
        errors.email(self.email.as_deref(), "email");
        errors.phone(self.phone.as_deref(), "phone");
        errors.max_len(self.notes.as_deref(), 4000, "notes");
        errors.check(
            self.follow_up_status != Some(FollowUpStatus::Converted),
            "use the convert endpoint to mark a visitor as converted",
        );
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisitorFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<FollowUpStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converted_status_not_settable_directly() {
        let request = UpdateVisitorRequest {
            follow_up_status: Some(FollowUpStatus::Converted),
            ..Default::default()
        };
        assert!(request.validate().is_err());

        let request = UpdateVisitorRequest {
            follow_up_status: Some(FollowUpStatus::Contacted),
            ..Default::default()
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_requires_names() {
        let request = CreateVisitorRequest {
            first_name: "Zacchaeus".into(),
            ..Default::default()
        };
        assert!(request.validate().is_err());
    }
}
