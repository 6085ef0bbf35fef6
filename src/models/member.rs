//! Member directory model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use super::{FieldErrors, Validate};
use crate::utils::errors::Result;

text_enum! {
    pub enum MemberStatus {
        Active => "active",
        Inactive => "inactive",
        Transferred => "transferred",
        Deceased => "deceased",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Member {
    pub id: i64,
    pub church_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub status: String,
    pub joined_on: Option<NaiveDate>,
    #[serde(skip_serializing, default)]
    pub biometric_hash: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    pub fn status(&self) -> MemberStatus {
        self.status.parse().unwrap_or(MemberStatus::Inactive)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn has_biometric(&self) -> bool {
        self.biometric_hash.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateMemberRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub status: Option<MemberStatus>,
    pub joined_on: Option<NaiveDate>,
    pub notes: Option<String>,
}

fn check_birth_date(errors: &mut FieldErrors, date_of_birth: Option<NaiveDate>) {
    if let Some(dob) = date_of_birth {
        errors.check(dob <= Utc::now().date_naive(), "date_of_birth cannot be in the future");
    }
}

impl Validate for CreateMemberRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        errors.required(&self.first_name, "first_name");
        errors.required(&self.last_name, "last_name");
        errors.max_len(Some(&self.first_name), 100, "first_name");
        errors.max_len(Some(&self.last_name), 100, "last_name");
        errors.email(self.email.as_deref(), "email");
        errors.phone(self.phone.as_deref(), "phone");
        errors.max_len(self.gender.as_deref(), 32, "gender");
        errors.max_len(self.address.as_deref(), 500, "address");
        errors.max_len(self.notes.as_deref(), 4000, "notes");
        check_birth_date(&mut errors, self.date_of_birth);
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMemberRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub status: Option<MemberStatus>,
    pub joined_on: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl Validate for UpdateMemberRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        if let Some(ref first_name) = self.first_name {
            errors.required(first_name, "first_name");
        }
        if let Some(ref last_name) = self.last_name {
            errors.required(last_name, "last_name");
        }
        errors.max_len(self.first_name.as_deref(), 100, "first_name");
        errors.max_len(self.last_name.as_deref(), 100, "last_name");
        errors.email(self.email.as_deref(), "email");
        errors.phone(self.phone.as_deref(), "phone");
        errors.max_len(self.gender.as_deref(), 32, "gender");
        errors.max_len(self.address.as_deref(), 500, "address");
        errors.max_len(self.notes.as_deref(), 4000, "notes");
        check_birth_date(&mut errors, self.date_of_birth);
        errors.finish()
    }
}

/// Query string for the member directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberFilter {
    pub q: Option<String>,
    pub status: Option<MemberStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Simulated fingerprint enrollment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiometricEnrollRequest {
    pub template: String,
}

impl Validate for BiometricEnrollRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        errors.check(
            self.template.trim().len() >= 16,
            "template must be at least 16 characters",
        );
        errors.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_create_member_validation() {
        let request = CreateMemberRequest {
            first_name: "Lydia".into(),
            last_name: "Of Thyatira".into(),
            email: Some("lydia@example.org".into()),
            ..Default::default()
        };
        assert!(request.validate().is_ok());

        let future = Utc::now().date_naive() + Duration::days(3);
        let request = CreateMemberRequest {
            first_name: "".into(),
            date_of_birth: Some(future),
            ..request
        };
        let err = request.validate().unwrap_err().to_string();
        assert!(err.contains("first_name is required"));
        assert!(err.contains("date_of_birth"));
    }

    #[test]
    fn test_update_allows_partial_payloads() {
        let request = UpdateMemberRequest {
            status: Some(MemberStatus::Transferred),
            ..Default::default()
        };
        assert!(request.validate().is_ok());

        let request = UpdateMemberRequest {
            last_name: Some(" ".into()),
            ..Default::default()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_biometric_template_length() {
        assert!(BiometricEnrollRequest { template: "short".into() }.validate().is_err());
        assert!(BiometricEnrollRequest { template: "a1b2c3d4e5f6a7b8c9".into() }.validate().is_ok());
    }
}
