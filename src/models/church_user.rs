//! Church staff account model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use super::{FieldErrors, Validate};
use crate::utils::errors::Result;

pub const MIN_PASSWORD_LENGTH: usize = 8;

text_enum! {
    /// Staff roles, ordered from least to most privileged
    pub enum ChurchRole {
        Viewer => "viewer",
        Staff => "staff",
        Admin => "admin",
        Owner => "owner",
    }
}

impl ChurchRole {
    fn rank(&self) -> u8 {
        match self {
            ChurchRole::Viewer => 0,
            ChurchRole::Staff => 1,
            ChurchRole::Admin => 2,
            ChurchRole::Owner => 3,
        }
    }

    /// Check if this role includes the privileges of `other`
    pub fn includes(&self, other: ChurchRole) -> bool {
        self.rank() >= other.rank()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChurchUser {
    pub id: i64,
    pub church_id: i64,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub full_name: String,
    pub role: String,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChurchUser {
    /// Typed role; unknown values degrade to the least privileged role
    pub fn role(&self) -> ChurchRole {
        self.role.parse().unwrap_or(ChurchRole::Viewer)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChurchUserRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: ChurchRole,
}

impl Validate for CreateChurchUserRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        errors.required(&self.email, "email");
        errors.email(Some(&self.email), "email");
        errors.required(&self.full_name, "full_name");
        errors.max_len(Some(&self.full_name), 200, "full_name");
        errors.check(
            self.password.chars().count() >= MIN_PASSWORD_LENGTH,
            "password must be at least 8 characters",
        );
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateChurchUserRequest {
    pub full_name: Option<String>,
    pub role: Option<ChurchRole>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
}

impl Validate for UpdateChurchUserRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        if let Some(ref name) = self.full_name {
            errors.required(name, "full_name");
        }
        errors.max_len(self.full_name.as_deref(), 200, "full_name");
        if let Some(ref password) = self.password {
            errors.check(
                password.chars().count() >= MIN_PASSWORD_LENGTH,
                "password must be at least 8 characters",
            );
        }
        errors.finish()
    }
}

/// Row to insert once the password has been hashed
#[derive(Debug, Clone)]
pub struct NewChurchUser {
    pub church_id: i64,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: ChurchRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_hierarchy() {
        assert!(ChurchRole::Owner.includes(ChurchRole::Admin));
        assert!(ChurchRole::Admin.includes(ChurchRole::Staff));
        assert!(ChurchRole::Staff.includes(ChurchRole::Staff));
        assert!(!ChurchRole::Viewer.includes(ChurchRole::Staff));
        assert!(!ChurchRole::Admin.includes(ChurchRole::Owner));
    }

    #[test]
    fn test_role_parsing_and_serde() {
        assert_eq!("admin".parse::<ChurchRole>().unwrap(), ChurchRole::Admin);
        assert_eq!(serde_json::to_string(&ChurchRole::Owner).unwrap(), "\"owner\"");
        let role: ChurchRole = serde_json::from_str("\"staff\"").unwrap();
        assert_eq!(role, ChurchRole::Staff);
    }

    #[test]
    fn test_create_validation() {
        let request = CreateChurchUserRequest {
            email: "usher@grace.org".into(),
            password: "short".into(),
            full_name: "Usher".into(),
            role: ChurchRole::Staff,
        };
        assert!(request.validate().is_err());

        let request = CreateChurchUserRequest { password: "long-enough".into(), ..request };
        assert!(request.validate().is_ok());
    }
}
