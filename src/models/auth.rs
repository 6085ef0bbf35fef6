//! Authentication payloads and token claims

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use super::church::UTC_OFFSET_RANGE;
use super::church_user::MIN_PASSWORD_LENGTH;
use super::{FieldErrors, Validate};
use crate::utils::errors::Result;
use crate::utils::helpers::is_valid_slug;

text_enum! {
    /// Who a token was issued to
    pub enum PrincipalKind {
        ChurchUser => "church_user",
        SuperAdmin => "super_admin",
    }
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub kind: PrincipalKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub church_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        errors.required(&self.email, "email");
        errors.required(&self.password, "password");
        errors.finish()
    }
}

/// Self-service signup: creates the church, its owner and a trial
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterChurchRequest {
    pub church_name: String,
    pub slug: Option<String>,
    pub church_email: Option<String>,
    pub church_phone: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub utc_offset_minutes: i32,
    pub full_name: String,
    pub email: String,
    pub password: String,
}

impl Validate for RegisterChurchRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        errors.required(&self.church_name, "church_name");
        errors.max_len(Some(&self.church_name), 200, "church_name");
        if let Some(ref slug) = self.slug {
            errors.check(
                is_valid_slug(slug),
                "slug must be 3-63 lowercase letters, digits or single dashes",
            );
        }
        errors.email(self.church_email.as_deref(), "church_email");
        errors.phone(self.church_phone.as_deref(), "church_phone");
        errors.check(
            UTC_OFFSET_RANGE.contains(&self.utc_offset_minutes),
            "utc_offset_minutes must be between -720 and 840",
        );
        errors.required(&self.full_name, "full_name");
        errors.required(&self.email, "email");
        errors.email(Some(&self.email), "email");
        errors.check(
            self.password.chars().count() >= MIN_PASSWORD_LENGTH,
            "password must be at least 8 characters",
        );
        errors.finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenResponse {
    pub fn bearer(token: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            token,
            token_type: "Bearer".to_string(),
            expires_at,
        }
    }
}
