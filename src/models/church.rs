//! Church (tenant) model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use super::{FieldErrors, Validate};
use crate::utils::errors::Result;

/// Offsets outside this range do not exist on Earth
pub const UTC_OFFSET_RANGE: std::ops::RangeInclusive<i32> = -720..=840;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Church {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub utc_offset_minutes: i32,
    #[serde(skip_serializing, default)]
    pub checkin_pin_hash: Option<String>,
    pub checkin_enabled: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChurchRequest {
    pub name: String,
    pub slug: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateChurchRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub utc_offset_minutes: Option<i32>,
}

impl Validate for UpdateChurchRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        if let Some(ref name) = self.name {
            errors.required(name, "name");
        }
        errors.max_len(self.name.as_deref(), 200, "name");
        errors.email(self.email.as_deref(), "email");
        errors.phone(self.phone.as_deref(), "phone");
        errors.max_len(self.address.as_deref(), 500, "address");
        if let Some(offset) = self.utc_offset_minutes {
            errors.check(UTC_OFFSET_RANGE.contains(&offset), "utc_offset_minutes must be between -720 and 840");
        }
        errors.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_validation() {
        let ok = UpdateChurchRequest {
            name: Some("Grace Chapel".into()),
            utc_offset_minutes: Some(-300),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let bad = UpdateChurchRequest {
            name: Some("  ".into()),
            utc_offset_minutes: Some(900),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
