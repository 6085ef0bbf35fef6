//! External check-in link payloads

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use super::{FieldErrors, Validate};
use crate::utils::errors::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInLinkSettings {
    pub enabled: bool,
    pub has_pin: bool,
    pub url: String,
}

/// Changing the PIN is optional when only toggling the link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCheckInLinkRequest {
    pub enabled: bool,
    pub pin: Option<String>,
}

impl Validate for UpdateCheckInLinkRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        if let Some(ref pin) = self.pin {
            errors.check(
                !pin.is_empty() && pin.chars().all(|c| c.is_ascii_digit()),
                "pin must contain digits only",
            );
            errors.check(pin.len() <= 12, "pin must be at most 12 digits");
        }
        errors.finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicMemberSearchRequest {
    pub pin: String,
    #[serde(default)]
    pub q: String,
}

impl Validate for PublicMemberSearchRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        errors.required(&self.pin, "pin");
        errors.max_len(Some(&self.q), 100, "q");
        errors.finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicCheckInRequest {
    pub pin: String,
    pub member_id: i64,
    pub event_id: Option<i64>,
}

impl Validate for PublicCheckInRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        errors.required(&self.pin, "pin");
        errors.check(self.member_id > 0, "member_id is required");
        errors.finish()
    }
}

/// What the public page may reveal before a PIN is entered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicChurchInfo {
    pub name: String,
    pub slug: String,
    pub events: Vec<PublicEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PublicEvent {
    pub id: i64,
    pub title: String,
    pub starts_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PublicMember {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_format() {
        let ok = UpdateCheckInLinkRequest { enabled: true, pin: Some("4821".into()) };
        assert!(ok.validate().is_ok());

        let letters = UpdateCheckInLinkRequest { enabled: true, pin: Some("12ab".into()) };
        assert!(letters.validate().is_err());

        let toggle_only = UpdateCheckInLinkRequest { enabled: false, pin: None };
        assert!(toggle_only.validate().is_ok());
    }
}
