//! Subscription model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use super::{FieldErrors, Validate};
use crate::utils::errors::Result;

text_enum! {
    pub enum SubscriptionPlan {
        Trial => "trial",
        Basic => "basic",
        Standard => "standard",
        Premium => "premium",
    }
}

text_enum! {
    pub enum SubscriptionStatus {
        Trialing => "trialing",
        Active => "active",
        PastDue => "past_due",
        Cancelled => "cancelled",
        Expired => "expired",
    }
}

text_enum! {
    /// Capabilities a plan can unlock
    pub enum Feature {
        MemberDirectory => "member_directory",
        Attendance => "attendance",
        Events => "events",
        Visitors => "visitors",
        Reports => "reports",
        CsvExport => "csv_export",
        KioskMode => "kiosk_mode",
        ExternalCheckIn => "external_checkin",
        BiometricCheckIn => "biometric_checkin",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub id: i64,
    pub church_id: i64,
    pub plan: String,
    pub status: String,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn plan(&self) -> SubscriptionPlan {
        self.plan.parse().unwrap_or(SubscriptionPlan::Trial)
    }

    pub fn status(&self) -> SubscriptionStatus {
        self.status.parse().unwrap_or(SubscriptionStatus::Expired)
    }
}

/// Owner-initiated plan switch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePlanRequest {
    pub plan: SubscriptionPlan,
}

impl Validate for ChangePlanRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        errors.check(
            self.plan != SubscriptionPlan::Trial,
            "cannot switch back to the trial plan",
        );
        errors.finish()
    }
}

/// Super admin override of a tenant's subscription
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminSubscriptionUpdate {
    pub plan: Option<SubscriptionPlan>,
    pub status: Option<SubscriptionStatus>,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
}

impl Validate for AdminSubscriptionUpdate {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        errors.check(
            self.plan.is_some()
                || self.status.is_some()
                || self.trial_ends_at.is_some()
                || self.current_period_end.is_some(),
            "at least one field must be provided",
        );
        errors.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cannot_choose_trial() {
        assert!(ChangePlanRequest { plan: SubscriptionPlan::Trial }.validate().is_err());
        assert!(ChangePlanRequest { plan: SubscriptionPlan::Standard }.validate().is_ok());
    }

    #[test]
    fn test_admin_update_needs_a_field() {
        assert!(AdminSubscriptionUpdate::default().validate().is_err());
        let update = AdminSubscriptionUpdate {
            status: Some(SubscriptionStatus::Active),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
    }
}
