//! Data models module
//!
//! This module contains all data structures used throughout the application:
//! database rows, API request payloads and report shapes.

use serde::Serialize;
use crate::utils::errors::Result;

/// Declares an enum persisted as lowercase text.
///
/// Generates `as_str`, `ALL`, `Display` and a `FromStr` that reports
/// unknown values as validation errors.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "snake_case")]
        $vis enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::utils::errors::ShepherdError;

            fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
                match value {
                    $($text => Ok($name::$variant),)+
                    other => Err($crate::utils::errors::ShepherdError::Validation(
                        format!("Unknown {}: {}", stringify!($name), other)
                    )),
                }
            }
        }
    };
}

pub mod attendance;
pub mod auth;
pub mod checkin;
pub mod church;
pub mod church_user;
pub mod event;
pub mod member;
pub mod report;
pub mod subscription;
pub mod super_admin;
pub mod visitor;

// Re-export commonly used models
pub use attendance::{AttendanceRecord, AttendanceEntry, AttendanceFilter, CheckInMethod, CheckInRequest, KioskCheckInRequest, BiometricCheckInRequest, NewAttendance};
pub use auth::{Claims, LoginRequest, PrincipalKind, RegisterChurchRequest, TokenResponse};
pub use checkin::{CheckInLinkSettings, UpdateCheckInLinkRequest, PublicCheckInRequest, PublicMemberSearchRequest, PublicChurchInfo, PublicMember, PublicEvent};
pub use church::{Church, CreateChurchRequest, UpdateChurchRequest};
pub use church_user::{ChurchUser, ChurchRole, CreateChurchUserRequest, UpdateChurchUserRequest, NewChurchUser};
pub use event::{Event, EventType, CreateEventRequest, UpdateEventRequest, EventFilter};
pub use member::{Member, MemberStatus, CreateMemberRequest, UpdateMemberRequest, MemberFilter, BiometricEnrollRequest};
pub use report::{DashboardSummary, AttendanceReport, DailyCount, EventCount, MethodCount, DateRangeQuery, PlatformStats, ChurchOverview, PlanCount};
pub use subscription::{Subscription, SubscriptionPlan, SubscriptionStatus, Feature, ChangePlanRequest, AdminSubscriptionUpdate};
pub use super_admin::{SuperAdmin, NewSuperAdmin};
pub use visitor::{Visitor, FollowUpStatus, CreateVisitorRequest, UpdateVisitorRequest, VisitorFilter};

/// Input payloads check their own shape before any database work
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// One page of a list endpoint
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, limit: i64, offset: i64) -> Self {
        Self { items, total, limit, offset }
    }
}

/// Collects field errors so a client sees every problem at once
#[derive(Debug, Default)]
pub(crate) struct FieldErrors(Vec<String>);

impl FieldErrors {
    pub fn check(&mut self, ok: bool, message: &str) {
        if !ok {
            self.0.push(message.to_string());
        }
    }

    pub fn required(&mut self, value: &str, field: &str) {
        if value.trim().is_empty() {
            self.0.push(format!("{} is required", field));
        }
    }

    pub fn max_len(&mut self, value: Option<&str>, max: usize, field: &str) {
        if value.map(|v| v.chars().count() > max).unwrap_or(false) {
            self.0.push(format!("{} must be at most {} characters", field, max));
        }
    }

    pub fn email(&mut self, value: Option<&str>, field: &str) {
        if let Some(v) = value {
            if !v.trim().is_empty() && !crate::utils::helpers::is_valid_email(v.trim()) {
                self.0.push(format!("{} is not a valid email address", field));
            }
        }
    }

    pub fn phone(&mut self, value: Option<&str>, field: &str) {
        if let Some(v) = value {
            if !v.trim().is_empty() && !crate::utils::helpers::is_valid_phone(v.trim()) {
                self.0.push(format!("{} is not a valid phone number", field));
            }
        }
    }

    pub fn finish(self) -> Result<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(crate::utils::errors::ShepherdError::Validation(self.0.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_joined() {
        let mut errors = FieldErrors::default();
        errors.required("", "first_name");
        errors.email(Some("nope"), "email");
        errors.phone(Some(""), "phone");
        let err = errors.finish().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid input: first_name is required; email is not a valid email address"
        );
    }

    #[test]
    fn test_text_enum_round_trip_through_str() {
        for plan in SubscriptionPlan::ALL {
            assert_eq!(plan.as_str().parse::<SubscriptionPlan>().unwrap(), *plan);
        }
        assert!("platinum".parse::<SubscriptionPlan>().is_err());
    }
}
