//! Subscription plans and feature gating
//!
//! Each plan maps to a fixed capability set. Routes ask for a feature and
//! are refused with 402 when the subscription has lapsed or 403 when the
//! plan does not include it.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::info;
use crate::database::repositories::SubscriptionChanges;
use crate::database::DatabaseService;
use crate::models::*;
use crate::utils::errors::{Result, ShepherdError};
use crate::utils::logging::{log_admin_action, log_tenant_action};

/// Length of a paid billing period
pub const BILLING_PERIOD_DAYS: i64 = 30;

const BASIC_FEATURES: &[Feature] = &[
    Feature::MemberDirectory,
    Feature::Attendance,
    Feature::Events,
    Feature::Visitors,
];

const STANDARD_FEATURES: &[Feature] = &[
    Feature::MemberDirectory,
    Feature::Attendance,
    Feature::Events,
    Feature::Visitors,
    Feature::Reports,
    Feature::CsvExport,
    Feature::KioskMode,
    Feature::ExternalCheckIn,
];

/// What a plan allows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanCapabilities {
    pub features: &'static [Feature],
    /// `None` means unlimited
    pub max_members: Option<i64>,
    pub max_users: Option<i64>,
}

impl PlanCapabilities {
    pub fn for_plan(plan: SubscriptionPlan) -> Self {
        match plan {
            SubscriptionPlan::Trial => Self {
                features: Feature::ALL,
                max_members: Some(100),
                max_users: Some(3),
            },
            SubscriptionPlan::Basic => Self {
                features: BASIC_FEATURES,
                max_members: Some(200),
                max_users: Some(2),
            },
            SubscriptionPlan::Standard => Self {
                features: STANDARD_FEATURES,
                max_members: Some(1000),
                max_users: Some(10),
            },
            SubscriptionPlan::Premium => Self {
                features: Feature::ALL,
                max_members: None,
                max_users: None,
            },
        }
    }

    pub fn includes(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }
}

/// Whether the subscription currently grants access
pub fn is_active(subscription: &Subscription, now: DateTime<Utc>) -> bool {
    match subscription.status() {
        SubscriptionStatus::Trialing => subscription.trial_ends_at.map(|end| end > now).unwrap_or(false),
        SubscriptionStatus::Active => true,
        SubscriptionStatus::PastDue => subscription.current_period_end.map(|end| end > now).unwrap_or(false),
        SubscriptionStatus::Cancelled | SubscriptionStatus::Expired => false,
    }
}

fn inactive_reason(subscription: &Subscription) -> String {
    match subscription.status() {
        SubscriptionStatus::Trialing => "The free trial has ended; choose a plan to continue".to_string(),
        SubscriptionStatus::PastDue => "Payment is past due".to_string(),
        SubscriptionStatus::Cancelled => "The subscription was cancelled".to_string(),
        _ => "The subscription has expired".to_string(),
    }
}

/// Check a subscription against a feature, without touching the database
pub fn check_feature(subscription: &Subscription, feature: Feature, now: DateTime<Utc>) -> Result<()> {
    if !is_active(subscription, now) {
        return Err(ShepherdError::SubscriptionInactive(inactive_reason(subscription)));
    }
    let plan = subscription.plan();
    if !PlanCapabilities::for_plan(plan).includes(feature) {
        return Err(ShepherdError::FeatureUnavailable {
            feature: feature.to_string(),
            plan: plan.to_string(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanLimits {
    pub max_members: Option<i64>,
    pub max_users: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanUsage {
    pub members: i64,
    pub users: i64,
}

/// Subscription as shown to the church
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionSummary {
    pub plan: SubscriptionPlan,
    pub status: SubscriptionStatus,
    pub active: bool,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub trial_days_left: Option<i64>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub features: Vec<Feature>,
    pub limits: PlanLimits,
    pub usage: PlanUsage,
}

#[derive(Clone)]
pub struct BillingService {
    db: DatabaseService,
}

impl BillingService {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    pub async fn subscription(&self, church_id: i64) -> Result<Subscription> {
        self.db
            .subscriptions
            .find_by_church(church_id)
            .await?
            .ok_or_else(|| ShepherdError::not_found("Subscription", church_id))
    }

    /// Fail unless the church's subscription is active and includes `feature`
    pub async fn require_feature(&self, church_id: i64, feature: Feature) -> Result<Subscription> {
        let subscription = self.subscription(church_id).await?;
        check_feature(&subscription, feature, Utc::now())?;
        Ok(subscription)
    }

    /// Fail unless the subscription is active, whatever the plan
    pub async fn require_active(&self, church_id: i64) -> Result<Subscription> {
        let subscription = self.subscription(church_id).await?;
        if !is_active(&subscription, Utc::now()) {
            return Err(ShepherdError::SubscriptionInactive(inactive_reason(&subscription)));
        }
        Ok(subscription)
    }

    /// Refuse a new member once the plan's member limit is reached
    pub async fn ensure_member_capacity(&self, church_id: i64, subscription: &Subscription) -> Result<()> {
        if let Some(max) = PlanCapabilities::for_plan(subscription.plan()).max_members {
            let current = self.db.members.count(church_id, None, None).await?;
            if current >= max {
                return Err(ShepherdError::PermissionDenied(format!(
                    "The {} plan allows at most {} members",
                    subscription.plan(),
                    max
                )));
            }
        }
        Ok(())
    }

    /// Refuse a new staff account once the plan's user limit is reached
    pub async fn ensure_user_capacity(&self, church_id: i64) -> Result<()> {
        let subscription = self.subscription(church_id).await?;
        if let Some(max) = PlanCapabilities::for_plan(subscription.plan()).max_users {
            let current = self.db.users.count_active(church_id, None).await?;
            if current >= max {
                return Err(ShepherdError::PermissionDenied(format!(
                    "The {} plan allows at most {} users",
                    subscription.plan(),
                    max
                )));
            }
        }
        Ok(())
    }

    pub async fn summary(&self, church_id: i64) -> Result<SubscriptionSummary> {
        let subscription = self.subscription(church_id).await?;
        let now = Utc::now();
        let plan = subscription.plan();
        let status = subscription.status();
        let capabilities = PlanCapabilities::for_plan(plan);

        let trial_days_left = match status {
            SubscriptionStatus::Trialing => subscription
                .trial_ends_at
                .map(|end| (end - now).num_days().max(0)),
            _ => None,
        };

        Ok(SubscriptionSummary {
            plan,
            status,
            active: is_active(&subscription, now),
            trial_ends_at: subscription.trial_ends_at,
            trial_days_left,
            current_period_end: subscription.current_period_end,
            features: capabilities.features.to_vec(),
            limits: PlanLimits {
                max_members: capabilities.max_members,
                max_users: capabilities.max_users,
            },
            usage: PlanUsage {
                members: self.db.members.count(church_id, None, None).await?,
                users: self.db.users.count_active(church_id, None).await?,
            },
        })
    }

    /// Switch to a paid plan and start a fresh billing period
    pub async fn change_plan(&self, church_id: i64, user_id: i64, plan: SubscriptionPlan) -> Result<Subscription> {
        if plan == SubscriptionPlan::Trial {
            return Err(ShepherdError::Validation("cannot switch back to the trial plan".to_string()));
        }

        let subscription = self
            .db
            .subscriptions
            .update(church_id, SubscriptionChanges {
                plan: Some(plan),
                status: Some(SubscriptionStatus::Active),
                current_period_end: Some(Utc::now() + Duration::days(BILLING_PERIOD_DAYS)),
                ..Default::default()
            })
            .await?;

        info!(church_id = church_id, plan = %plan, "Subscription plan changed");
        log_tenant_action(church_id, user_id, "change_plan", Some(subscription.id));
        Ok(subscription)
    }

    pub async fn cancel(&self, church_id: i64, user_id: i64) -> Result<Subscription> {
        let current = self.subscription(church_id).await?;
        if current.status() == SubscriptionStatus::Cancelled {
            return Err(ShepherdError::Conflict("Subscription is already cancelled".to_string()));
        }

        let subscription = self
            .db
            .subscriptions
            .update(church_id, SubscriptionChanges {
                status: Some(SubscriptionStatus::Cancelled),
                ..Default::default()
            })
            .await?;

        log_tenant_action(church_id, user_id, "cancel_subscription", Some(subscription.id));
        Ok(subscription)
    }

    /// Super admin override
    pub async fn admin_update(&self, admin_id: i64, church_id: i64, update: AdminSubscriptionUpdate) -> Result<Subscription> {
        let subscription = self
            .db
            .subscriptions
            .update(church_id, SubscriptionChanges {
                plan: update.plan,
                status: update.status,
                trial_ends_at: update.trial_ends_at,
                current_period_end: update.current_period_end,
            })
            .await?;

        let details = format!("plan={} status={}", subscription.plan, subscription.status);
        log_admin_action(admin_id, "update_subscription", Some(&church_id.to_string()), Some(&details));
        Ok(subscription)
    }
}
