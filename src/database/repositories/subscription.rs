//! Subscription repository implementation

use sqlx::{PgConnection, PgPool};
use chrono::{DateTime, Utc};
use crate::models::report::PlanCount;
use crate::models::subscription::{Subscription, SubscriptionPlan, SubscriptionStatus};
use crate::utils::errors::ShepherdError;

const SUBSCRIPTION_COLUMNS: &str = "id, church_id, plan, status, trial_ends_at, current_period_end, created_at, updated_at";

/// Column changes for a subscription; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct SubscriptionChanges {
    pub plan: Option<SubscriptionPlan>,
    pub status: Option<SubscriptionStatus>,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Start a trial on an existing connection or transaction
    pub async fn create_trial_with(conn: &mut PgConnection, church_id: i64, trial_ends_at: DateTime<Utc>) -> Result<Subscription, ShepherdError> {
        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            r#"
            INSERT INTO subscriptions (church_id, plan, status, trial_ends_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        ))
        .bind(church_id)
        .bind(SubscriptionPlan::Trial.as_str())
        .bind(SubscriptionStatus::Trialing.as_str())
        .bind(trial_ends_at)
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

        Ok(subscription)
    }

    /// Find the subscription of a church
    pub async fn find_by_church(&self, church_id: i64) -> Result<Option<Subscription>, ShepherdError> {
        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE church_id = $1"
        ))
        .bind(church_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subscription)
    }

    /// Update subscription
    pub async fn update(&self, church_id: i64, changes: SubscriptionChanges) -> Result<Subscription, ShepherdError> {
        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            r#"
            UPDATE subscriptions
            SET plan = COALESCE($2, plan),
                status = COALESCE($3, status),
                trial_ends_at = COALESCE($4, trial_ends_at),
                current_period_end = COALESCE($5, current_period_end),
                updated_at = $6
            WHERE church_id = $1
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        ))
        .bind(church_id)
        .bind(changes.plan.map(|p| p.as_str()))
        .bind(changes.status.map(|s| s.as_str()))
        .bind(changes.trial_ends_at)
        .bind(changes.current_period_end)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        subscription.ok_or_else(|| ShepherdError::not_found("Subscription", church_id))
    }

    /// Subscriptions grouped by plan and status
    pub async fn counts_by_plan(&self) -> Result<Vec<PlanCount>, ShepherdError> {
        let counts = sqlx::query_as::<_, PlanCount>(
            "SELECT plan, status, COUNT(*) AS count FROM subscriptions GROUP BY plan, status ORDER BY plan, status"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }
}
