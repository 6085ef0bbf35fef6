//! Database service layer
//!
//! This module provides a high-level interface to database operations,
//! including the operations that must span several tables atomically.

use chrono::{DateTime, NaiveDate, Utc};
use crate::database::repositories::*;
use crate::database::DatabasePool;
use crate::models::*;
use crate::utils::errors::ShepherdError;

/// Everything created by a self-service signup
#[derive(Debug, Clone)]
pub struct Registration {
    pub church: Church,
    pub owner: ChurchUser,
    pub subscription: Subscription,
}

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pool: DatabasePool,
    pub churches: ChurchRepository,
    pub users: ChurchUserRepository,
    pub subscriptions: SubscriptionRepository,
    pub super_admins: SuperAdminRepository,
    pub members: MemberRepository,
    pub visitors: VisitorRepository,
    pub events: EventRepository,
    pub attendance: AttendanceRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            churches: ChurchRepository::new(pool.clone()),
            users: ChurchUserRepository::new(pool.clone()),
            subscriptions: SubscriptionRepository::new(pool.clone()),
            super_admins: SuperAdminRepository::new(pool.clone()),
            members: MemberRepository::new(pool.clone()),
            visitors: VisitorRepository::new(pool.clone()),
            events: EventRepository::new(pool.clone()),
            attendance: AttendanceRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Create a church, its owner account and a trial subscription in one transaction
    pub async fn register_church(
        &self,
        church: CreateChurchRequest,
        owner_email: String,
        owner_password_hash: String,
        owner_full_name: String,
        trial_ends_at: DateTime<Utc>,
    ) -> Result<Registration, ShepherdError> {
        let mut tx = self.pool.begin().await?;

        let church = ChurchRepository::create_with(&mut tx, church).await?;
        let owner = ChurchUserRepository::create_with(&mut tx, NewChurchUser {
            church_id: church.id,
            email: owner_email,
            password_hash: owner_password_hash,
            full_name: owner_full_name,
            role: ChurchRole::Owner,
        }).await?;
        let subscription = SubscriptionRepository::create_trial_with(&mut tx, church.id, trial_ends_at).await?;

        tx.commit().await?;

        Ok(Registration { church, owner, subscription })
    }

    /// Turn a visitor into a member, linking the two, in one transaction
    pub async fn convert_visitor(
        &self,
        church_id: i64,
        visitor_id: i64,
        joined_on: NaiveDate,
    ) -> Result<(Visitor, Member), ShepherdError> {
        let mut tx = self.pool.begin().await?;

        let visitor = VisitorRepository::find_for_update_with(&mut tx, church_id, visitor_id)
            .await?
            .ok_or_else(|| ShepherdError::not_found("Visitor", visitor_id))?;

        if visitor.is_converted() {
            return Err(ShepherdError::Conflict("Visitor has already been converted to a member".to_string()));
        }

        let member = MemberRepository::create_with(&mut tx, church_id, CreateMemberRequest {
            first_name: visitor.first_name.clone(),
            last_name: visitor.last_name.clone(),
            email: visitor.email.clone(),
            phone: visitor.phone.clone(),
            status: Some(MemberStatus::Active),
            joined_on: Some(joined_on),
            notes: visitor.notes.clone(),
            ..Default::default()
        }).await?;

        let visitor = VisitorRepository::mark_converted_with(&mut tx, church_id, visitor_id, member.id).await?;

        tx.commit().await?;

        Ok((visitor, member))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::database::connection::create_lazy_pool;

    #[tokio::test]
    async fn test_database_service_creation() {
        let settings = Settings::default();
        let pool = create_lazy_pool(&settings.database).unwrap();
        let service = DatabaseService::new(pool);
        assert_eq!(service.pool().size(), 0);
    }
}
