//! Church profile and staff account management

use tracing::info;
use crate::database::repositories::ChurchUserChanges;
use crate::database::DatabaseService;
use crate::models::*;
use crate::services::auth::{hash_password, require_role, AuthContext};
use crate::services::billing::BillingService;
use crate::config::settings::Settings;
use crate::utils::errors::{Result, ShepherdError};
use crate::utils::helpers::{clean_optional, normalize_email};
use crate::utils::logging::log_tenant_action;

#[derive(Clone)]
pub struct ChurchService {
    db: DatabaseService,
    billing: BillingService,
    settings: Settings,
}

impl ChurchService {
    pub fn new(db: DatabaseService, billing: BillingService, settings: Settings) -> Self {
        Self { db, billing, settings }
    }

    pub async fn church(&self, church_id: i64) -> Result<Church> {
        self.db
            .churches
            .find_by_id(church_id)
            .await?
            .ok_or_else(|| ShepherdError::not_found("Church", church_id))
    }

    pub async fn update_church(&self, ctx: &AuthContext, request: UpdateChurchRequest) -> Result<Church> {
        ctx.require(ChurchRole::Admin)?;
        let request = UpdateChurchRequest {
            name: request.name.map(|n| n.trim().to_string()),
            email: clean_optional(request.email).map(|e| normalize_email(&e)),
            phone: clean_optional(request.phone),
            address: clean_optional(request.address),
            utc_offset_minutes: request.utc_offset_minutes,
        };
        let church = self.db.churches.update(ctx.church_id, request).await?;
        log_tenant_action(ctx.church_id, ctx.user_id, "update_church", Some(church.id));
        Ok(church)
    }

    pub async fn user(&self, church_id: i64, user_id: i64) -> Result<ChurchUser> {
        self.db
            .users
            .find_by_id(church_id, user_id)
            .await?
            .ok_or_else(|| ShepherdError::not_found("User", user_id))
    }

    pub async fn list_users(&self, ctx: &AuthContext) -> Result<Vec<ChurchUser>> {
        ctx.require(ChurchRole::Admin)?;
        self.db.users.list(ctx.church_id).await
    }

    pub async fn create_user(&self, ctx: &AuthContext, request: CreateChurchUserRequest) -> Result<ChurchUser> {
        ctx.require(ChurchRole::Admin)?;
        if request.role == ChurchRole::Owner {
            require_role(ctx.role, ChurchRole::Owner)?;
        }
        self.billing.ensure_user_capacity(ctx.church_id).await?;

        let user = self
            .db
            .users
            .create(NewChurchUser {
                church_id: ctx.church_id,
                email: normalize_email(&request.email),
                password_hash: hash_password(&request.password, self.settings.auth.password_iterations),
                full_name: request.full_name.trim().to_string(),
                role: request.role,
            })
            .await?;

        log_tenant_action(ctx.church_id, ctx.user_id, "create_user", Some(user.id));
        Ok(user)
    }

    pub async fn update_user(&self, ctx: &AuthContext, user_id: i64, request: UpdateChurchUserRequest) -> Result<ChurchUser> {
        ctx.require(ChurchRole::Admin)?;
        let target = self.user(ctx.church_id, user_id).await?;

        if user_id == ctx.user_id && (request.role.is_some() || request.is_active == Some(false)) {
            return Err(ShepherdError::PermissionDenied("You cannot change your own role or deactivate yourself".to_string()));
        }
        let touches_owner = target.role() == ChurchRole::Owner || request.role == Some(ChurchRole::Owner);
        if touches_owner {
            require_role(ctx.role, ChurchRole::Owner)?;
        }

        let demoted = request.role.map(|r| r != ChurchRole::Owner).unwrap_or(false);
        let deactivated = request.is_active == Some(false);
        if target.role() == ChurchRole::Owner && target.is_active && (demoted || deactivated) {
            self.ensure_other_owner(ctx.church_id).await?;
        }
        if request.is_active == Some(true) && !target.is_active {
            self.billing.ensure_user_capacity(ctx.church_id).await?;
        }

        let user = self
            .db
            .users
            .update(ctx.church_id, user_id, ChurchUserChanges {
                full_name: request.full_name.map(|n| n.trim().to_string()),
                role: request.role,
                is_active: request.is_active,
                password_hash: request
                    .password
                    .map(|p| hash_password(&p, self.settings.auth.password_iterations)),
            })
            .await?;

        log_tenant_action(ctx.church_id, ctx.user_id, "update_user", Some(user.id));
        Ok(user)
    }

    pub async fn delete_user(&self, ctx: &AuthContext, user_id: i64) -> Result<()> {
        ctx.require(ChurchRole::Admin)?;
        if user_id == ctx.user_id {
            return Err(ShepherdError::PermissionDenied("You cannot delete your own account".to_string()));
        }
        let target = self.user(ctx.church_id, user_id).await?;
        if target.role() == ChurchRole::Owner {
            require_role(ctx.role, ChurchRole::Owner)?;
            if target.is_active {
                self.ensure_other_owner(ctx.church_id).await?;
            }
        }

        if !self.db.users.delete(ctx.church_id, user_id).await? {
            return Err(ShepherdError::not_found("User", user_id));
        }

        info!(church_id = ctx.church_id, user_id = user_id, "Church user deleted");
        log_tenant_action(ctx.church_id, ctx.user_id, "delete_user", Some(user_id));
        Ok(())
    }

    /// A church must always keep one active owner
    async fn ensure_other_owner(&self, church_id: i64) -> Result<()> {
        let owners = self.db.users.count_active(church_id, Some(ChurchRole::Owner)).await?;
        if owners <= 1 {
            return Err(ShepherdError::Conflict("A church must keep at least one active owner".to_string()));
        }
        Ok(())
    }
}
