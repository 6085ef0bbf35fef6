//! Members, visitors and events
//!
//! Every call takes the caller's church id and never reads or writes rows of
//! another church; a foreign id looks exactly like a missing one.

use chrono::Utc;
use crate::database::repositories::NewVisitor;
use crate::database::DatabaseService;
use crate::models::*;
use crate::services::auth::AuthContext;
use crate::services::billing::BillingService;
use crate::utils::errors::{Result, ShepherdError};
use crate::utils::helpers::{clean_optional, like_pattern, local_date, normalize_email, page_bounds};
use crate::utils::logging::log_tenant_action;

#[derive(Clone)]
pub struct CongregationService {
    db: DatabaseService,
    billing: BillingService,
}

impl CongregationService {
    pub fn new(db: DatabaseService, billing: BillingService) -> Self {
        Self { db, billing }
    }

    // Members

    pub async fn list_members(&self, church_id: i64, filter: &MemberFilter) -> Result<Page<Member>> {
        let (limit, offset) = page_bounds(filter.limit, filter.offset);
        let pattern = filter
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(like_pattern);

        let items = self.db.members.list(church_id, pattern.as_deref(), filter.status, limit, offset).await?;
        let total = self.db.members.count(church_id, pattern.as_deref(), filter.status).await?;
        Ok(Page::new(items, total, limit, offset))
    }

    pub async fn member(&self, church_id: i64, id: i64) -> Result<Member> {
        self.db
            .members
            .find_by_id(church_id, id)
            .await?
            .ok_or_else(|| ShepherdError::not_found("Member", id))
    }

    pub async fn create_member(&self, ctx: &AuthContext, subscription: &Subscription, request: CreateMemberRequest) -> Result<Member> {
        ctx.require(ChurchRole::Staff)?;
        self.billing.ensure_member_capacity(ctx.church_id, subscription).await?;

        let request = CreateMemberRequest {
            email: clean_optional(request.email).map(|e| normalize_email(&e)),
            phone: clean_optional(request.phone),
            gender: clean_optional(request.gender),
            address: clean_optional(request.address),
            notes: clean_optional(request.notes),
            ..request
        };
        let member = self.db.members.create(ctx.church_id, request).await?;
        log_tenant_action(ctx.church_id, ctx.user_id, "create_member", Some(member.id));
        Ok(member)
    }

    pub async fn update_member(&self, ctx: &AuthContext, id: i64, request: UpdateMemberRequest) -> Result<Member> {
        ctx.require(ChurchRole::Staff)?;
        let request = UpdateMemberRequest {
            email: request.email.map(|e| normalize_email(&e)),
            ..request
        };
        let member = self.db.members.update(ctx.church_id, id, request).await?;
        log_tenant_action(ctx.church_id, ctx.user_id, "update_member", Some(id));
        Ok(member)
    }

    pub async fn delete_member(&self, ctx: &AuthContext, id: i64) -> Result<()> {
        ctx.require(ChurchRole::Admin)?;
        if !self.db.members.delete(ctx.church_id, id).await? {
            return Err(ShepherdError::not_found("Member", id));
        }
        log_tenant_action(ctx.church_id, ctx.user_id, "delete_member", Some(id));
        Ok(())
    }

    // Visitors

    pub async fn list_visitors(&self, church_id: i64, filter: &VisitorFilter) -> Result<Page<Visitor>> {
        if let (Some(from), Some(to)) = (filter.from, filter.to) {
            if from > to {
                return Err(ShepherdError::Validation("from must not be after to".to_string()));
            }
        }
        let (limit, offset) = page_bounds(filter.limit, filter.offset);
        let items = self.db.visitors.list(church_id, filter, limit, offset).await?;
        let total = self.db.visitors.count(church_id, filter).await?;
        Ok(Page::new(items, total, limit, offset))
    }

    pub async fn visitor(&self, church_id: i64, id: i64) -> Result<Visitor> {
        self.db
            .visitors
            .find_by_id(church_id, id)
            .await?
            .ok_or_else(|| ShepherdError::not_found("Visitor", id))
    }

    pub async fn create_visitor(&self, ctx: &AuthContext, church: &Church, request: CreateVisitorRequest) -> Result<Visitor> {
        ctx.require(ChurchRole::Staff)?;
        let visit_date = request
            .visit_date
            .unwrap_or_else(|| local_date(Utc::now(), church.utc_offset_minutes));

        let visitor = self
            .db
            .visitors
            .create(NewVisitor {
                church_id: ctx.church_id,
                first_name: request.first_name.trim().to_string(),
                last_name: request.last_name.trim().to_string(),
                email: clean_optional(request.email).map(|e| normalize_email(&e)),
                phone: clean_optional(request.phone),
                visit_date,
                invited_by: clean_optional(request.invited_by),
                notes: clean_optional(request.notes),
            })
            .await?;

        log_tenant_action(ctx.church_id, ctx.user_id, "create_visitor", Some(visitor.id));
        Ok(visitor)
    }

    pub async fn update_visitor(&self, ctx: &AuthContext, id: i64, request: UpdateVisitorRequest) -> Result<Visitor> {
        ctx.require(ChurchRole::Staff)?;
        let current = self.visitor(ctx.church_id, id).await?;
        if current.is_converted() && request.follow_up_status.is_some() {
            return Err(ShepherdError::Conflict("Visitor has already been converted to a member".to_string()));
        }
        let visitor = self.db.visitors.update(ctx.church_id, id, request).await?;
        log_tenant_action(ctx.church_id, ctx.user_id, "update_visitor", Some(id));
        Ok(visitor)
    }

    pub async fn delete_visitor(&self, ctx: &AuthContext, id: i64) -> Result<()> {
        ctx.require(ChurchRole::Staff)?;
        if !self.db.visitors.delete(ctx.church_id, id).await? {
            return Err(ShepherdError::not_found("Visitor", id));
        }
        log_tenant_action(ctx.church_id, ctx.user_id, "delete_visitor", Some(id));
        Ok(())
    }

    /// Create a member from a visitor; counts against the member limit
    pub async fn convert_visitor(
        &self,
        ctx: &AuthContext,
        church: &Church,
        subscription: &Subscription,
        id: i64,
    ) -> Result<(Visitor, Member)> {
        ctx.require(ChurchRole::Staff)?;
        self.billing.ensure_member_capacity(ctx.church_id, subscription).await?;

        let joined_on = local_date(Utc::now(), church.utc_offset_minutes);
        let (visitor, member) = self.db.convert_visitor(ctx.church_id, id, joined_on).await?;
        log_tenant_action(ctx.church_id, ctx.user_id, "convert_visitor", Some(member.id));
        Ok((visitor, member))
    }

    // Events

    pub async fn list_events(&self, church_id: i64, filter: &EventFilter) -> Result<Page<Event>> {
        let (limit, offset) = page_bounds(filter.limit, filter.offset);
        let items = self.db.events.list(church_id, filter, limit, offset).await?;
        let total = self.db.events.count(church_id, filter).await?;
        Ok(Page::new(items, total, limit, offset))
    }

    pub async fn event(&self, church_id: i64, id: i64) -> Result<Event> {
        self.db
            .events
            .find_by_id(church_id, id)
            .await?
            .ok_or_else(|| ShepherdError::not_found("Event", id))
    }

    pub async fn create_event(&self, ctx: &AuthContext, request: CreateEventRequest) -> Result<Event> {
        ctx.require(ChurchRole::Staff)?;
        let event = self.db.events.create(ctx.church_id, Some(ctx.user_id), request).await?;
        log_tenant_action(ctx.church_id, ctx.user_id, "create_event", Some(event.id));
        Ok(event)
    }

    pub async fn update_event(&self, ctx: &AuthContext, id: i64, request: UpdateEventRequest) -> Result<Event> {
        ctx.require(ChurchRole::Staff)?;
        let current = self.event(ctx.church_id, id).await?;

        // Window is checked against whichever end is unchanged
        let starts_at = request.starts_at.unwrap_or(current.starts_at);
        let ends_at = request.ends_at.or(current.ends_at);
        if let Some(ends_at) = ends_at {
            if ends_at <= starts_at {
                return Err(ShepherdError::Validation("ends_at must be after starts_at".to_string()));
            }
        }

        let event = self.db.events.update(ctx.church_id, id, request).await?;
        log_tenant_action(ctx.church_id, ctx.user_id, "update_event", Some(id));
        Ok(event)
    }

    pub async fn delete_event(&self, ctx: &AuthContext, id: i64) -> Result<()> {
        ctx.require(ChurchRole::Staff)?;
        if !self.db.events.delete(ctx.church_id, id).await? {
            return Err(ShepherdError::not_found("Event", id));
        }
        log_tenant_action(ctx.church_id, ctx.user_id, "delete_event", Some(id));
        Ok(())
    }
}
