//! Platform-wide super admin console

use serde::Deserialize;
use crate::database::DatabaseService;
use crate::models::*;
use crate::services::auth::AdminContext;
use crate::utils::errors::{Result, ShepherdError};
use crate::utils::helpers::{like_pattern, page_bounds};
use crate::utils::logging::log_admin_action;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChurchListQuery {
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChurchStatusUpdate {
    pub is_active: bool,
}

impl Validate for ChurchStatusUpdate {
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Clone)]
pub struct AdminService {
    db: DatabaseService,
}

impl AdminService {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    pub async fn list_churches(&self, query: &ChurchListQuery) -> Result<Page<ChurchOverview>> {
        let (limit, offset) = page_bounds(query.limit, query.offset);
        let pattern = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(like_pattern);

        let items = self.db.churches.list_overview(pattern.as_deref(), limit, offset).await?;
        let total = self.db.churches.count_overview(pattern.as_deref()).await?;
        Ok(Page::new(items, total, limit, offset))
    }

    pub async fn church(&self, id: i64) -> Result<ChurchOverview> {
        self.db
            .churches
            .find_overview(id)
            .await?
            .ok_or_else(|| ShepherdError::not_found("Church", id))
    }

    /// Suspend or reactivate a tenant
    pub async fn set_church_status(&self, admin: &AdminContext, id: i64, update: ChurchStatusUpdate) -> Result<ChurchOverview> {
        let church = self.db.churches.set_active(id, update.is_active).await?;

        let action = if update.is_active { "activate_church" } else { "suspend_church" };
        log_admin_action(admin.admin_id, action, Some(&church.slug), None);

        self.church(id).await
    }
}
