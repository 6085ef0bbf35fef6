//! Super admin console handlers

use axum::extract::{Path, State};
use axum::Json;
use crate::middleware::{ApiJson, ApiQuery, SuperAdminAuth};
use crate::models::*;
use crate::services::admin::{ChurchListQuery, ChurchStatusUpdate};
use crate::state::AppState;
use crate::utils::errors::Result;

pub async fn list_churches(
    State(state): State<AppState>,
    SuperAdminAuth(_admin): SuperAdminAuth,
    ApiQuery(query): ApiQuery<ChurchListQuery>,
) -> Result<Json<Page<ChurchOverview>>> {
    let page = state.services.admin_service.list_churches(&query).await?;
    Ok(Json(page))
}

pub async fn get_church(
    State(state): State<AppState>,
    SuperAdminAuth(_admin): SuperAdminAuth,
    Path(id): Path<i64>,
) -> Result<Json<ChurchOverview>> {
    let church = state.services.admin_service.church(id).await?;
    Ok(Json(church))
}

/// Suspend or reactivate a church
pub async fn set_church_status(
    State(state): State<AppState>,
    SuperAdminAuth(admin): SuperAdminAuth,
    Path(id): Path<i64>,
    ApiJson(update): ApiJson<ChurchStatusUpdate>,
) -> Result<Json<ChurchOverview>> {
    let church = state.services.admin_service.set_church_status(&admin, id, update).await?;
    Ok(Json(church))
}

pub async fn update_subscription(
    State(state): State<AppState>,
    SuperAdminAuth(admin): SuperAdminAuth,
    Path(id): Path<i64>,
    ApiJson(update): ApiJson<AdminSubscriptionUpdate>,
) -> Result<Json<Subscription>> {
    let subscription = state
        .services
        .billing_service
        .admin_update(admin.admin_id, id, update)
        .await?;
    Ok(Json(subscription))
}

pub async fn stats(
    State(state): State<AppState>,
    SuperAdminAuth(_admin): SuperAdminAuth,
) -> Result<Json<PlatformStats>> {
    let stats = state.services.report_service.platform_stats().await?;
    Ok(Json(stats))
}
