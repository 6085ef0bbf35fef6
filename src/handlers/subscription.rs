//! Subscription status and owner plan management

use axum::extract::State;
use axum::Json;
use crate::middleware::{ApiJson, ChurchAuth};
use crate::models::*;
use crate::services::SubscriptionSummary;
use crate::state::AppState;
use crate::utils::errors::Result;

pub async fn get_subscription(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
) -> Result<Json<SubscriptionSummary>> {
    let summary = state.services.billing_service.summary(ctx.church_id).await?;
    Ok(Json(summary))
}

pub async fn change_plan(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    ApiJson(request): ApiJson<ChangePlanRequest>,
) -> Result<Json<SubscriptionSummary>> {
    ctx.require(ChurchRole::Owner)?;
    let billing = &state.services.billing_service;
    billing.change_plan(ctx.church_id, ctx.user_id, request.plan).await?;
    Ok(Json(billing.summary(ctx.church_id).await?))
}

pub async fn cancel(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
) -> Result<Json<SubscriptionSummary>> {
    ctx.require(ChurchRole::Owner)?;
    let billing = &state.services.billing_service;
    billing.cancel(ctx.church_id, ctx.user_id).await?;
    Ok(Json(billing.summary(ctx.church_id).await?))
}
