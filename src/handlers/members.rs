//! Member directory handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use crate::middleware::{ApiJson, ApiQuery, ChurchAuth};
use crate::models::*;
use crate::state::AppState;
use crate::utils::errors::Result;

pub async fn list_members(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    ApiQuery(filter): ApiQuery<MemberFilter>,
) -> Result<Json<Page<Member>>> {
    state.services.billing_service.require_feature(ctx.church_id, Feature::MemberDirectory).await?;
    let page = state.services.congregation_service.list_members(ctx.church_id, &filter).await?;
    Ok(Json(page))
}

pub async fn create_member(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    ApiJson(request): ApiJson<CreateMemberRequest>,
) -> Result<(StatusCode, Json<Member>)> {
    let subscription = state
        .services
        .billing_service
        .require_feature(ctx.church_id, Feature::MemberDirectory)
        .await?;
    let member = state
        .services
        .congregation_service
        .create_member(&ctx, &subscription, request)
        .await?;
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn get_member(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    Path(id): Path<i64>,
) -> Result<Json<Member>> {
    state.services.billing_service.require_feature(ctx.church_id, Feature::MemberDirectory).await?;
    let member = state.services.congregation_service.member(ctx.church_id, id).await?;
    Ok(Json(member))
}

pub async fn update_member(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<UpdateMemberRequest>,
) -> Result<Json<Member>> {
    state.services.billing_service.require_feature(ctx.church_id, Feature::MemberDirectory).await?;
    let member = state.services.congregation_service.update_member(&ctx, id, request).await?;
    Ok(Json(member))
}

pub async fn delete_member(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.services.billing_service.require_feature(ctx.church_id, Feature::MemberDirectory).await?;
    state.services.congregation_service.delete_member(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Store a simulated fingerprint for later biometric check-in
pub async fn enroll_biometric(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<BiometricEnrollRequest>,
) -> Result<Json<Member>> {
    state.services.billing_service.require_feature(ctx.church_id, Feature::BiometricCheckIn).await?;
    let member = state.services.attendance_service.enroll_biometric(&ctx, id, request).await?;
    Ok(Json(member))
}

pub async fn remove_biometric(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    Path(id): Path<i64>,
) -> Result<Json<Member>> {
    state.services.billing_service.require_feature(ctx.church_id, Feature::BiometricCheckIn).await?;
    let member = state.services.attendance_service.remove_biometric(&ctx, id).await?;
    Ok(Json(member))
}
