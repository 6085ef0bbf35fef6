//! Attendance, kiosk and biometric check-in handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use crate::middleware::{ApiJson, ApiQuery, ChurchAuth};
use crate::models::*;
use crate::state::AppState;
use crate::utils::errors::Result;

#[derive(Debug, Default, Deserialize)]
pub struct KioskSearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct BiometricCheckInResponse {
    pub member: Member,
    pub attendance: AttendanceRecord,
}

pub async fn list_attendance(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    ApiQuery(filter): ApiQuery<AttendanceFilter>,
) -> Result<Json<Page<AttendanceEntry>>> {
    state.services.billing_service.require_feature(ctx.church_id, Feature::Attendance).await?;
    let page = state.services.attendance_service.list(ctx.church_id, &filter).await?;
    Ok(Json(page))
}

/// Manual check-in recorded by staff
pub async fn create_attendance(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    ApiJson(request): ApiJson<CheckInRequest>,
) -> Result<(StatusCode, Json<AttendanceRecord>)> {
    state.services.billing_service.require_feature(ctx.church_id, Feature::Attendance).await?;
    let record = state.services.attendance_service.check_in(&ctx, request).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn delete_attendance(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.services.billing_service.require_feature(ctx.church_id, Feature::Attendance).await?;
    state.services.attendance_service.delete(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn biometric_check_in(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    ApiJson(request): ApiJson<BiometricCheckInRequest>,
) -> Result<(StatusCode, Json<BiometricCheckInResponse>)> {
    state.services.billing_service.require_feature(ctx.church_id, Feature::BiometricCheckIn).await?;
    let (member, attendance) = state.services.attendance_service.biometric_check_in(&ctx, request).await?;
    Ok((StatusCode::CREATED, Json(BiometricCheckInResponse { member, attendance })))
}

pub async fn kiosk_search(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    ApiQuery(query): ApiQuery<KioskSearchQuery>,
) -> Result<Json<Vec<Member>>> {
    state.services.billing_service.require_feature(ctx.church_id, Feature::KioskMode).await?;
    let members = state.services.attendance_service.kiosk_search(ctx.church_id, &query.q).await?;
    Ok(Json(members))
}

pub async fn kiosk_check_in(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    ApiJson(request): ApiJson<KioskCheckInRequest>,
) -> Result<(StatusCode, Json<AttendanceRecord>)> {
    state.services.billing_service.require_feature(ctx.church_id, Feature::KioskMode).await?;
    let record = state.services.attendance_service.kiosk_check_in(&ctx, request).await?;
    Ok((StatusCode::CREATED, Json(record)))
}
