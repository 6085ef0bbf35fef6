//! Dashboard, attendance report and CSV download handlers

use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::Json;
use crate::middleware::{ApiQuery, ChurchAuth};
use crate::models::*;
use crate::services::{AuthContext, CsvExport};
use crate::state::AppState;
use crate::utils::errors::Result;
use crate::utils::logging::log_export;

pub async fn dashboard(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
) -> Result<Json<DashboardSummary>> {
    state.services.billing_service.require_active(ctx.church_id).await?;
    let summary = state.services.report_service.dashboard(ctx.church_id).await?;
    Ok(Json(summary))
}

pub async fn attendance_report(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    ApiQuery(range): ApiQuery<DateRangeQuery>,
) -> Result<Json<AttendanceReport>> {
    range.validate()?;
    state.services.billing_service.require_feature(ctx.church_id, Feature::Reports).await?;
    let report = state.services.report_service.attendance_report(ctx.church_id, &range).await?;
    Ok(Json(report))
}

fn csv_response(ctx: &AuthContext, kind: &str, export: CsvExport) -> Response {
    log_export(ctx.church_id, ctx.user_id, kind, export.rows);
    let disposition = format!("attachment; filename=\"{}\"", export.filename);
    (
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        export.body,
    )
        .into_response()
}

async fn require_export(state: &AppState, ctx: &AuthContext) -> Result<()> {
    ctx.require(ChurchRole::Staff)?;
    state.services.billing_service.require_feature(ctx.church_id, Feature::CsvExport).await?;
    Ok(())
}

pub async fn export_members(State(state): State<AppState>, ChurchAuth(ctx): ChurchAuth) -> Result<Response> {
    require_export(&state, &ctx).await?;
    let export = state.services.report_service.export_members(ctx.church_id).await?;
    Ok(csv_response(&ctx, "members", export))
}

pub async fn export_visitors(State(state): State<AppState>, ChurchAuth(ctx): ChurchAuth) -> Result<Response> {
    require_export(&state, &ctx).await?;
    let export = state.services.report_service.export_visitors(ctx.church_id).await?;
    Ok(csv_response(&ctx, "visitors", export))
}

pub async fn export_attendance(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    ApiQuery(range): ApiQuery<DateRangeQuery>,
) -> Result<Response> {
    range.validate()?;
    require_export(&state, &ctx).await?;
    let export = state.services.report_service.export_attendance(ctx.church_id, &range).await?;
    Ok(csv_response(&ctx, "attendance", export))
}
