//! Visitor tracking handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use crate::middleware::{ApiJson, ApiQuery, ChurchAuth};
use crate::models::*;
use crate::state::AppState;
use crate::utils::errors::Result;

#[derive(Debug, Serialize)]
pub struct ConversionResponse {
    pub visitor: Visitor,
    pub member: Member,
}

pub async fn list_visitors(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    ApiQuery(filter): ApiQuery<VisitorFilter>,
) -> Result<Json<Page<Visitor>>> {
    state.services.billing_service.require_feature(ctx.church_id, Feature::Visitors).await?;
    let page = state.services.congregation_service.list_visitors(ctx.church_id, &filter).await?;
    Ok(Json(page))
}

pub async fn create_visitor(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    ApiJson(request): ApiJson<CreateVisitorRequest>,
) -> Result<(StatusCode, Json<Visitor>)> {
    state.services.billing_service.require_feature(ctx.church_id, Feature::Visitors).await?;
    let church = state.services.church_service.church(ctx.church_id).await?;
    let visitor = state
        .services
        .congregation_service
        .create_visitor(&ctx, &church, request)
        .await?;
    Ok((StatusCode::CREATED, Json(visitor)))
}

pub async fn get_visitor(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    Path(id): Path<i64>,
) -> Result<Json<Visitor>> {
    state.services.billing_service.require_feature(ctx.church_id, Feature::Visitors).await?;
    let visitor = state.services.congregation_service.visitor(ctx.church_id, id).await?;
    Ok(Json(visitor))
}

pub async fn update_visitor(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<UpdateVisitorRequest>,
) -> Result<Json<Visitor>> {
    state.services.billing_service.require_feature(ctx.church_id, Feature::Visitors).await?;
    let visitor = state.services.congregation_service.update_visitor(&ctx, id, request).await?;
    Ok(Json(visitor))
}

pub async fn delete_visitor(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.services.billing_service.require_feature(ctx.church_id, Feature::Visitors).await?;
    state.services.congregation_service.delete_visitor(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Promote a visitor to a member
pub async fn convert_visitor(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<ConversionResponse>)> {
    let subscription = state
        .services
        .billing_service
        .require_feature(ctx.church_id, Feature::Visitors)
        .await?;
    let church = state.services.church_service.church(ctx.church_id).await?;
    let (visitor, member) = state
        .services
        .congregation_service
        .convert_visitor(&ctx, &church, &subscription, id)
        .await?;
    Ok((StatusCode::CREATED, Json(ConversionResponse { visitor, member })))
}
