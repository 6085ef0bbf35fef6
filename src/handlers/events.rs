//! Event handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use crate::middleware::{ApiJson, ApiQuery, ChurchAuth};
use crate::models::*;
use crate::state::AppState;
use crate::utils::errors::Result;

pub async fn list_events(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    ApiQuery(filter): ApiQuery<EventFilter>,
) -> Result<Json<Page<Event>>> {
    state.services.billing_service.require_feature(ctx.church_id, Feature::Events).await?;
    let page = state.services.congregation_service.list_events(ctx.church_id, &filter).await?;
    Ok(Json(page))
}

pub async fn create_event(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    ApiJson(request): ApiJson<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>)> {
    state.services.billing_service.require_feature(ctx.church_id, Feature::Events).await?;
    let event = state.services.congregation_service.create_event(&ctx, request).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn get_event(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    Path(id): Path<i64>,
) -> Result<Json<Event>> {
    state.services.billing_service.require_feature(ctx.church_id, Feature::Events).await?;
    let event = state.services.congregation_service.event(ctx.church_id, id).await?;
    Ok(Json(event))
}

pub async fn update_event(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<UpdateEventRequest>,
) -> Result<Json<Event>> {
    state.services.billing_service.require_feature(ctx.church_id, Feature::Events).await?;
    let event = state.services.congregation_service.update_event(&ctx, id, request).await?;
    Ok(Json(event))
}

pub async fn delete_event(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.services.billing_service.require_feature(ctx.church_id, Feature::Events).await?;
    state.services.congregation_service.delete_event(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
