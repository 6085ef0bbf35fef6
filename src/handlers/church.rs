//! Church profile and staff account handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use crate::middleware::{ApiJson, ChurchAuth};
use crate::models::*;
use crate::state::AppState;
use crate::utils::errors::Result;

pub async fn get_church(State(state): State<AppState>, ChurchAuth(ctx): ChurchAuth) -> Result<Json<Church>> {
    let church = state.services.church_service.church(ctx.church_id).await?;
    Ok(Json(church))
}

pub async fn update_church(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    ApiJson(request): ApiJson<UpdateChurchRequest>,
) -> Result<Json<Church>> {
    let church = state.services.church_service.update_church(&ctx, request).await?;
    Ok(Json(church))
}

pub async fn list_users(State(state): State<AppState>, ChurchAuth(ctx): ChurchAuth) -> Result<Json<Vec<ChurchUser>>> {
    let users = state.services.church_service.list_users(&ctx).await?;
    Ok(Json(users))
}

pub async fn create_user(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    ApiJson(request): ApiJson<CreateChurchUserRequest>,
) -> Result<(StatusCode, Json<ChurchUser>)> {
    let user = state.services.church_service.create_user(&ctx, request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<UpdateChurchUserRequest>,
) -> Result<Json<ChurchUser>> {
    let user = state.services.church_service.update_user(&ctx, id, request).await?;
    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.services.church_service.delete_user(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
