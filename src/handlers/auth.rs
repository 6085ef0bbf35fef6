//! Sign-up, login and session handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use crate::middleware::{ApiJson, ChurchAuth};
use crate::models::*;
use crate::state::AppState;
use crate::utils::errors::Result;

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    #[serde(flatten)]
    pub token: TokenResponse,
    pub user: ChurchUser,
    pub church: Church,
    pub subscription: Subscription,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub token: TokenResponse,
    pub user: ChurchUser,
}

#[derive(Debug, Serialize)]
pub struct AdminLoginResponse {
    #[serde(flatten)]
    pub token: TokenResponse,
    pub admin: SuperAdmin,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: ChurchUser,
    pub church: Church,
}

/// Create a church, its owner account and a trial subscription
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterChurchRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let (registration, token) = state.services.auth_service.register(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            token,
            user: registration.owner,
            church: registration.church,
            subscription: registration.subscription,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let (user, token) = state.services.auth_service.login(request).await?;
    Ok(Json(LoginResponse { token, user }))
}

pub async fn me(State(state): State<AppState>, ChurchAuth(ctx): ChurchAuth) -> Result<Json<MeResponse>> {
    let church_service = &state.services.church_service;
    let user = church_service.user(ctx.church_id, ctx.user_id).await?;
    let church = church_service.church(ctx.church_id).await?;
    Ok(Json(MeResponse { user, church }))
}

pub async fn admin_login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<AdminLoginResponse>> {
    let (admin, token) = state.services.auth_service.admin_login(request).await?;
    Ok(Json(AdminLoginResponse { token, admin }))
}
