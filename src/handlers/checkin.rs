//! External check-in link: staff configuration and the public page

use std::net::SocketAddr;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::StatusCode;
use axum::Json;
use crate::middleware::{ApiJson, ChurchAuth};
use crate::models::*;
use crate::state::AppState;
use crate::utils::errors::Result;

/// Client address used to throttle PIN guesses; requests without connection
/// info (in-process callers) share one bucket
pub fn client_address(info: Option<ConnectInfo<SocketAddr>>) -> String {
    info.map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn get_link(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
) -> Result<Json<CheckInLinkSettings>> {
    let settings = state.services.checkin_service.link_settings(ctx.church_id).await?;
    Ok(Json(settings))
}

pub async fn update_link(
    State(state): State<AppState>,
    ChurchAuth(ctx): ChurchAuth,
    ApiJson(request): ApiJson<UpdateCheckInLinkRequest>,
) -> Result<Json<CheckInLinkSettings>> {
    state.services.billing_service.require_feature(ctx.church_id, Feature::ExternalCheckIn).await?;
    let settings = state.services.checkin_service.update(&ctx, request).await?;
    Ok(Json(settings))
}

pub async fn public_info(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PublicChurchInfo>> {
    let info = state.services.checkin_service.public_info(&slug).await?;
    Ok(Json(info))
}

pub async fn public_search(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    ApiJson(request): ApiJson<PublicMemberSearchRequest>,
) -> Result<Json<Vec<PublicMember>>> {
    let client = client_address(connect_info);
    let members = state.services.checkin_service.search_members(&slug, &client, request).await?;
    Ok(Json(members))
}

pub async fn public_check_in(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    ApiJson(request): ApiJson<PublicCheckInRequest>,
) -> Result<(StatusCode, Json<AttendanceRecord>)> {
    let client = client_address(connect_info);
    let record = state.services.checkin_service.check_in(&slug, &client, request).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_address() {
        let addr: SocketAddr = "203.0.113.7:51234".parse().unwrap();
        assert_eq!(client_address(Some(ConnectInfo(addr))), "203.0.113.7");
        assert_eq!(client_address(None), "unknown");
    }
}
