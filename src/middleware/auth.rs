//! Authentication middleware
//!
//! Extractors that turn a bearer token into an authenticated principal, and
//! request body/query extractors that report malformed input as 400.

use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use crate::models::{Claims, Validate};
use crate::services::auth::{AdminContext, AuthContext};
use crate::state::AppState;
use crate::utils::errors::ShepherdError;

/// Pull the token out of an `Authorization: Bearer <token>` header
pub fn bearer_token(parts: &Parts) -> Result<&str, ShepherdError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ShepherdError::Unauthorized("Missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| ShepherdError::Unauthorized("Malformed Authorization header".to_string()))?;

    let (scheme, token) = header
        .split_once(' ')
        .ok_or_else(|| ShepherdError::Unauthorized("Malformed Authorization header".to_string()))?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(ShepherdError::Unauthorized("Expected a Bearer token".to_string()));
    }
    Ok(token.trim())
}

fn claims(parts: &Parts, state: &AppState) -> Result<Claims, ShepherdError> {
    let token = bearer_token(parts)?;
    state.services.auth_service.verify_token(token)
}

/// Authenticated church staff member
#[derive(Debug, Clone, Copy)]
pub struct ChurchAuth(pub AuthContext);

#[axum::async_trait]
impl FromRequestParts<AppState> for ChurchAuth {
    type Rejection = ShepherdError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = claims(parts, state)?;
        let ctx = state.services.auth_service.church_context(&claims).await?;
        tracing::Span::current().record("church_id", ctx.church_id);
        Ok(ChurchAuth(ctx))
    }
}

/// Authenticated super admin
#[derive(Debug, Clone, Copy)]
pub struct SuperAdminAuth(pub AdminContext);

#[axum::async_trait]
impl FromRequestParts<AppState> for SuperAdminAuth {
    type Rejection = ShepherdError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = claims(parts, state)?;
        let ctx = state.services.auth_service.admin_context(&claims).await?;
        Ok(SuperAdminAuth(ctx))
    }
}

/// JSON body that has been deserialized and validated
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ShepherdError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ShepherdError::Validation(rejection.body_text()))?;
        value.validate()?;
        Ok(ApiJson(value))
    }
}

/// Query string whose parse failures are reported as validation errors
#[derive(Debug, Clone)]
pub struct ApiQuery<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ShepherdError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ShepherdError::Validation(rejection.body_text()))?;
        Ok(ApiQuery(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = HttpRequest::builder().uri("/api/members");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc.def.ghi"))).unwrap(), "abc.def.ghi");
        assert_eq!(bearer_token(&parts_with(Some("bearer  abc"))).unwrap(), "abc");
    }

    #[test]
    fn test_bearer_token_rejections() {
        for header in [None, Some("Basic dXNlcjpwYXNz"), Some("Bearer"), Some("Bearer   ")] {
            let err = bearer_token(&parts_with(header)).unwrap_err();
            assert!(matches!(err, ShepherdError::Unauthorized(_)), "{:?}", header);
        }
    }
}
