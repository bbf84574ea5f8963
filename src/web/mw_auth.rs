// src/web/mw_auth.rs
use crate::{
    error::AppError,
    models::user::CurrentUser,
    services::{auth_service, user_service},
    state::AppState,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;

fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, AppError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AppError::Unauthorized)?;
    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(Some(token.trim().to_string()))
        }
        _ => {
            tracing::debug!("Auth MW: malformed Authorization header");
            Err(AppError::Unauthorized)
        }
    }
}

/// Runs on every API request. A valid bearer token puts a `CurrentUser` into
/// the request extensions; no token means an anonymous request; a bad token
/// is a 401.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = bearer_token(request.headers())? else {
        return Ok(next.run(request).await);
    };

    let claims = auth_service::decode_token(&state.config.jwt_secret, &token).map_err(|e| {
        tracing::debug!("Auth MW: token rejected: {:?}", e);
        AppError::Unauthorized
    })?;
    let user_id = claims.user_id()?;

    let user = match user_service::find_user_by_id(&state.db_pool, user_id).await? {
        Some(user) if !user.is_withdrawn() => user,
        _ => {
            tracing::warn!("Auth MW: token for missing or withdrawn user {}", user_id);
            return Err(AppError::Unauthorized);
        }
    };

    tracing::debug!("Auth MW: user '{}' authenticated", user.username);
    request.extensions_mut().insert(CurrentUser {
        id: user.id,
        username: user.username,
        role: user.role,
    });
    Ok(next.run(request).await)
}

/// Route layer for groups where every route needs a logged-in user.
pub async fn require_auth(request: Request, next: Next) -> Result<Response, AppError> {
    if request.extensions().get::<CurrentUser>().is_none() {
        tracing::debug!("Auth MW: anonymous request to {} refused", request.uri().path());
        return Err(AppError::Unauthorized);
    }
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// The caller if one is logged in. Never rejects.
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<CurrentUser>);

impl Viewer {
    pub fn user(&self) -> Option<&CurrentUser> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Viewer(parts.extensions.get::<CurrentUser>().cloned()))
    }
}
