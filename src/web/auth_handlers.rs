// src/web/auth_handlers.rs
use crate::{
    error::AppResult,
    models::user::{
        Availability, CurrentUser, EmailQuery, LoginRequest, RegisterRequest, UserProfile, UsernameQuery,
    },
    services::{auth_service, user_service},
    state::AppState,
    web::extract::{AppJson, AppQuery},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

// POST /auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    req.validate()?;
    let response = auth_service::register(&state.db_pool, &state.config, req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

// POST /auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let response = auth_service::login(&state.db_pool, &state.config, req).await?;
    Ok(Json(response))
}

pub async fn check_username(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<UsernameQuery>,
) -> AppResult<Json<Availability>> {
    let available = user_service::is_username_available(&state.db_pool, &query.username).await?;
    tracing::debug!("Username '{}' available: {}", query.username, available);
    Ok(Json(Availability { available }))
}

pub async fn check_email(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<EmailQuery>,
) -> AppResult<Json<Availability>> {
    let available = user_service::is_email_available(&state.db_pool, &query.email).await?;
    Ok(Json(Availability { available }))
}

// GET /auth/me
pub async fn me(State(state): State<AppState>, user: CurrentUser) -> AppResult<Json<UserProfile>> {
    let user = user_service::get_user(&state.db_pool, user.id).await?;
    Ok(Json(UserProfile::from(&user)))
}
