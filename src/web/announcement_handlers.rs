// src/web/announcement_handlers.rs
use crate::{
    error::AppResult,
    models::{
        announcement::{AdminAnnouncement, Announcement, CreateAnnouncementRequest, UpdateAnnouncementRequest},
        user::CurrentUser,
    },
    services::announcement_service,
    state::AppState,
    web::{
        extract::{AppJson, AppPath},
        mw_auth::Viewer,
    },
};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

pub async fn list_announcements(State(state): State<AppState>) -> AppResult<Json<Vec<Announcement>>> {
    Ok(Json(announcement_service::list_published(&state.db_pool).await?))
}

pub async fn get_announcement(
    State(state): State<AppState>,
    viewer: Viewer,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Announcement>> {
    Ok(Json(announcement_service::view_announcement(&state.db_pool, viewer.user(), id).await?))
}

// Admin only, enforced by the route layer.
pub async fn create_announcement(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(req): AppJson<CreateAnnouncementRequest>,
) -> AppResult<impl IntoResponse> {
    req.validate()?;
    let announcement = announcement_service::create_announcement(&state.db_pool, &user, &req).await?;
    Ok((StatusCode::CREATED, Json(announcement)))
}

pub async fn update_announcement(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppJson(req): AppJson<UpdateAnnouncementRequest>,
) -> AppResult<Json<Announcement>> {
    req.validate()?;
    Ok(Json(announcement_service::update_announcement(&state.db_pool, id, &req).await?))
}

pub async fn delete_announcement(State(state): State<AppState>, AppPath(id): AppPath<i64>) -> AppResult<StatusCode> {
    announcement_service::delete_announcement(&state.db_pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn admin_list_announcements(State(state): State<AppState>) -> AppResult<Json<Vec<AdminAnnouncement>>> {
    Ok(Json(announcement_service::list_for_admin(&state.db_pool).await?))
}
