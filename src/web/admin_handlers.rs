// src/web/admin_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        admin::{
            ActivityImageUpdate, ActivityImageView, ImportSummary, RecruitmentSettings, RecruitmentStatus,
            RecruitmentUpdate, Statistics, StatisticsInput, PHOTOS_FILE, STATISTIC_FILE,
        },
        split_list,
        user::{AdminMemberQuery, AdminMemberUpdate, CurrentUser, UserProfile},
    },
    services::{
        admin_service::{self, NewActivity},
        upload_service, user_service,
    },
    state::AppState,
    web::{
        extract::{AppJson, AppMultipart, AppPath, AppQuery},
        multipart_form::MultipartForm,
    },
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use validator::Validate;

// --- Recruitment ---

// GET /recruitment (public)
pub async fn recruitment_status(State(state): State<AppState>) -> AppResult<Json<RecruitmentStatus>> {
    Ok(Json(admin_service::recruitment_status(&state.db_pool).await?))
}

pub async fn get_recruitment(State(state): State<AppState>) -> AppResult<Json<RecruitmentSettings>> {
    Ok(Json(admin_service::get_recruitment(&state.db_pool).await?))
}

pub async fn put_recruitment(
    State(state): State<AppState>,
    AppJson(req): AppJson<RecruitmentUpdate>,
) -> AppResult<Json<RecruitmentStatus>> {
    req.validate()?;
    admin_service::update_recruitment(&state.db_pool, &req).await?;
    Ok(Json(admin_service::recruitment_status(&state.db_pool).await?))
}

// --- Activity images ---

// GET /activities (public)
pub async fn list_activities(State(state): State<AppState>) -> AppResult<Json<Vec<ActivityImageView>>> {
    Ok(Json(admin_service::list_activities(&state.db_pool).await?))
}

pub async fn create_activity(State(state): State<AppState>, AppMultipart(multipart): AppMultipart) -> AppResult<impl IntoResponse> {
    let mut form = MultipartForm::read(multipart).await?;
    let image = form
        .take_file("image")
        .ok_or_else(|| AppError::BadRequest("multipart field 'image' is required".into()))?;

    let sort_order = match form.field("sort_order").map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            raw.parse::<i64>()
                .map_err(|_| AppError::BadRequest("sort_order must be an integer".into()))?,
        ),
        None => None,
    };
    let meta = NewActivity {
        title: form.field("title").map(str::to_string),
        tags: split_list(form.field("tags")),
        sort_order,
    };

    let view = admin_service::create_activity(&state.db_pool, &state.config.upload_dir, meta, &image).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn update_activity(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppJson(req): AppJson<ActivityImageUpdate>,
) -> AppResult<Json<ActivityImageView>> {
    Ok(Json(admin_service::update_activity(&state.db_pool, id, &req).await?))
}

pub async fn delete_activity(State(state): State<AppState>, AppPath(id): AppPath<i64>) -> AppResult<StatusCode> {
    admin_service::delete_activity(&state.db_pool, &state.config.upload_dir, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Statistics ---

// GET /statistics (public)
pub async fn get_statistics(State(state): State<AppState>) -> AppResult<Json<Statistics>> {
    Ok(Json(admin_service::get_statistics(&state.db_pool).await?))
}

pub async fn put_statistics(
    State(state): State<AppState>,
    AppJson(input): AppJson<StatisticsInput>,
) -> AppResult<Json<Statistics>> {
    input.validate()?;
    Ok(Json(admin_service::update_statistics(&state.db_pool, &input).await?))
}

// --- Settings bundle ---

fn json_attachment(filename: &str, body: Vec<u8>) -> impl IntoResponse {
    let headers = [
        (header::CONTENT_TYPE, "application/json".to_string()),
        (header::CONTENT_DISPOSITION, upload_service::attachment_header(filename)),
    ];
    (headers, body)
}

pub async fn export_statistic(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let body = admin_service::export_statistic(&state.db_pool).await?;
    Ok(json_attachment(STATISTIC_FILE, body))
}

pub async fn export_photos(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let body = admin_service::export_photos(&state.db_pool).await?;
    Ok(json_attachment(PHOTOS_FILE, body))
}

// POST /admin/settings/import (multipart with statistic.json and photos.json)
pub async fn import_settings(State(state): State<AppState>, AppMultipart(multipart): AppMultipart) -> AppResult<Json<ImportSummary>> {
    let form = MultipartForm::read(multipart).await?;
    let bundle = admin_service::parse_bundle(form.into_named_files())?;
    Ok(Json(admin_service::import_settings(&state.db_pool, bundle).await?))
}

// --- Member records ---

pub async fn list_member_records(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<AdminMemberQuery>,
) -> AppResult<Json<Vec<UserProfile>>> {
    let users = user_service::admin_list_users(&state.db_pool, &query).await?;
    Ok(Json(users.iter().map(UserProfile::from).collect()))
}

pub async fn get_member_record(State(state): State<AppState>, AppPath(id): AppPath<i64>) -> AppResult<Json<UserProfile>> {
    let user = user_service::get_user(&state.db_pool, id).await?;
    Ok(Json(UserProfile::from(&user)))
}

pub async fn update_member_record(
    State(state): State<AppState>,
    admin: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppJson(req): AppJson<AdminMemberUpdate>,
) -> AppResult<Json<UserProfile>> {
    req.validate()?;
    tracing::info!("Admin {} edits member record {}", admin.username, id);
    let user = user_service::admin_update_user(&state.db_pool, admin.id, id, &req).await?;
    Ok(Json(UserProfile::from(&user)))
}
