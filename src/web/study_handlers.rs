// src/web/study_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        study::{
            AddMemberRequest, CreateStudyRequest, MemberListQuery, ProgressRequest, ProgressUpdate, Study,
            StudyDetail, StudyMember, StudyProgress, StudyQuery, StudyResource, StudyRole, UpdateStudyRequest,
        },
        user::CurrentUser,
    },
    services::{study_service, upload_service},
    state::AppState,
    web::{
        extract::{AppJson, AppMultipart, AppPath, AppQuery},
        multipart_form::MultipartForm,
        mw_auth::Viewer,
    },
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub study_id: i64,
    pub user_id: i64,
    pub role: StudyRole,
}

pub async fn list_studies(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<StudyQuery>,
) -> AppResult<Json<Vec<Study>>> {
    Ok(Json(study_service::list_studies(&state.db_pool, &query).await?))
}

pub async fn get_study(
    State(state): State<AppState>,
    viewer: Viewer,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<StudyDetail>> {
    Ok(Json(study_service::get_detail(&state.db_pool, viewer.user(), id).await?))
}

pub async fn create_study(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(req): AppJson<CreateStudyRequest>,
) -> AppResult<impl IntoResponse> {
    req.validate()?;
    let study = study_service::create_study(&state.db_pool, &user, &req).await?;
    Ok((StatusCode::CREATED, Json(study)))
}

pub async fn update_study(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppJson(req): AppJson<UpdateStudyRequest>,
) -> AppResult<Json<Study>> {
    req.validate()?;
    Ok(Json(study_service::update_study(&state.db_pool, &user, id, &req).await?))
}

pub async fn delete_study(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<StatusCode> {
    study_service::delete_study(&state.db_pool, &state.config.upload_dir, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- Membership -----------------------------------------------------------

pub async fn apply(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<impl IntoResponse> {
    let role = study_service::apply(&state.db_pool, &user, id).await?;
    let body = MembershipResponse {
        study_id: id,
        user_id: user.id,
        role,
    };
    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn cancel_application(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<StatusCode> {
    study_service::cancel_application(&state.db_pool, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_members(
    State(state): State<AppState>,
    viewer: Viewer,
    AppPath(id): AppPath<i64>,
    AppQuery(query): AppQuery<MemberListQuery>,
) -> AppResult<Json<Vec<StudyMember>>> {
    let members = study_service::list_members(&state.db_pool, viewer.user(), id, query.include_pending).await?;
    Ok(Json(members))
}

pub async fn add_member(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppJson(req): AppJson<AddMemberRequest>,
) -> AppResult<impl IntoResponse> {
    let role = study_service::add_member(&state.db_pool, &user, id, req.user_id).await?;
    let body = MembershipResponse {
        study_id: id,
        user_id: req.user_id,
        role,
    };
    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn approve_member(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, user_id)): AppPath<(i64, i64)>,
) -> AppResult<Json<MembershipResponse>> {
    let role = study_service::approve_member(&state.db_pool, &user, id, user_id).await?;
    Ok(Json(MembershipResponse { study_id: id, user_id, role }))
}

pub async fn reject_member(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, user_id)): AppPath<(i64, i64)>,
) -> AppResult<StatusCode> {
    study_service::reject_member(&state.db_pool, &user, id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_member(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, user_id)): AppPath<(i64, i64)>,
) -> AppResult<StatusCode> {
    study_service::remove_member(&state.db_pool, &user, id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn nominate_leader(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, user_id)): AppPath<(i64, i64)>,
) -> AppResult<Json<MembershipResponse>> {
    let role = study_service::nominate_leader(&state.db_pool, &user, id, user_id).await?;
    Ok(Json(MembershipResponse { study_id: id, user_id, role }))
}

pub async fn accept_leadership(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Study>> {
    Ok(Json(study_service::accept_leadership(&state.db_pool, &user, id).await?))
}

pub async fn decline_leadership(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<MembershipResponse>> {
    let role = study_service::decline_leadership(&state.db_pool, &user, id).await?;
    Ok(Json(MembershipResponse {
        study_id: id,
        user_id: user.id,
        role,
    }))
}

// ---- Progress -------------------------------------------------------------

pub async fn list_progress(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Vec<StudyProgress>>> {
    Ok(Json(study_service::list_progress(&state.db_pool, &user, id).await?))
}

pub async fn create_progress(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppJson(req): AppJson<ProgressRequest>,
) -> AppResult<impl IntoResponse> {
    req.validate()?;
    let entry = study_service::create_progress(&state.db_pool, &user, id, &req).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn update_progress(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, progress_id)): AppPath<(i64, i64)>,
    AppJson(req): AppJson<ProgressUpdate>,
) -> AppResult<Json<StudyProgress>> {
    req.validate()?;
    let entry = study_service::update_progress(&state.db_pool, &user, id, progress_id, &req).await?;
    Ok(Json(entry))
}

pub async fn delete_progress(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, progress_id)): AppPath<(i64, i64)>,
) -> AppResult<StatusCode> {
    study_service::delete_progress(&state.db_pool, &user, id, progress_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- Resources ------------------------------------------------------------

pub async fn list_resources(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Vec<StudyResource>>> {
    Ok(Json(study_service::list_resources(&state.db_pool, &user, id).await?))
}

// POST /studies/{id}/resources (multipart, field `file`)
pub async fn upload_resource(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppMultipart(multipart): AppMultipart,
) -> AppResult<impl IntoResponse> {
    let mut form = MultipartForm::read(multipart).await?;
    let file = form
        .take_file("file")
        .ok_or_else(|| AppError::BadRequest("multipart field 'file' is required".into()))?;
    let filename = file.filename.as_deref().unwrap_or_default();

    let resource = study_service::upload_resource(
        &state.db_pool,
        &state.config.upload_dir,
        &user,
        id,
        filename,
        &file.bytes,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(resource)))
}

pub async fn download_resource(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, resource_id)): AppPath<(i64, i64)>,
) -> AppResult<impl IntoResponse> {
    let (resource, bytes) =
        study_service::read_resource(&state.db_pool, &state.config.upload_dir, &user, id, resource_id).await?;
    tracing::debug!("Download of resource {} by user {}", resource_id, user.id);

    let headers = [
        (header::CONTENT_TYPE, resource.format.mime_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            upload_service::attachment_header(&resource.original_name),
        ),
    ];
    Ok((headers, bytes))
}

pub async fn delete_resource(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath((id, resource_id)): AppPath<(i64, i64)>,
) -> AppResult<StatusCode> {
    study_service::delete_resource(&state.db_pool, &state.config.upload_dir, &user, id, resource_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
