// src/web/team_handlers.rs
use crate::{
    error::AppResult,
    models::{
        team::{
            ApplicationStatus, Applicant, ApplyRequest, CreateTeamRequest, StatusResponse, TeamQuery, TeamRole,
            TeamView, UpdateTeamRequest,
        },
        user::CurrentUser,
    },
    services::team_service,
    state::AppState,
    web::extract::{AppJson, AppPath, AppQuery},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

pub async fn list_teams(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TeamQuery>,
) -> AppResult<Json<Vec<TeamView>>> {
    Ok(Json(team_service::list_teams(&state.db_pool, &query).await?))
}

pub async fn get_team(State(state): State<AppState>, AppPath(id): AppPath<i64>) -> AppResult<Json<TeamView>> {
    Ok(Json(team_service::get_team(&state.db_pool, id).await?))
}

pub async fn create_team(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(req): AppJson<CreateTeamRequest>,
) -> AppResult<impl IntoResponse> {
    req.validate()?;
    let team = team_service::create_team(&state.db_pool, &user, &req).await?;
    Ok((StatusCode::CREATED, Json(team)))
}

pub async fn update_team(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppJson(req): AppJson<UpdateTeamRequest>,
) -> AppResult<Json<TeamView>> {
    req.validate()?;
    Ok(Json(team_service::update_team(&state.db_pool, &user, id, &req).await?))
}

pub async fn delete_team(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<StatusCode> {
    team_service::delete_team(&state.db_pool, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// PATCH /teams/{id}/status
pub async fn toggle_status(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<StatusResponse>> {
    let status = team_service::toggle_status(&state.db_pool, &user, id).await?;
    Ok(Json(StatusResponse { id, status }))
}

pub async fn list_roles(State(state): State<AppState>, AppPath(id): AppPath<i64>) -> AppResult<Json<Vec<TeamRole>>> {
    team_service::find_team(&state.db_pool, id).await?;
    Ok(Json(team_service::list_roles(&state.db_pool, id).await?))
}

pub async fn apply(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppJson(req): AppJson<ApplyRequest>,
) -> AppResult<impl IntoResponse> {
    let status = team_service::apply(&state.db_pool, &user, id, req.role_id).await?;
    Ok((StatusCode::CREATED, Json(status)))
}

pub async fn cancel_application(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<StatusCode> {
    team_service::cancel_application(&state.db_pool, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn application_status(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<ApplicationStatus>> {
    Ok(Json(team_service::application_status(&state.db_pool, user.id, id).await?))
}

pub async fn list_applications(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Vec<Applicant>>> {
    Ok(Json(team_service::list_applications(&state.db_pool, &user, id).await?))
}
