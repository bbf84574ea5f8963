// src/web/member_handlers.rs
use crate::{
    error::AppResult,
    models::user::{MemberQuery, PublicProfile},
    services::member_service,
    state::AppState,
    web::extract::{AppPath, AppQuery},
};
use axum::{
    extract::State,
    Json,
};

pub async fn list_members(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<MemberQuery>,
) -> AppResult<Json<Vec<PublicProfile>>> {
    tracing::debug!("GET /members: {:?}", query);
    Ok(Json(member_service::list_members(&state.db_pool, &query).await?))
}

pub async fn get_member(State(state): State<AppState>, AppPath(id): AppPath<i64>) -> AppResult<Json<PublicProfile>> {
    Ok(Json(member_service::get_member(&state.db_pool, id).await?))
}
