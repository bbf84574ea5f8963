// src/web/health_handlers.rs
use crate::{
    services::health_service::{self, SystemStatus},
    state::AppState,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

// GET /health/live
pub async fn live() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

// GET /health/ready
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let db = health_service::check_database(&state.db_pool).await;
    if db.ok {
        (StatusCode::OK, Json(json!({ "status": "ok" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unavailable",
                "error": db.error.unwrap_or_else(|| "database unreachable".into()),
            })),
        )
    }
}

// GET /health/status
pub async fn status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(health_service::system_status(&state.db_pool, state.started_at.elapsed()).await)
}
