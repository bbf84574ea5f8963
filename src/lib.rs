// src/lib.rs
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod web;

use crate::{
    error::{AppError, AppResult},
    state::AppState,
};
use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

fn cors_layer(origin: Option<&str>) -> AppResult<CorsLayer> {
    let Some(origin) = origin else {
        tracing::warn!("CORS_ORIGIN not set, allowing any origin");
        return Ok(CorsLayer::permissive());
    };

    let origin = HeaderValue::from_str(origin.trim())
        .map_err(|e| AppError::Config(format!("invalid CORS_ORIGIN: {}", e)))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_DISPOSITION]))
}

/// The full application: routes plus tracing and CORS layers.
pub fn build_app(app_state: AppState) -> AppResult<Router> {
    let cors = cors_layer(app_state.config.cors_origin.as_deref())?;
    let app = web::routes::create_router(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );
    Ok(app)
}
