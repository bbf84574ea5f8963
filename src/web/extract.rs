// src/web/extract.rs
// Request extractors whose rejections go through `AppError`, so malformed
// bodies, paths and query strings get the same JSON error body as every
// other failure.
use crate::error::AppError;
use axum::extract::{FromRequest, FromRequestParts};

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

#[derive(FromRequest)]
#[from_request(rejection(AppError))]
pub struct AppMultipart(pub axum::extract::Multipart);
