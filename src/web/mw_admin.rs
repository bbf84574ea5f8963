// src/web/mw_admin.rs
use crate::{error::AppError, web::mw_auth::Viewer};
use axum::{extract::Request, middleware::Next, response::Response};

/// Lets only ADMIN accounts through. Runs after `mw_auth::authenticate`,
/// which supplies the `CurrentUser` extension.
pub async fn require_admin(Viewer(user): Viewer, request: Request, next: Next) -> Result<Response, AppError> {
    let Some(user) = user else {
        return Err(AppError::Unauthorized);
    };

    if !user.is_admin() {
        tracing::warn!("Admin MW: access denied for {} (role {:?})", user.username, user.role);
        return Err(AppError::Forbidden);
    }

    tracing::debug!("Admin MW: access granted for {}", user.username);
    Ok(next.run(request).await)
}
