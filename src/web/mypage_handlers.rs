// src/web/mypage_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        study::MyStudy,
        team::MyTeams,
        user::{
            ChangeEmailRequest, ChangePasswordRequest, CurrentUser, PrivacySettings, PrivacyUpdate,
            ProfileUpdate, UserProfile, WithdrawRequest,
        },
    },
    services::{
        study_service, team_service,
        upload_service::{self, MAX_PHOTO_BYTES, PHOTO_DIR},
        user_service,
    },
    state::AppState,
    web::{
        extract::{AppJson, AppMultipart},
        multipart_form::MultipartForm,
    },
};
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use validator::Validate;

pub async fn get_profile(State(state): State<AppState>, user: CurrentUser) -> AppResult<Json<UserProfile>> {
    let user = user_service::get_user(&state.db_pool, user.id).await?;
    Ok(Json(UserProfile::from(&user)))
}

pub async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(update): AppJson<ProfileUpdate>,
) -> AppResult<Json<UserProfile>> {
    update.validate()?;
    let user = user_service::update_profile(&state.db_pool, user.id, &update).await?;
    Ok(Json(UserProfile::from(&user)))
}

// POST /mypage/profile/photo (multipart, field `photo`)
pub async fn upload_photo(
    State(state): State<AppState>,
    user: CurrentUser,
    AppMultipart(multipart): AppMultipart,
) -> AppResult<Json<UserProfile>> {
    let mut form = MultipartForm::read(multipart).await?;
    let photo = form
        .take_file("photo")
        .ok_or_else(|| AppError::BadRequest("multipart field 'photo' is required".into()))?;
    let extension = upload_service::validate_image(photo.content_type.as_deref(), &photo.bytes, MAX_PHOTO_BYTES)?;

    let upload_root = &state.config.upload_dir;
    let previous = user_service::get_user(&state.db_pool, user.id).await?.photo_url;
    let stored_name = upload_service::store_file(upload_root, PHOTO_DIR, extension, &photo.bytes).await?;
    let url = upload_service::public_url(PHOTO_DIR, &stored_name);

    let updated = match user_service::set_photo_url(&state.db_pool, user.id, &url).await {
        Ok(updated) => updated,
        Err(e) => {
            upload_service::remove_file(upload_root, PHOTO_DIR, &stored_name).await;
            return Err(e);
        }
    };

    if let Some(old) = previous.as_deref().and_then(|u| upload_service::stored_name_from_url(PHOTO_DIR, u)) {
        upload_service::remove_file(upload_root, PHOTO_DIR, old).await;
    }
    tracing::info!("📷 Profile photo updated for user {}", user.id);
    Ok(Json(UserProfile::from(&updated)))
}

pub async fn get_privacy(State(state): State<AppState>, user: CurrentUser) -> AppResult<Json<PrivacySettings>> {
    let user = user_service::get_user(&state.db_pool, user.id).await?;
    Ok(Json(PrivacySettings {
        show_email: user.show_email,
        show_phone: user.show_phone,
    }))
}

pub async fn update_privacy(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(update): AppJson<PrivacyUpdate>,
) -> AppResult<Json<PrivacySettings>> {
    let user = user_service::update_privacy(&state.db_pool, user.id, &update).await?;
    Ok(Json(PrivacySettings {
        show_email: user.show_email,
        show_phone: user.show_phone,
    }))
}

pub async fn change_password(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(req): AppJson<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    req.validate()?;
    user_service::change_password(&state.db_pool, user.id, &req.current_password, &req.new_password).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn change_email(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(req): AppJson<ChangeEmailRequest>,
) -> AppResult<Json<UserProfile>> {
    req.validate()?;
    let user = user_service::change_email(&state.db_pool, user.id, &req.email).await?;
    Ok(Json(UserProfile::from(&user)))
}

// DELETE /mypage/account
pub async fn withdraw(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(req): AppJson<WithdrawRequest>,
) -> AppResult<StatusCode> {
    user_service::withdraw(&state.db_pool, user.id, &req.password).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn my_teams(State(state): State<AppState>, user: CurrentUser) -> AppResult<Json<MyTeams>> {
    Ok(Json(team_service::my_teams(&state.db_pool, user.id).await?))
}

pub async fn my_studies(State(state): State<AppState>, user: CurrentUser) -> AppResult<Json<Vec<MyStudy>>> {
    Ok(Json(study_service::my_studies(&state.db_pool, user.id).await?))
}
