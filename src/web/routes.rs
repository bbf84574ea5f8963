// src/web/routes.rs
use crate::{
    services::upload_service::{ACTIVITY_DIR, PHOTO_DIR},
    state::AppState,
    web::{
        admin_handlers, announcement_handlers, auth_handlers, health_handlers, member_handlers, mw_admin, mw_auth,
        mypage_handlers, study_handlers, team_handlers,
    },
};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::services::ServeDir;

/// Request bodies above this are refused before any handler runs.
pub const BODY_LIMIT_BYTES: usize = 12 * 1024 * 1024;

pub fn create_router(app_state: AppState) -> Router {
    let upload_dir = app_state.config.upload_dir.clone();

    let health_routes = Router::new()
        .route("/live", get(health_handlers::live))
        .route("/ready", get(health_handlers::ready))
        .route("/status", get(health_handlers::status));

    let auth_routes = Router::new()
        .route("/register", post(auth_handlers::handle_register))
        .route("/login", post(auth_handlers::handle_login))
        .route("/check-username", get(auth_handlers::check_username))
        .route("/check-email", get(auth_handlers::check_email))
        .route("/me", get(auth_handlers::me));

    let member_routes = Router::new()
        .route("/", get(member_handlers::list_members))
        .route("/{id}", get(member_handlers::get_member));

    // Write routes resolve the caller through the `CurrentUser` extractor
    // (401 when anonymous); leader checks happen in the services.
    let team_routes = Router::new()
        .route("/", get(team_handlers::list_teams).post(team_handlers::create_team))
        .route(
            "/{id}",
            get(team_handlers::get_team)
                .patch(team_handlers::update_team)
                .delete(team_handlers::delete_team),
        )
        .route("/{id}/status", patch(team_handlers::toggle_status))
        .route("/{id}/roles", get(team_handlers::list_roles))
        .route(
            "/{id}/apply",
            post(team_handlers::apply).delete(team_handlers::cancel_application),
        )
        .route("/{id}/application-status", get(team_handlers::application_status))
        .route("/{id}/applications", get(team_handlers::list_applications));

    let study_routes = Router::new()
        .route("/", get(study_handlers::list_studies).post(study_handlers::create_study))
        .route(
            "/{id}",
            get(study_handlers::get_study)
                .patch(study_handlers::update_study)
                .delete(study_handlers::delete_study),
        )
        .route(
            "/{id}/apply",
            post(study_handlers::apply).delete(study_handlers::cancel_application),
        )
        .route(
            "/{id}/members",
            get(study_handlers::list_members).post(study_handlers::add_member),
        )
        .route("/{id}/members/{user_id}", delete(study_handlers::remove_member))
        .route("/{id}/members/{user_id}/approve", post(study_handlers::approve_member))
        .route("/{id}/members/{user_id}/reject", post(study_handlers::reject_member))
        .route("/{id}/members/{user_id}/nominate", post(study_handlers::nominate_leader))
        .route("/{id}/leader/accept", post(study_handlers::accept_leadership))
        .route("/{id}/leader/decline", post(study_handlers::decline_leadership))
        .route(
            "/{id}/progress",
            get(study_handlers::list_progress).post(study_handlers::create_progress),
        )
        .route(
            "/{id}/progress/{progress_id}",
            patch(study_handlers::update_progress).delete(study_handlers::delete_progress),
        )
        .route(
            "/{id}/resources",
            get(study_handlers::list_resources).post(study_handlers::upload_resource),
        )
        .route(
            "/{id}/resources/{resource_id}",
            delete(study_handlers::delete_resource),
        )
        .route(
            "/{id}/resources/{resource_id}/download",
            get(study_handlers::download_resource),
        );

    // Reads are public, writes are admin only on the same paths.
    let admin_only = || middleware::from_fn(mw_admin::require_admin);
    let announcement_routes = Router::new()
        .route(
            "/",
            get(announcement_handlers::list_announcements)
                .merge(post(announcement_handlers::create_announcement).route_layer(admin_only())),
        )
        .route(
            "/{id}",
            get(announcement_handlers::get_announcement).merge(
                patch(announcement_handlers::update_announcement)
                    .delete(announcement_handlers::delete_announcement)
                    .route_layer(admin_only()),
            ),
        );

    let public_admin_data = Router::new()
        .route("/recruitment", get(admin_handlers::recruitment_status))
        .route("/activities", get(admin_handlers::list_activities))
        .route("/statistics", get(admin_handlers::get_statistics));

    let admin_routes = Router::new()
        .route(
            "/recruitment",
            get(admin_handlers::get_recruitment).put(admin_handlers::put_recruitment),
        )
        .route("/activities", post(admin_handlers::create_activity))
        .route(
            "/activities/{id}",
            patch(admin_handlers::update_activity).delete(admin_handlers::delete_activity),
        )
        .route("/statistics", put(admin_handlers::put_statistics))
        .route("/settings/export/statistic.json", get(admin_handlers::export_statistic))
        .route("/settings/export/photos.json", get(admin_handlers::export_photos))
        .route("/settings/import", post(admin_handlers::import_settings))
        .route("/members", get(admin_handlers::list_member_records))
        .route(
            "/members/{id}",
            get(admin_handlers::get_member_record).patch(admin_handlers::update_member_record),
        )
        .route("/announcements", get(announcement_handlers::admin_list_announcements))
        .route_layer(admin_only());

    let mypage_routes = Router::new()
        .route(
            "/profile",
            get(mypage_handlers::get_profile).patch(mypage_handlers::update_profile),
        )
        .route("/profile/photo", post(mypage_handlers::upload_photo))
        .route(
            "/privacy",
            get(mypage_handlers::get_privacy).patch(mypage_handlers::update_privacy),
        )
        .route("/account/password", patch(mypage_handlers::change_password))
        .route("/account/email", patch(mypage_handlers::change_email))
        .route("/account", delete(mypage_handlers::withdraw))
        .route("/teams", get(mypage_handlers::my_teams))
        .route("/studies", get(mypage_handlers::my_studies))
        .route_layer(middleware::from_fn(mw_auth::require_auth));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/members", member_routes)
        .nest("/teams", team_routes)
        .nest("/studies", study_routes)
        .nest("/announcements", announcement_routes)
        .merge(public_admin_data)
        .nest("/admin", admin_routes)
        .nest("/mypage", mypage_routes)
        // Resolves the bearer token for every API route, including the
        // nested groups above.
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_auth::authenticate,
        ));

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .nest_service("/uploads/photos", ServeDir::new(upload_dir.join(PHOTO_DIR)))
        .nest_service("/uploads/activities", ServeDir::new(upload_dir.join(ACTIVITY_DIR)))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .with_state(app_state)
}
