// src/web/mod.rs
pub mod admin_handlers;
pub mod announcement_handlers;
pub mod auth_handlers;
pub mod extract;
pub mod health_handlers;
pub mod member_handlers;
pub mod multipart_form;
pub mod mw_admin;
pub mod mw_auth;
pub mod mypage_handlers;
pub mod routes;
pub mod study_handlers;
pub mod team_handlers;
