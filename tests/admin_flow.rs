mod common;

use axum::http::{header, Method, StatusCode};
use chrono::{Duration, Utc};
use common::{FilePart, TestContext};
use serde_json::json;
use tcp_club::models::user::UserRole;
use tower::ServiceExt;

const STATISTIC: &str = r#"{"member_count": 42, "award_count": 5, "project_count": 17, "employment_rate": 91.5}"#;
const PHOTOS: &str = r#"[
    {"title": "MT", "image_url": "/uploads/activities/mt.png", "tags": ["mt", "spring"], "sort_order": 2},
    {"title": "Hackathon", "image_url": "https://cdn.example.com/hack.jpg", "tags": [], "sort_order": 1}
]"#;

fn json_part<'a>(field: &'a str, filename: &'a str, body: &str) -> FilePart<'a> {
    FilePart {
        field,
        filename,
        content_type: "application/json",
        bytes: body.as_bytes().to_vec(),
    }
}

#[tokio::test]
async fn import_needs_both_files() {
    let ctx = TestContext::new().await;
    let admin = ctx.create_user("admin", UserRole::Admin).await;

    let (status, body) = ctx
        .multipart(
            "/api/v1/admin/settings/import",
            Some(&admin.token),
            &[json_part("files", "statistic.json", STATISTIC)],
            &[],
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("photos.json"));

    // Nothing was written.
    let (_, stats) = ctx.get("/api/v1/statistics", None).await;
    assert_eq!(stats["member_count"], 0);
}

#[tokio::test]
async fn import_replaces_statistics_and_activities() {
    let ctx = TestContext::new().await;
    let admin = ctx.create_user("admin", UserRole::Admin).await;

    let (status, body) = ctx
        .multipart(
            "/api/v1/admin/settings/import",
            Some(&admin.token),
            &[
                json_part("files", "statistic.json", STATISTIC),
                json_part("files", "photos.json", PHOTOS),
            ],
            &[],
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["photo_count"], 2);

    let (_, stats) = ctx.get("/api/v1/statistics", None).await;
    assert_eq!(stats["member_count"], 42);
    assert_eq!(stats["employment_rate"], 91.5);

    let (_, activities) = ctx.get("/api/v1/activities", None).await;
    let titles: Vec<&str> = activities
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Hackathon", "MT"]);
    assert_eq!(activities[1]["tags"], json!(["mt", "spring"]));

    let request = axum::http::Request::builder()
        .uri("/api/v1/admin/settings/export/photos.json")
        .header(header::AUTHORIZATION, format!("Bearer {}", admin.token))
        .body(axum::body::Body::empty())
        .unwrap();
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.contains("photos.json"));
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let exported: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(exported.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn admin_area_rejects_everyone_else() {
    let ctx = TestContext::new().await;
    let member = ctx.create_user("member", UserRole::Member).await;

    let (status, _) = ctx.get("/api/v1/admin/members", Some(&member.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = ctx.get("/api/v1/admin/members", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = ctx
        .request(
            Method::PUT,
            "/api/v1/admin/statistics",
            Some(&member.token),
            Some(json!({ "member_count": 1, "award_count": 1, "project_count": 1, "employment_rate": 1.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn recruitment_window_opens_the_public_flag() {
    let ctx = TestContext::new().await;
    let admin = ctx.create_user("admin", UserRole::Admin).await;

    let (_, body) = ctx.get("/api/v1/recruitment", None).await;
    assert_eq!(body["is_open"], false);

    let now = Utc::now();
    let (status, body) = ctx
        .request(
            Method::PUT,
            "/api/v1/admin/recruitment",
            Some(&admin.token),
            Some(json!({
                "start_at": (now - Duration::days(1)).to_rfc3339(),
                "end_at": (now + Duration::days(1)).to_rfc3339(),
                "is_enabled": false,
                "auto_toggle": true,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["is_open"], true);

    let (_, body) = ctx.get("/api/v1/recruitment", None).await;
    assert_eq!(body["is_open"], true);

    let (status, _) = ctx
        .request(
            Method::PUT,
            "/api/v1/admin/recruitment",
            Some(&admin.token),
            Some(json!({
                "start_at": now.to_rfc3339(),
                "end_at": (now - Duration::days(3)).to_rfc3339(),
                "is_enabled": true,
                "auto_toggle": true,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn member_records_can_be_promoted_but_admins_keep_their_role() {
    let ctx = TestContext::new().await;
    let admin = ctx.create_user("admin", UserRole::Admin).await;
    let guest = ctx.create_user("guest", UserRole::Guest).await;

    let (status, body) = ctx
        .request(
            Method::PATCH,
            &format!("/api/v1/admin/members/{}", guest.id),
            Some(&admin.token),
            Some(json!({ "role": "MEMBER", "major": "Computer Science" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["role"], "MEMBER");
    assert_eq!(body["major"], "Computer Science");

    let (status, _) = ctx
        .request(
            Method::PATCH,
            &format!("/api/v1/admin/members/{}", admin.id),
            Some(&admin.token),
            Some(json!({ "role": "GUEST" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = ctx.get(&format!("/api/v1/admin/members/{}", guest.id), Some(&admin.token)).await;
    assert_eq!(body["role"], "MEMBER");
}
