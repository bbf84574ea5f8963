mod common;

use axum::http::StatusCode;
use common::{TestContext, TestUser};
use serde_json::Value;
use tcp_club::models::user::UserRole;

async fn set_profile(ctx: &TestContext, user: &TestUser, major: &str, join_year: i64, tech_stack: &str) {
    sqlx::query("UPDATE users SET major = ?1, join_year = ?2, tech_stack = ?3, phone = '010-1234-5678' WHERE id = ?4")
        .bind(major)
        .bind(join_year)
        .bind(tech_stack)
        .bind(user.id)
        .execute(&ctx.pool)
        .await
        .unwrap();
}

fn usernames(body: &Value) -> Vec<&str> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|m| m["username"].as_str().unwrap())
        .collect()
}

/// Three members, one admin, one guest and one withdrawn member.
async fn seed(ctx: &TestContext) -> Vec<TestUser> {
    let alice = ctx.create_user("alice", UserRole::Member).await;
    let bob = ctx.create_user("bob", UserRole::Member).await;
    let carol = ctx.create_user("carol", UserRole::Admin).await;
    let dave = ctx.create_user("dave", UserRole::Member).await;
    let guest = ctx.create_user("guest", UserRole::Guest).await;
    let gone = ctx.create_user("gone", UserRole::Member).await;

    set_profile(ctx, &alice, "Computer Science", 2021, "rust,react").await;
    set_profile(ctx, &bob, "Design", 2023, "figma").await;
    set_profile(ctx, &carol, "Computer Science", 2019, "go").await;
    set_profile(ctx, &dave, "Computer Science", 2024, "rust").await;
    set_profile(ctx, &guest, "Computer Science", 2025, "rust").await;
    set_profile(ctx, &gone, "Computer Science", 2022, "rust").await;
    sqlx::query("UPDATE users SET withdrawn_at = '2025-03-01T00:00:00Z' WHERE id = ?1")
        .bind(gone.id)
        .execute(&ctx.pool)
        .await
        .unwrap();

    vec![alice, bob, carol, dave, guest, gone]
}

#[tokio::test]
async fn directory_lists_only_active_members() {
    let ctx = TestContext::new().await;
    seed(&ctx).await;

    let (status, body) = ctx.get("/api/v1/members", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(usernames(&body), vec!["alice", "bob", "carol", "dave"]);
    assert!(body[0].get("password_hash").is_none());
    assert_eq!(body[0]["tech_stack"], serde_json::json!(["rust", "react"]));
}

#[tokio::test]
async fn search_and_major_filter() {
    let ctx = TestContext::new().await;
    seed(&ctx).await;

    let (_, body) = ctx.get("/api/v1/members?search=rust", None).await;
    assert_eq!(usernames(&body), vec!["alice", "dave"]);

    let (_, body) = ctx.get("/api/v1/members?search=bob", None).await;
    assert_eq!(usernames(&body), vec!["bob"]);

    let (_, body) = ctx.get("/api/v1/members?major=Computer%20Science", None).await;
    assert_eq!(usernames(&body), vec!["alice", "carol", "dave"]);

    let (_, body) = ctx.get("/api/v1/members?major=Computer%20Science&search=go", None).await;
    assert_eq!(usernames(&body), vec!["carol"]);

    // Blank filters are ignored.
    let (_, body) = ctx.get("/api/v1/members?search=%20&major=", None).await;
    assert_eq!(body.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn sort_by_join_year_puts_newest_first() {
    let ctx = TestContext::new().await;
    seed(&ctx).await;
    let no_year = ctx.create_user("aaron", UserRole::Member).await;

    let (_, body) = ctx.get("/api/v1/members?sort=join_year", None).await;
    assert_eq!(usernames(&body), vec!["dave", "bob", "alice", "carol", "aaron"]);

    let (_, body) = ctx.get("/api/v1/members", None).await;
    assert_eq!(usernames(&body)[0], no_year.username);
}

#[tokio::test]
async fn guests_and_withdrawn_users_have_no_directory_page() {
    let ctx = TestContext::new().await;
    let users = seed(&ctx).await;
    let (alice, guest, gone) = (&users[0], &users[4], &users[5]);

    let (status, body) = ctx.get(&format!("/api/v1/members/{}", alice.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["major"], "Computer Science");

    let (status, body) = ctx.get(&format!("/api/v1/members/{}", guest.id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status_code"], 404);

    let (status, _) = ctx.get(&format!("/api/v1/members/{}", gone.id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn privacy_flags_hide_contact_details() {
    let ctx = TestContext::new().await;
    let users = seed(&ctx).await;
    let alice = &users[0];
    let uri = format!("/api/v1/members/{}", alice.id);

    let (_, body) = ctx.get(&uri, None).await;
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["phone"], "010-1234-5678");

    let (status, _) = ctx
        .request(
            axum::http::Method::PATCH,
            "/api/v1/mypage/privacy",
            Some(&alice.token),
            Some(serde_json::json!({ "show_email": false, "show_phone": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = ctx.get(&uri, None).await;
    assert!(body["email"].is_null());
    assert!(body["phone"].is_null());

    let (_, listed) = ctx.get("/api/v1/members?search=alice", None).await;
    assert!(listed[0]["email"].is_null());
    assert!(listed[0]["phone"].is_null());
}
