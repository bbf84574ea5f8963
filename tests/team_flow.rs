mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::{TestContext, TestUser};
use serde_json::{json, Value};
use tcp_club::models::user::UserRole;

async fn create_team(ctx: &TestContext, leader: &TestUser, headcount: i64) -> Value {
    let deadline = (Utc::now() + Duration::days(7)).date_naive();
    let (status, body) = ctx
        .post(
            "/api/v1/teams",
            Some(&leader.token),
            json!({
                "title": "Capstone crew",
                "category": "project",
                "description": "Building a club portal",
                "deadline": deadline.to_string(),
                "tech_stack": ["rust", "react"],
                "roles": [{ "name": "backend", "headcount": headcount }, { "name": "frontend", "headcount": 2 }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
async fn guests_cannot_create_teams() {
    let ctx = TestContext::new().await;
    let guest = ctx.create_user("guest", UserRole::Guest).await;
    let (status, _) = ctx
        .post(
            "/api/v1/teams",
            Some(&guest.token),
            json!({
                "title": "x", "category": "y", "description": "z",
                "deadline": "2999-01-01", "roles": [{ "name": "any", "headcount": 1 }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn apply_is_rejected_once_the_team_closes() {
    let ctx = TestContext::new().await;
    let leader = ctx.create_user("leader", UserRole::Member).await;
    let applicant = ctx.create_user("applicant", UserRole::Guest).await;
    let team = create_team(&ctx, &leader, 3).await;
    let team_id = team["id"].as_i64().unwrap();
    let role_id = team["roles"][0]["id"].as_i64().unwrap();
    assert_eq!(team["is_accepting"], true);

    let (status, body) = ctx
        .request(Method::PATCH, &format!("/api/v1/teams/{team_id}/status"), Some(&leader.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "closed");

    let (status, _) = ctx
        .post(
            &format!("/api/v1/teams/{team_id}/apply"),
            Some(&applicant.token),
            json!({ "role_id": role_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The leader cannot edit a closed posting either.
    let (status, _) = ctx
        .request(
            Method::PATCH,
            &format!("/api/v1/teams/{team_id}"),
            Some(&leader.token),
            Some(json!({ "title": "Renamed" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn apply_is_rejected_after_the_deadline() {
    let ctx = TestContext::new().await;
    let leader = ctx.create_user("leader", UserRole::Member).await;
    let applicant = ctx.create_user("applicant", UserRole::Member).await;
    let team = create_team(&ctx, &leader, 3).await;
    let team_id = team["id"].as_i64().unwrap();
    let role_id = team["roles"][0]["id"].as_i64().unwrap();

    sqlx::query("UPDATE teams SET deadline = '2000-01-01' WHERE id = ?1")
        .bind(team_id)
        .execute(&ctx.pool)
        .await
        .unwrap();

    let (status, body) = ctx.get(&format!("/api/v1/teams/{team_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_accepting"], false);

    let (status, _) = ctx
        .post(
            &format!("/api/v1/teams/{team_id}/apply"),
            Some(&applicant.token),
            json!({ "role_id": role_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn application_lifecycle() {
    let ctx = TestContext::new().await;
    let leader = ctx.create_user("leader", UserRole::Member).await;
    let first = ctx.create_user("first", UserRole::Guest).await;
    let second = ctx.create_user("second", UserRole::Guest).await;
    let team = create_team(&ctx, &leader, 1).await;
    let team_id = team["id"].as_i64().unwrap();
    let backend = team["roles"][0]["id"].as_i64().unwrap();
    let apply_uri = format!("/api/v1/teams/{team_id}/apply");

    let (status, _) = ctx.post(&apply_uri, Some(&leader.token), json!({ "role_id": backend })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = ctx.post(&apply_uri, Some(&first.token), json!({ "role_id": backend })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["applied"], true);

    let (status, _) = ctx.post(&apply_uri, Some(&first.token), json!({ "role_id": backend })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Headcount 1 is now used up.
    let (status, _) = ctx.post(&apply_uri, Some(&second.token), json!({ "role_id": backend })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = ctx.post(&apply_uri, Some(&second.token), json!({ "role_id": 99_999 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = ctx
        .get(&format!("/api/v1/teams/{team_id}/application-status"), Some(&first.token))
        .await;
    assert_eq!(body["applied"], true);
    assert_eq!(body["role_id"], backend);

    let (status, _) = ctx
        .get(&format!("/api/v1/teams/{team_id}/applications"), Some(&first.token))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = ctx
        .get(&format!("/api/v1/teams/{team_id}/applications"), Some(&leader.token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["role_name"], "backend");

    let (_, roles) = ctx.get(&format!("/api/v1/teams/{team_id}/roles"), None).await;
    assert_eq!(roles[0]["applied_count"], 1);

    let (status, _) = ctx.request(Method::DELETE, &apply_uri, Some(&first.token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = ctx.request(Method::DELETE, &apply_uri, Some(&first.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, mine) = ctx.get("/api/v1/mypage/teams", Some(&leader.token)).await;
    assert_eq!(mine["leading"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn anonymous_writes_are_unauthorized() {
    let ctx = TestContext::new().await;
    let (status, _) = ctx.post("/api/v1/teams", None, json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = ctx.get("/api/v1/teams", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn replacing_roles_drops_applicants_of_removed_roles() {
    let ctx = TestContext::new().await;
    let leader = ctx.create_user("leader", UserRole::Member).await;
    let designer = ctx.create_user("designer", UserRole::Member).await;
    let coder = ctx.create_user("coder", UserRole::Member).await;
    let deadline = (Utc::now() + Duration::days(7)).date_naive();
    let (status, team) = ctx
        .post(
            "/api/v1/teams",
            Some(&leader.token),
            json!({
                "title": "Design sprint",
                "category": "project",
                "description": "Landing page",
                "deadline": deadline.to_string(),
                "roles": [{ "name": "backend", "headcount": 2 }, { "name": "design", "headcount": 1 }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{team}");
    let team_id = team["id"].as_i64().unwrap();
    let backend = team["roles"][0]["id"].as_i64().unwrap();
    let design = team["roles"][1]["id"].as_i64().unwrap();
    let apply_uri = format!("/api/v1/teams/{team_id}/apply");

    ctx.post(&apply_uri, Some(&designer.token), json!({ "role_id": design })).await;
    ctx.post(&apply_uri, Some(&coder.token), json!({ "role_id": backend })).await;

    let (status, body) = ctx
        .request(
            Method::PATCH,
            &format!("/api/v1/teams/{team_id}"),
            Some(&leader.token),
            Some(json!({ "roles": [{ "name": "backend", "headcount": 3 }] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let roles = body["roles"].as_array().unwrap();
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0]["id"], backend);
    assert_eq!(roles[0]["headcount"], 3);

    let status_uri = format!("/api/v1/teams/{team_id}/application-status");
    let (_, body) = ctx.get(&status_uri, Some(&designer.token)).await;
    assert_eq!(body["applied"], false);
    // The kept role keeps its applicant.
    let (_, body) = ctx.get(&status_uri, Some(&coder.token)).await;
    assert_eq!(body["applied"], true);
    assert_eq!(body["role_id"], backend);
}

#[tokio::test]
async fn headcount_cannot_drop_below_applied_count() {
    let ctx = TestContext::new().await;
    let leader = ctx.create_user("leader", UserRole::Member).await;
    let first = ctx.create_user("first", UserRole::Member).await;
    let second = ctx.create_user("second", UserRole::Member).await;
    let team = create_team(&ctx, &leader, 3).await;
    let team_id = team["id"].as_i64().unwrap();
    let backend = team["roles"][0]["id"].as_i64().unwrap();
    let apply_uri = format!("/api/v1/teams/{team_id}/apply");

    for user in [&first, &second] {
        let (status, _) = ctx.post(&apply_uri, Some(&user.token), json!({ "role_id": backend })).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = ctx
        .request(
            Method::PATCH,
            &format!("/api/v1/teams/{team_id}"),
            Some(&leader.token),
            Some(json!({
                "title": "Renamed",
                "roles": [{ "name": "backend", "headcount": 1 }, { "name": "frontend", "headcount": 2 }],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The refused update leaves the whole posting unchanged.
    let (_, body) = ctx.get(&format!("/api/v1/teams/{team_id}"), None).await;
    assert_eq!(body["title"], "Capstone crew");
    let (_, roles) = ctx.get(&format!("/api/v1/teams/{team_id}/roles"), None).await;
    assert_eq!(roles[0]["headcount"], 3);
    assert_eq!(roles[0]["applied_count"], 2);
}
