mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::TestContext;
use serde_json::{json, Value};
use tcp_club::models::user::UserRole;

fn raw_post(uri: &str, content_type: Option<&str>, body: &'static str) -> Request<Body> {
    let mut builder = Request::builder().method(Method::POST).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder.body(Body::from(body)).unwrap()
}

fn assert_error_body(body: &Value, status: StatusCode) {
    assert_eq!(body["status_code"], status.as_u16(), "{body}");
    assert_eq!(body["error"], status.canonical_reason().unwrap());
    assert!(!body["message"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_json_gets_the_error_body() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .send(raw_post("/api/v1/auth/login", Some("application/json"), "{\"username\": "))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_body(&body, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_field_is_a_bad_request_not_unprocessable() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.post("/api/v1/auth/login", None, json!({ "username": "kim" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_body(&body, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("password"));
}

#[tokio::test]
async fn wrong_content_type_gets_the_error_body() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .send(raw_post("/api/v1/auth/login", Some("text/plain"), r#"{"username":"kim","password":"x"}"#))
        .await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_error_body(&body, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn unparsable_path_and_query_get_the_error_body() {
    let ctx = TestContext::new().await;
    let admin = ctx.create_user("admin", UserRole::Admin).await;

    let (status, body) = ctx.get("/api/v1/teams/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_body(&body, StatusCode::BAD_REQUEST);

    let (status, body) = ctx.get("/api/v1/members/not-a-number", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_body(&body, StatusCode::BAD_REQUEST);

    let (status, body) = ctx.get("/api/v1/admin/members?role=SUPERUSER", Some(&admin.token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_body(&body, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn multipart_endpoint_without_multipart_body_gets_the_error_body() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("minji", UserRole::Member).await;

    let (status, body) = ctx
        .request(Method::POST, "/api/v1/mypage/profile/photo", Some(&user.token), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_body(&body, StatusCode::BAD_REQUEST);
}
