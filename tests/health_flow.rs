mod common;

use axum::http::StatusCode;
use common::TestContext;

#[tokio::test]
async fn live_and_ready_with_a_working_database() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.get("/health/live", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = ctx.get("/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn ready_reports_503_once_the_pool_is_closed() {
    let ctx = TestContext::new().await;
    ctx.pool.close().await;

    let (status, body) = ctx.get("/health/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unavailable");
    assert!(body["error"].is_string());

    // Liveness does not depend on the database.
    let (status, _) = ctx.get("/health/live", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx.get("/health/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"]["ok"], false);
}

#[tokio::test]
async fn status_reports_database_latency() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.get("/health/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"]["ok"], true);
    assert!(body["database"]["latency_ms"].is_number());
    assert!(body["uptime_seconds"].is_u64());
}
