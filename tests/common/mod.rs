#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::Value;
use sqlx::SqlitePool;
use tcp_club::{
    build_app,
    config::Config,
    db,
    models::user::UserRole,
    services::{auth_service, upload_service, user_service},
    state::AppState,
};
use tempfile::TempDir;
use tower::ServiceExt;

pub const PASSWORD: &str = "password-123";
const BOUNDARY: &str = "----tcp-club-test-boundary";

pub struct TestContext {
    pub app: Router,
    pub pool: SqlitePool,
    pub config: Config,
    _dir: TempDir,
}

pub struct TestUser {
    pub id: i64,
    pub username: String,
    pub token: String,
}

pub struct FilePart<'a> {
    pub field: &'a str,
    pub filename: &'a str,
    pub content_type: &'a str,
    pub bytes: Vec<u8>,
}

impl TestContext {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = Config {
            database_url: format!("sqlite://{}", dir.path().join("test.db").display()),
            jwt_secret: "integration-test-secret-with-enough-bytes".into(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            upload_dir: dir.path().join("uploads"),
            cors_origin: None,
            token_ttl_hours: 1,
            token_ttl_long_days: 7,
            admin_username: None,
            admin_password: None,
        };

        let pool = db::create_db_pool(&config).await.expect("db pool");
        upload_service::ensure_upload_dirs(&config.upload_dir)
            .await
            .expect("upload dirs");
        let app = build_app(AppState::new(pool.clone(), config.clone())).expect("app");

        Self {
            app,
            pool,
            config,
            _dir: dir,
        }
    }

    /// Inserts a user straight into the database (cheap bcrypt cost) and
    /// issues a token for it.
    pub async fn create_user(&self, username: &str, role: UserRole) -> TestUser {
        let hash = bcrypt::hash(PASSWORD, 4).unwrap();
        let now = Utc::now();
        let id = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, name, email, role, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
        )
        .bind(username)
        .bind(hash)
        .bind(format!("{} name", username))
        .bind(format!("{}@example.com", username))
        .bind(role)
        .bind(now)
        .execute(&self.pool)
        .await
        .unwrap()
        .last_insert_rowid();

        let user = user_service::get_user(&self.pool, id).await.unwrap();
        let (token, _) = auth_service::issue_token(&self.config, &user, false).unwrap();
        TestUser {
            id,
            username: username.to_string(),
            token,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        (status, body)
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub fn multipart_request(uri: &str, token: Option<&str>, files: &[FilePart<'_>], fields: &[(&str, &str)]) -> Request<Body> {
        let mut body: Vec<u8> = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes());
            body.extend_from_slice(value.as_bytes());
            body.extend_from_slice(b"\r\n");
        }
        for file in files {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    file.field, file.filename
                )
                .as_bytes(),
            );
            body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", file.content_type).as_bytes());
            body.extend_from_slice(&file.bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY));
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body)).unwrap()
    }

    pub async fn multipart(&self, uri: &str, token: Option<&str>, files: &[FilePart<'_>], fields: &[(&str, &str)]) -> (StatusCode, Value) {
        self.send(Self::multipart_request(uri, token, files, fields)).await
    }
}
