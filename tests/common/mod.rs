#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::Serialize;
use tower::ServiceExt;

use snapnest::Config;
use snapnest::api::AppState;

pub const SECRET: &str = "integration-test-secret";
pub const ISSUER: &str = "https://id.test";
pub const AUDIENCE: &str = "snapnest-test";

#[derive(Serialize)]
struct Claims<'a> {
    sub: &'a str,
    email: Option<&'a str>,
    email_verified: bool,
    name: Option<&'a str>,
    iss: &'a str,
    aud: &'a str,
    exp: i64,
}

/// Signs a provider token the way the external identity service would.
pub fn issue_token(sub: &str, email: Option<&str>, name: Option<&str>) -> String {
    let claims = Claims {
        sub,
        email,
        email_verified: true,
        name,
        iss: ISSUER,
        aud: AUDIENCE,
        exp: chrono::Utc::now().timestamp() + 3600,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("Failed to sign test token")
}

/// In-memory app with the media CDN and mailer disabled, so every external
/// side effect is inert.
pub async fn spawn_app() -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.identity.hs256_secret = SECRET.to_string();
    config.identity.issuer = ISSUER.to_string();
    config.identity.audience = AUDIENCE.to_string();
    config.identity.admin_emails = vec!["admin@example.com".to_string()];
    config.media.enabled = false;
    config.mailer.enabled = false;
    config.observability.metrics_enabled = false;

    let state = snapnest::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");

    (snapnest::api::router(state.clone()), state)
}

pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<axum::body::Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

pub async fn response_json(response: Response<axum::body::Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Builds a multipart body with an optional password field and one image file.
pub fn photo_upload_body(
    boundary: &str,
    password: Option<&str>,
    file_bytes: &[u8],
) -> Vec<u8> {
    let mut body = Vec::new();

    if let Some(password) = password {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"password\"\r\n\r\n{password}\r\n"
            )
            .as_bytes(),
        );
    }

    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"guest.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(file_bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    body
}
