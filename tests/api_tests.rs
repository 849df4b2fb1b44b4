mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{issue_token, response_json, send_json, spawn_app};

#[tokio::test]
async fn protected_routes_require_a_token() {
    let (app, _state) = spawn_app().await;

    let response = send_json(&app, "GET", "/api/me", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send_json(&app, "GET", "/api/me", Some("not-a-jwt"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_creates_a_host_account() {
    let (app, state) = spawn_app().await;
    let token = issue_token("host-1", Some("host@example.com"), Some("Host One"));

    let response = send_json(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({ "token": token })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["data"]["user"]["id"], "host-1");
    assert_eq!(body["data"]["user"]["email"], "host@example.com");
    assert_eq!(body["data"]["user"]["name"], "Host One");

    let stored = state.shared.store.get_user("host-1").await.unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn signup_with_claimed_email_conflicts() {
    let (app, _state) = spawn_app().await;

    let first = issue_token("host-1", Some("shared@example.com"), None);
    let response = send_json(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({ "token": first })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Same email asserted under a different subject id must be told to
    // sign in rather than create a second identity.
    let second = issue_token("host-2", Some("shared@example.com"), None);
    let response = send_json(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({ "token": second })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = response_json(response).await;
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("sign in"));
}

#[tokio::test]
async fn signin_tolerates_subject_id_change() {
    let (app, _state) = spawn_app().await;

    let original = issue_token("host-1", Some("shared@example.com"), None);
    send_json(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({ "token": original })),
    )
    .await;

    let migrated = issue_token("host-9", Some("shared@example.com"), None);
    let response = send_json(
        &app,
        "POST",
        "/api/auth/signin",
        None,
        Some(json!({ "token": migrated })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The stored account wins; the id is not rewritten.
    let body = response_json(response).await;
    assert_eq!(body["data"]["user"]["id"], "host-1");
}

#[tokio::test]
async fn signin_creates_account_on_first_contact() {
    let (app, state) = spawn_app().await;
    let token = issue_token("social-1", Some("social@example.com"), Some("Social"));

    let response = send_json(
        &app,
        "POST",
        "/api/auth/signin",
        None,
        Some(json!({ "token": token })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let stored = state.shared.store.get_user("social-1").await.unwrap();
    assert_eq!(stored.unwrap().email, "social@example.com");
}

#[tokio::test]
async fn refresh_requires_an_existing_account() {
    let (app, _state) = spawn_app().await;
    let token = issue_token("ghost", Some("ghost@example.com"), None);

    let response = send_json(
        &app,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({ "token": token })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn suspended_accounts_are_locked_out() {
    let (app, state) = spawn_app().await;
    let token = issue_token("host-1", Some("host@example.com"), None);

    send_json(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({ "token": token })),
    )
    .await;

    state
        .shared
        .store
        .set_user_suspended("host-1", true)
        .await
        .unwrap();

    let response = send_json(&app, "GET", "/api/me", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn profile_reports_quota_usage() {
    let (app, state) = spawn_app().await;
    let token = issue_token("host-1", Some("host@example.com"), Some("Host"));

    send_json(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({ "token": token })),
    )
    .await;

    let user = state.shared.store.get_user("host-1").await.unwrap().unwrap();
    state
        .shared
        .store
        .set_user_avatar(user, "https://cdn.test/a.jpg", None, 100_000)
        .await
        .unwrap();

    let response = send_json(&app, "GET", "/api/me", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["data"]["upload_bytes_used"], 100_000);
    assert_eq!(body["data"]["upload_bytes_limit"], 1024 * 1024 * 1024);
}

#[tokio::test]
async fn profile_name_can_be_patched() {
    let (app, _state) = spawn_app().await;
    let token = issue_token("host-1", Some("host@example.com"), Some("Old"));

    send_json(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({ "token": token })),
    )
    .await;

    let response = send_json(
        &app,
        "PATCH",
        "/api/me",
        Some(&token),
        Some(json!({ "name": "New Name" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["data"]["name"], "New Name");
}

#[tokio::test]
async fn health_reports_database_readiness() {
    let (app, _state) = spawn_app().await;

    let response = send_json(&app, "GET", "/api/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"], true);
}
