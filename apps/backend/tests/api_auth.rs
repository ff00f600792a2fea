//! Auth API tests.

mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use common::{fixtures, TestContext};

#[tokio::test]
async fn test_register_creates_user() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();

    let response = server
        .post("/api/auth/register")
        .json(&fixtures::register_request("alice"))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["username"], "alice");
    assert!(body["user_id"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_register_rejects_duplicate_username() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();

    server
        .post("/api/auth/register")
        .json(&fixtures::register_request("alice"))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .post("/api/auth/register")
        .json(&fixtures::register_request("alice"))
        .await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();

    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "username": "alice",
            "password": "short",
            "confirm_password": "short",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_rejects_mismatched_passwords() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();

    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "username": "alice",
            "password": "secret123",
            "confirm_password": "secret124",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();

    server
        .post("/api/auth/register")
        .json(&fixtures::register_request("alice"))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "username": "alice", "password": "wrong-password" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_token_grants_access() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let token = fixtures::register_and_login(&server, "alice").await;

    let response = server
        .get("/api/profile")
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&token),
        )
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["username"], "alice");
}

#[tokio::test]
async fn test_protected_route_requires_auth() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();

    let response = server.get("/api/profile").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();

    let response = server
        .get("/api/profile")
        .add_header(
            axum::http::header::AUTHORIZATION,
            "Bearer not-a-real-token".to_string(),
        )
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_invalidates_token() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let token = fixtures::register_and_login(&server, "alice").await;

    server
        .post("/api/auth/logout")
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&token),
        )
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let response = server
        .get("/api/profile")
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&token),
        )
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}
