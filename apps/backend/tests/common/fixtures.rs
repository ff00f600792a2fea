//! Test data builders and request helpers.

use std::collections::BTreeMap;

use axum_test::TestServer;
use learning_core::types::Question;
use serde_json::{json, Value};

/// Basic single-choice question with two options.
pub fn question(id: &str, answer: &str) -> Question {
    labeled_question(id, answer, "中", "单选题", "综合")
}

/// Question with explicit difficulty, type and category labels.
pub fn labeled_question(
    id: &str,
    answer: &str,
    difficulty: &str,
    qtype: &str,
    category: &str,
) -> Question {
    let mut options = BTreeMap::new();
    options.insert("A".to_string(), format!("option A of {id}"));
    options.insert("B".to_string(), format!("option B of {id}"));
    Question {
        id: id.to_string(),
        stem: format!("Question stem {id}"),
        answer: answer.to_string(),
        difficulty: Some(difficulty.to_string()),
        qtype: Some(qtype.to_string()),
        category: Some(category.to_string()),
        options,
    }
}

pub fn register_request(username: &str) -> Value {
    json!({
        "username": username,
        "password": "secret123",
        "confirm_password": "secret123",
    })
}

pub fn login_request(username: &str) -> Value {
    json!({
        "username": username,
        "password": "secret123",
    })
}

/// Register a user and log in, returning the bearer token.
pub async fn register_and_login(server: &TestServer, username: &str) -> String {
    server
        .post("/api/auth/register")
        .json(&register_request(username))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let response = server
        .post("/api/auth/login")
        .json(&login_request(username))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    body["token"].as_str().expect("token in response").to_string()
}

/// Submit an answer to a question.
pub async fn answer_question(server: &TestServer, token: &str, qid: &str, choices: &[&str]) -> Value {
    let response = server
        .post(&format!("/api/questions/{qid}/answer"))
        .add_header(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {token}"),
        )
        .json(&json!({ "answers": choices }))
        .await;
    response.assert_status_ok();
    response.json()
}
