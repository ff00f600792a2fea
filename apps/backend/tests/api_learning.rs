//! Statistics, recommendation, progress and cache API tests.

mod common;

use axum_test::TestServer;
use serde_json::Value;

use common::{fixtures, TestContext};

fn auth(token: &str) -> (axum::http::HeaderName, String) {
    (
        axum::http::header::AUTHORIZATION,
        TestContext::auth_header_value(token),
    )
}

/// Three questions in category "math", three in "logic"; the user fails all
/// of "math" and passes all of "logic".
async fn seed_history(ctx: &TestContext, server: &TestServer, token: &str) {
    for i in 1..=3 {
        ctx.seed_question(&fixtures::labeled_question(
            &i.to_string(),
            "A",
            "难",
            "多选题",
            "math",
        ))
        .await;
    }
    for i in 4..=6 {
        ctx.seed_question(&fixtures::labeled_question(
            &i.to_string(),
            "A",
            "易",
            "单选题",
            "logic",
        ))
        .await;
    }
    // Unanswered candidates for recommendations.
    ctx.seed_question(&fixtures::labeled_question("7", "A", "难", "多选题", "math"))
        .await;
    ctx.seed_question(&fixtures::labeled_question("8", "A", "易", "单选题", "logic"))
        .await;

    for i in 1..=3 {
        fixtures::answer_question(server, token, &i.to_string(), &["B"]).await;
    }
    for i in 4..=6 {
        fixtures::answer_question(server, token, &i.to_string(), &["A"]).await;
    }
}

#[tokio::test]
async fn test_statistics_breakdowns() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let token = fixtures::register_and_login(&server, "alice").await;
    seed_history(&ctx, &server, &token).await;

    let (name, value) = auth(&token);
    let body: Value = server
        .get("/api/statistics")
        .add_header(name, value)
        .await
        .json();

    assert_eq!(body["overall_accuracy"], 50.0);

    let categories = body["category_stats"].as_array().unwrap();
    let math = categories
        .iter()
        .find(|c| c["label"] == "math")
        .expect("math bucket");
    assert_eq!(math["total"], 3);
    assert_eq!(math["correct"], 0);
    assert_eq!(math["accuracy"], 0.0);

    let worst = body["worst_questions"].as_array().unwrap();
    assert_eq!(worst.len(), 3);

    assert!(body["recent_exams"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_statistics_empty_history() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let token = fixtures::register_and_login(&server, "alice").await;

    let (name, value) = auth(&token);
    let body: Value = server
        .get("/api/statistics")
        .add_header(name, value)
        .await
        .json();
    assert_eq!(body["overall_accuracy"], 0.0);
    assert!(body["category_stats"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_recommendations_score_weak_areas_higher() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let token = fixtures::register_and_login(&server, "alice").await;
    seed_history(&ctx, &server, &token).await;

    let (name, value) = auth(&token);
    let body: Value = server
        .get("/api/recommendations?refresh=1")
        .add_header(name, value)
        .await
        .json();

    let recs = body["recommendations"].as_array().unwrap();
    // Only the two unanswered questions qualify.
    assert_eq!(recs.len(), 2);
    for rec in recs {
        let score = rec["score"].as_f64().unwrap();
        assert!((0.0..=100.0).contains(&score));
    }
    // The weak-math question outranks the mastered-logic one.
    assert_eq!(recs[0]["question_id"], "7");
    assert_eq!(recs[0]["priority"], 1);

    let priorities: Vec<i64> = recs.iter().map(|r| r["priority"].as_i64().unwrap()).collect();
    let mut sorted = priorities.clone();
    sorted.sort();
    assert_eq!(priorities, sorted);
}

#[tokio::test]
async fn test_recommendation_count_is_respected() {
    let ctx = TestContext::new().await;
    ctx.seed_bank(10).await;
    let server = TestServer::new(ctx.router()).unwrap();
    let token = fixtures::register_and_login(&server, "alice").await;

    let (name, value) = auth(&token);
    let body: Value = server
        .get("/api/recommendations?count=4")
        .add_header(name, value)
        .await
        .json();
    assert_eq!(body["recommendations"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_wrong_recommendations_prioritize_repeat_errors() {
    let ctx = TestContext::new().await;
    ctx.seed_bank(3).await;
    let server = TestServer::new(ctx.router()).unwrap();
    let token = fixtures::register_and_login(&server, "alice").await;

    // Question 1 wrong twice, question 2 wrong once.
    fixtures::answer_question(&server, &token, "1", &["B"]).await;
    fixtures::answer_question(&server, &token, "1", &["B"]).await;
    fixtures::answer_question(&server, &token, "2", &["B"]).await;

    let (name, value) = auth(&token);
    let body: Value = server
        .get("/api/recommendations/wrong")
        .add_header(name, value)
        .await
        .json();
    let recs = body["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0]["question_id"], "1");
    assert_eq!(recs[0]["priority"], 1);
    assert_eq!(recs[1]["question_id"], "2");
    assert_eq!(recs[1]["priority"], 2);
}

#[tokio::test]
async fn test_progress_report() {
    let ctx = TestContext::new().await;
    ctx.seed_bank(4).await;
    let server = TestServer::new(ctx.router()).unwrap();
    let token = fixtures::register_and_login(&server, "alice").await;

    fixtures::answer_question(&server, &token, "1", &["A"]).await;
    fixtures::answer_question(&server, &token, "2", &["B"]).await;

    let (name, value) = auth(&token);
    let body: Value = server
        .get("/api/progress")
        .add_header(name, value)
        .await
        .json();
    assert_eq!(body["progress"]["total_questions"], 4);
    assert_eq!(body["progress"]["answered_questions"], 2);
    assert_eq!(body["progress"]["correct_count"], 1);
    assert_eq!(body["progress"]["accuracy_rate"], 50.0);
    assert_eq!(body["completion_rate"], 50.0);
    assert_eq!(body["remaining"], 2);
}

#[tokio::test]
async fn test_progress_is_memoized_until_reset() {
    let ctx = TestContext::new().await;
    ctx.seed_bank(4).await;
    let server = TestServer::new(ctx.router()).unwrap();
    let token = fixtures::register_and_login(&server, "alice").await;

    fixtures::answer_question(&server, &token, "1", &["A"]).await;

    let (name, value) = auth(&token);
    let body: Value = server
        .get("/api/progress")
        .add_header(name.clone(), value.clone())
        .await
        .json();
    assert_eq!(body["progress"]["answered_questions"], 1);

    // A new attempt does not show up while the cached report is live.
    fixtures::answer_question(&server, &token, "2", &["A"]).await;
    let body: Value = server
        .get("/api/progress")
        .add_header(name.clone(), value.clone())
        .await
        .json();
    assert_eq!(body["progress"]["answered_questions"], 1);

    // Resetting history invalidates the cached report.
    let reset: Value = server
        .post("/api/history/reset")
        .add_header(name.clone(), value.clone())
        .await
        .json();
    assert_eq!(reset["deleted"], 2);

    let body: Value = server
        .get("/api/progress")
        .add_header(name, value)
        .await
        .json();
    assert_eq!(body["progress"]["answered_questions"], 0);
}

#[tokio::test]
async fn test_trend_counts_todays_attempts() {
    let ctx = TestContext::new().await;
    ctx.seed_bank(3).await;
    let server = TestServer::new(ctx.router()).unwrap();
    let token = fixtures::register_and_login(&server, "alice").await;

    fixtures::answer_question(&server, &token, "1", &["A"]).await;
    fixtures::answer_question(&server, &token, "2", &["B"]).await;

    let (name, value) = auth(&token);
    let body: Value = server
        .get("/api/trend?days=7")
        .add_header(name, value)
        .await
        .json();
    assert_eq!(body["period_days"], 7);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["total"], 2);
    assert_eq!(data[0]["correct"], 1);
    assert_eq!(data[0]["accuracy"], 50.0);
}

#[tokio::test]
async fn test_cache_stats_shape() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let token = fixtures::register_and_login(&server, "alice").await;

    let (name, value) = auth(&token);
    // Warm the cache with one report.
    server
        .get("/api/progress")
        .add_header(name.clone(), value.clone())
        .await
        .assert_status_ok();

    let body: Value = server
        .get("/api/cache/stats")
        .add_header(name, value)
        .await
        .json();
    assert_eq!(body["max_size"], 1000);
    assert_eq!(body["ttl_secs"], 3600);
    assert!(body["size"].as_u64().unwrap() >= 1);
}
