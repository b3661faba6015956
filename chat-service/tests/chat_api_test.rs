//! End-to-end tests of the chat endpoints against the mock provider.

mod common;

use chat_service::models::RecordKind;
use chat_service::services::providers::{MockChatProvider, ModelError};
use common::{test_config, TestApp};
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;

#[tokio::test]
async fn programs_question_gets_reply_and_one_record() {
    let app = TestApp::spawn().await;

    let response = app
        .send_message(Some("visitor-1"), "What programs are offered at CIC?")
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-session-id").unwrap(),
        "visitor-1"
    );
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["session_id"], "visitor-1");
    assert_eq!(body["error"], false);
    assert!(!body["reply"].as_str().unwrap().is_empty());
    assert!(body["warnings"].as_array().unwrap().is_empty());

    let records = app.sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, RecordKind::ChatTurn);
    assert_eq!(records[0].user_query, "What programs are offered at CIC?");
    assert_eq!(records[0].session_id.as_deref(), Some("visitor-1"));
}

#[tokio::test]
async fn missing_session_header_gets_a_minted_id() {
    let app = TestApp::spawn().await;

    let response = app.send_message(None, "Hello").await;

    assert_eq!(response.status(), StatusCode::OK);
    let header = response
        .headers()
        .get("x-session-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("session header missing");
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["session_id"], header.as_str());
    assert!(uuid::Uuid::parse_str(&header).is_ok());
}

#[tokio::test]
async fn sessions_are_isolated() {
    let app = TestApp::spawn().await;

    app.send_message(Some("alice"), "Where is the New Cairo campus?")
        .await;
    app.send_message(Some("alice"), "What are the fees?").await;
    app.send_message(Some("bob"), "Hello").await;

    let alice = app.transcript("alice").await;
    let bob = app.transcript("bob").await;
    assert_eq!(alice["turns"].as_array().unwrap().len(), 4);
    assert_eq!(bob["turns"].as_array().unwrap().len(), 2);
    assert_eq!(bob["turns"][0]["content"], "Hello");
    assert_eq!(bob["turns"][0]["role"], "user");
}

#[tokio::test]
async fn reset_clears_only_that_transcript() {
    let app = TestApp::spawn().await;
    app.send_message(Some("alice"), "one").await;
    app.send_message(Some("bob"), "two").await;

    let response = app.reset("alice").await;
    assert_eq!(response.status(), StatusCode::OK);

    assert!(app.transcript("alice").await["turns"]
        .as_array()
        .unwrap()
        .is_empty());
    assert_eq!(
        app.transcript("bob").await["turns"].as_array().unwrap().len(),
        2
    );
    // Reset writes nothing to the log.
    assert_eq!(app.sink.records().len(), 2);
}

#[tokio::test]
async fn blank_message_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app.send_message(Some("visitor"), "   ").await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(app.sink.records().is_empty());
}

#[tokio::test]
async fn model_failure_renders_apology() {
    let app = TestApp::spawn_with(
        Arc::new(MockChatProvider::failing(ModelError::RateLimited)),
        test_config(&[]),
    )
    .await;

    let response = app.send_message(Some("visitor"), "Hello").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], true);
    assert_eq!(
        body["reply"],
        "Sorry, I encountered an error: Model API quota exceeded"
    );
    assert!(app.sink.records().is_empty());
    assert_eq!(
        app.transcript("visitor").await["turns"]
            .as_array()
            .unwrap()
            .len(),
        2
    );
}

#[tokio::test]
async fn store_outage_surfaces_as_warning() {
    let app = TestApp::spawn().await;
    app.sink.set_offline(true);

    let response = app.send_message(Some("visitor"), "Hello").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], false);
    assert_eq!(body["warnings"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn shaped_replies_lose_markdown_emphasis() {
    let app = TestApp::spawn_with(
        Arc::new(MockChatProvider::new()),
        test_config(&[("CHAT_SHAPE_REPLIES", "true")]),
    )
    .await;

    let response = app.send_message(Some("visitor"), "**Fees**").await;
    let body: Value = response.json().await.unwrap();

    assert_eq!(body["reply"], "Mock response for: Fees");
}

#[tokio::test]
async fn samples_are_listed() {
    let app = TestApp::spawn().await;

    let body: Value = app
        .client
        .get(app.url("/api/chat/samples"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["questions"].as_array().unwrap().len(), 8);
}
