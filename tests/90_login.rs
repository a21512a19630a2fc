//! Login behavior. These tests tolerate an absent database: the handler has
//! to read the employee row, so without one it reports a service problem in
//! the standard error envelope instead of succeeding.

mod common;

use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn login_never_succeeds_for_unknown_employee() {
    let server = common::server().await;
    let resp = common::client()
        .post(format!("{}/api/login", server.base_url))
        .json(&json!({ "employee_id": 999_999, "password": "whatever1" }))
        .send()
        .await
        .expect("request");

    assert!(
        matches!(
            resp.status(),
            StatusCode::NOT_FOUND
                | StatusCode::INTERNAL_SERVER_ERROR
                | StatusCode::SERVICE_UNAVAILABLE
        ),
        "unexpected login status: {}",
        resp.status()
    );

    let body: serde_json::Value = resp.json().await.expect("json body");
    assert_eq!(body["error"], true);
    assert!(body["message"].is_string());
    assert!(body["code"].is_string());
}

#[tokio::test]
async fn login_rejects_malformed_body() {
    let server = common::server().await;
    let resp = common::client()
        .post(format!("{}/api/login", server.base_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
