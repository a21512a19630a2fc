//! Authentication and authorization behavior that is deterministic without a
//! database: token checks run before any query.

mod common;

use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn protected_route_without_token_is_401() {
    let server = common::server().await;
    let resp = common::client()
        .get(format!("{}/api/get_customer/1", server.base_url))
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = resp.json().await.expect("json body");
    assert_eq!(body["error"], true);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn garbage_token_is_401() {
    let server = common::server().await;
    let resp = common::client()
        .get(format!("{}/api/get_gym/1", server.base_url))
        .header("Authorization", "Bearer not.a.jwt")
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = resp.json().await.expect("json body");
    assert_eq!(body["message"], "Invalid or expired token");
}

#[tokio::test]
async fn non_bearer_scheme_is_401() {
    let server = common::server().await;
    let resp = common::client()
        .get(format!("{}/api/get_gym/1", server.base_url))
        .header("Authorization", "Basic dXNlcjpwYXNz")
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bootstrap_rejects_non_manager_role() {
    let server = common::server().await;
    let resp = common::client()
        .post(format!("{}/api/first_register", server.base_url))
        .json(&json!({
            "password": "longenough",
            "gym_id": null,
            "first_name": "Ada",
            "last_name": "Lovelace",
            "role": "coach"
        }))
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json().await.expect("json body");
    assert_eq!(body["error"], true);
}

#[tokio::test]
async fn bootstrap_rejects_short_password() {
    let server = common::server().await;
    let resp = common::client()
        .post(format!("{}/api/first_register", server.base_url))
        .json(&json!({
            "password": "short",
            "gym_id": null,
            "first_name": "Ada",
            "last_name": "Lovelace",
            "role": "manager"
        }))
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json().await.expect("json body");
    assert_eq!(body["message"], "Password must be at least 8 characters long");
}
