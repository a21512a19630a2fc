mod common;

use reqwest::StatusCode;

#[tokio::test]
async fn health_endpoint_answers() {
    let server = common::server().await;
    let resp = common::client()
        .get(format!("{}/health", server.base_url))
        .send()
        .await
        .expect("health request");

    // Without a database the endpoint degrades rather than hangs.
    assert!(
        resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected health status: {}",
        resp.status()
    );

    let body: serde_json::Value = resp.json().await.expect("json body");
    assert!(body["data"]["status"].is_string());
}

#[tokio::test]
async fn root_lists_endpoints() {
    let server = common::server().await;
    let resp = common::client()
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .expect("root request");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await.expect("json body");
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Gym API");
    assert!(body["data"]["endpoints"]["login"]
        .as_str()
        .unwrap()
        .contains("/api/login"));
}

#[tokio::test]
async fn unknown_route_is_404() {
    let server = common::server().await;
    let resp = common::client()
        .get(format!("{}/api/no_such_route", server.base_url))
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
