//! HTTP API tests over in-memory stores.
//!
//! Run with: `cargo test -p advault-api --test api_test`

mod helpers;

use advault_db::AdStore;
use advault_storage::Storage;
use helpers::{setup_test_app, MISSING_POST_ID, TEXT_ONLY_POST_ID};
use serde_json::{json, Value};

#[tokio::test]
async fn test_process_ad_stores_and_returns_summary() {
    let app = setup_test_app();

    let response = app
        .server
        .post("/api/process-ad")
        .json(&json!({"url": "https://x.com/alice/status/12345"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["id"], "12345");
    assert_eq!(body["title"], "Greeting Ad");
    assert_eq!(body["creator"], "@alice");
    assert_eq!(body["transcript_length"], 11);
    assert_eq!(body["shots_count"], 2);
    assert_eq!(body["analysis_available"], true);

    assert!(app.store.ad_exists("12345").await.unwrap());
}

#[tokio::test]
async fn test_process_ad_requires_url() {
    let app = setup_test_app();

    for body in [json!({}), json!({"url": "   "})] {
        let response = app.server.post("/api/process-ad").json(&body).await;
        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"], "URL is required");
    }
}

#[tokio::test]
async fn test_process_ad_rejects_overlong_url() {
    let app = setup_test_app();
    let url = format!("https://x.com/alice/status/1?{}", "a".repeat(2048));

    let response = app
        .server
        .post("/api/process-ad")
        .json(&json!({ "url": url }))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("2048"));
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn test_process_ad_maps_pipeline_errors() {
    let app = setup_test_app();

    let cases = [
        (
            "https://example.com/not-a-post".to_string(),
            400,
            "INVALID_URL",
            "resolving",
        ),
        (
            format!("https://x.com/alice/status/{}", MISSING_POST_ID),
            404,
            "POST_NOT_FOUND",
            "fetching_metadata",
        ),
        (
            format!("https://x.com/alice/status/{}", TEXT_ONLY_POST_ID),
            422,
            "NO_VIDEO_IN_POST",
            "fetching_metadata",
        ),
    ];

    for (url, status, code, stage) in cases {
        let response = app
            .server
            .post("/api/process-ad")
            .json(&json!({ "url": &url }))
            .await;
        assert_eq!(response.status_code().as_u16(), status, "url {}", url);
        let body: Value = response.json();
        assert_eq!(body["code"], code);
        assert_eq!(body["stage"], stage);
    }
}

#[tokio::test]
async fn test_process_ad_twice_is_conflict() {
    let app = setup_test_app();
    let request = json!({"url": "https://twitter.com/alice/status/777"});

    app.server
        .post("/api/process-ad")
        .json(&request)
        .await
        .assert_status_ok();
    let response = app.server.post("/api/process-ad").json(&request).await;

    assert_eq!(response.status_code().as_u16(), 409);
    let body: Value = response.json();
    assert_eq!(body["code"], "AD_ALREADY_EXISTS");
    assert_eq!(app.store.len(), 1);
}

#[tokio::test]
async fn test_batch_reports_each_url_in_order() {
    let app = setup_test_app();

    let response = app
        .server
        .post("/api/process-ads-batch")
        .json(&json!({"urls": [
            "https://x.com/alice/status/1",
            "nope",
            "https://x.com/bob/status/2"
        ]}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["succeeded"], 2);
    assert_eq!(body["failed"], 1);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["ad"]["id"], "1");
    assert_eq!(results[1]["success"], false);
    assert_eq!(results[1]["code"], "INVALID_URL");
    assert_eq!(results[1]["stage"], "resolving");
    assert_eq!(results[2]["ad"]["creator"], "@bob");
}

#[tokio::test]
async fn test_batch_size_is_bounded() {
    let app = setup_test_app();

    let empty = app
        .server
        .post("/api/process-ads-batch")
        .json(&json!({"urls": []}))
        .await;
    empty.assert_status_bad_request();
    let body: Value = empty.json();
    assert_eq!(body["code"], "INVALID_INPUT");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Provide between 1 and 20 URLs"));

    let urls: Vec<String> = (0..21)
        .map(|i| format!("https://x.com/alice/status/{}", i))
        .collect();
    let oversized = app
        .server
        .post("/api/process-ads-batch")
        .json(&json!({ "urls": urls }))
        .await;
    oversized.assert_status_bad_request();
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn test_get_ad_round_trip_and_not_found() {
    let app = setup_test_app();
    app.server
        .post("/api/process-ad")
        .json(&json!({"url": "https://x.com/alice/status/12345"}))
        .await
        .assert_status_ok();

    let response = app.server.get("/api/ads/12345").await;
    response.assert_status_ok();
    let ad: Value = response.json();
    assert_eq!(ad["id"], "12345");
    assert_eq!(ad["videoSrc"], "/storage/videos/12345.mp4");
    assert_eq!(ad["type"], "Organic");
    assert_eq!(ad["shots"][1]["timestamp"], "0:02-0:05");
    assert_eq!(ad["shots"][0]["type"], "video");

    let missing = app.server.get("/api/ads/999").await;
    missing.assert_status_not_found();
    let body: Value = missing.json();
    assert_eq!(body["error"], "Ad not found");
}

#[tokio::test]
async fn test_storage_serves_uploaded_video() {
    let app = setup_test_app();
    app.storage
        .put("videos/55.mp4", b"mp4 bytes".to_vec(), "video/mp4")
        .await
        .unwrap();

    let response = app.server.get("/storage/videos/55.mp4").await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "video/mp4");
    assert_eq!(
        response.header("cache-control"),
        "public, max-age=31536000"
    );
    assert_eq!(response.as_bytes().as_ref(), b"mp4 bytes");

    app.server
        .get("/storage/videos/missing.mp4")
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_health_and_openapi() {
    let app = setup_test_app();

    let health = app.server.get("/api/health").await;
    health.assert_status_ok();
    let body: Value = health.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "healthy");

    let spec = app.server.get("/api-docs/openapi.json").await;
    spec.assert_status_ok();
    let spec: Value = spec.json();
    assert!(spec["paths"]["/api/process-ad"].is_object());
}
