// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - POST|GET /api/scrape (success and failed run)
// - GET /api/tools
// - GET /api/scrape/runs (incl. malformed query)
// - concurrent triggers queue behind one run

use async_trait::async_trait;
use serde_json::Value as Json;
use shuttle_axum::axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt as _; // for `oneshot`

use ai_geek_toolbox::ingest::error::FetchError;
use ai_geek_toolbox::ingest::fetch::StaticPage;
use ai_geek_toolbox::ingest::types::PageSource;
use ai_geek_toolbox::store::MemoryStore;
use ai_geek_toolbox::{create_router, AppState, ScrapeConfig};

const BODY_LIMIT: usize = 1024 * 1024;
const FIXTURE: &str = include_str!("fixtures/toolify_sample.html");

struct Timeout;

#[async_trait]
impl PageSource for Timeout {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        Err(FetchError::Timeout {
            url: url.to_string(),
            secs: 30,
        })
    }
    fn name(&self) -> &'static str {
        "timeout"
    }
}

/// Serves the fixture after a delay, so overlapping triggers really overlap.
struct SlowPage(StaticPage);

#[async_trait]
impl PageSource for SlowPage {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        tokio::time::sleep(Duration::from_millis(150)).await;
        self.0.fetch_page(url).await
    }
    fn name(&self) -> &'static str {
        "slow"
    }
}

fn router_with(source: Arc<dyn PageSource>) -> Router {
    let state = AppState::new(Arc::new(MemoryStore::new()), source, ScrapeConfig::default());
    create_router(state)
}

fn fixture_router() -> Router {
    router_with(Arc::new(StaticPage::from_fixture(FIXTURE)))
}

async fn call(app: &Router, method: &str, uri: &str) -> (StatusCode, Json) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.clone().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, json)
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let app = fixture_router();
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");
    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(String::from_utf8_lossy(&bytes).trim(), "OK");
}

#[tokio::test]
async fn scrape_reports_counts_for_post_and_get() {
    let app = fixture_router();

    let (status, body) = call(&app, "POST", "/api/scrape").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["itemsFound"], 5);
    assert_eq!(body["data"]["itemsAdded"], 5);
    assert_eq!(body["data"]["itemsUpdated"], 0);
    assert!(body["data"]["durationSeconds"].is_u64());

    let (status, body) = call(&app, "GET", "/api/scrape").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["itemsAdded"], 0);
    assert_eq!(body["data"]["itemsUpdated"], 5);
}

#[tokio::test]
async fn failed_run_is_500_with_error_message() {
    let app = router_with(Arc::new(Timeout));

    let (status, body) = call(&app, "POST", "/api/scrape").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap_or_default().contains("timed out"));

    // the failure is still logged
    let (_, runs) = call(&app, "GET", "/api/scrape/runs").await;
    assert_eq!(runs["runs"][0]["status"], "failed");
}

#[tokio::test]
async fn tools_listing_groups_by_sub_category() {
    let app = fixture_router();
    call(&app, "POST", "/api/scrape").await;

    let (status, body) = call(&app, "GET", "/api/tools").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["totalTools"], 5);
    assert_eq!(body["stats"]["categories"], 5);

    let groups = body["groups"].as_array().expect("groups array");
    let keys: Vec<&str> = groups.iter().filter_map(|g| g["group"].as_str()).collect();
    assert_eq!(keys, vec!["Audio & Video", "Code", "Image", "Other", "Writing"]);

    let image = &groups[2];
    assert_eq!(image["tags"][0], "AI Image");
    assert_eq!(image["tools"][0]["name"], "Midjourney");
    assert_eq!(image["tools"][0]["isVip"], true);
}

#[tokio::test]
async fn runs_listing_honors_limit() {
    let app = fixture_router();
    for _ in 0..3 {
        call(&app, "POST", "/api/scrape").await;
    }

    let (status, body) = call(&app, "GET", "/api/scrape/runs?limit=2").await;
    assert_eq!(status, StatusCode::OK);
    let runs = body["runs"].as_array().expect("runs array");
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0]["status"], "success");
    assert_eq!(runs[0]["itemsUpdated"], 5);
    assert!(runs[0]["id"].as_i64() > runs[1]["id"].as_i64());
}

#[tokio::test]
async fn runs_listing_rejects_malformed_limit_as_json() {
    let app = fixture_router();
    let (status, body) = call(&app, "GET", "/api/scrape/runs?limit=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn concurrent_triggers_run_one_after_another() {
    let app = router_with(Arc::new(SlowPage(StaticPage::from_fixture(FIXTURE))));

    let (a, b) = tokio::join!(
        call(&app, "POST", "/api/scrape"),
        call(&app, "POST", "/api/scrape")
    );
    assert_eq!(a.0, StatusCode::OK);
    assert_eq!(b.0, StatusCode::OK);

    let (_, tools) = call(&app, "GET", "/api/tools").await;
    assert_eq!(tools["stats"]["totalTools"], 5);

    let (_, body) = call(&app, "GET", "/api/scrape/runs").await;
    let runs = body["runs"].as_array().expect("runs array");
    assert_eq!(runs.len(), 2);
    // newest first: the queued run only saw existing tools
    assert_eq!((runs[1]["itemsAdded"].as_u64(), runs[1]["itemsUpdated"].as_u64()), (Some(5), Some(0)));
    assert_eq!((runs[0]["itemsAdded"].as_u64(), runs[0]["itemsUpdated"].as_u64()), (Some(0), Some(5)));
}
