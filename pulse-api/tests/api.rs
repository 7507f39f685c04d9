//! HTTP behaviour of the router in fallback mode

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    http::{header, Method, Request, StatusCode},
    middleware, routing, Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use pulse_api::error::{enforce_deadline, localize_errors};
use pulse_api::{build_router, AppState};
use pulse_core::PulseConfig;
use pulse_services::fallback;

async fn demo_app() -> Router {
    build_router(AppState::demo().await.unwrap())
}

async fn app_with_secret(secret: &str) -> Router {
    let config = PulseConfig {
        cron_secret: Some(secret.to_string()),
        ..PulseConfig::default()
    };
    build_router(AppState::build(config).await.unwrap())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_reports_degraded_capabilities() {
    let app = demo_app().await;
    let (status, body) = get(&app, "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["capabilities"]["store"], false);
    assert_eq!(body["capabilities"]["textGeneration"], false);
}

#[tokio::test]
async fn test_every_read_endpoint_serves_fallback_data() {
    let app = demo_app().await;
    let paths = [
        "/api/news",
        "/api/news/country?country=KR",
        "/api/trends",
        "/api/market",
        "/api/crypto",
        "/api/fear-greed",
        "/api/humor",
        "/api/humor/trending",
        "/api/watchdog?tickers=NVDA",
        "/api/brief/today",
        "/api/brief/2026-01-05",
        "/api/reports?industry=semiconductor",
        "/api/predict",
    ];

    for path in paths {
        let (status, body) = get(&app, path).await;
        assert_eq!(status, StatusCode::OK, "{path}");
        assert!(body.is_object(), "{path}");
    }
}

#[tokio::test]
async fn test_news_feed_shape_and_clamping() {
    let app = demo_app().await;

    let (_, body) = get(&app, "/api/news").await;
    let total = body["total"].as_u64().unwrap();
    assert_eq!(total as usize, fallback::news().len());
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 20);

    let (_, body) = get(&app, "/api/news?page=0&limit=500").await;
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 50);
    assert!(body["items"].as_array().unwrap().len() <= 50);

    let (status, body) = get(&app, "/api/news?page=9999").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 500);
    assert_eq!(body["total"].as_u64().unwrap(), total);
    assert!(body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_news_filters() {
    let app = demo_app().await;

    let (_, body) = get(&app, "/api/news?category=tech&limit=50").await;
    let items = body["items"].as_array().unwrap();
    assert!(!items.is_empty());
    assert!(items.iter().all(|item| item["category"] == "tech"));

    let (_, body) = get(&app, "/api/news/country?country=kr").await;
    assert_eq!(body["country"], "KR");
    let items = body["items"].as_array().unwrap();
    assert!(!items.is_empty());
    assert!(items.iter().all(|item| item["country"] == "KR"));
}

#[tokio::test]
async fn test_news_item_lookup() {
    let app = demo_app().await;
    let id = fallback::news()[0].id.clone();

    let (status, body) = get(&app, &format!("/api/news/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());

    let (status, body) = get(&app, "/api/news/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "news_not_found");
}

#[tokio::test]
async fn test_invalid_parameters_are_rejected() {
    let app = demo_app().await;
    let long_search = "a".repeat(501);
    let cases = [
        ("/api/news?category=sports".to_string(), "invalid_request"),
        ("/api/news?page=two".to_string(), "invalid_request"),
        ("/api/news?sortBy=random".to_string(), "invalid_request"),
        (format!("/api/news?search={long_search}"), "search_too_long"),
        ("/api/news/country".to_string(), "invalid_request"),
        ("/api/humor?type=video".to_string(), "invalid_request"),
        ("/api/trends?limit=ten".to_string(), "invalid_request"),
        ("/api/watchdog?tickers=NVDA,BAD!".to_string(), "invalid_ticker"),
        ("/api/brief/last-week".to_string(), "invalid_request"),
        ("/api/reports".to_string(), "invalid_request"),
        ("/api/reports?industry=mining".to_string(), "invalid_request"),
        ("/api/reports?industry=energy&weekStart=2026-01-06".to_string(), "invalid_request"),
    ];

    for (path, code) in cases {
        let (status, body) = get(&app, &path).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
        assert_eq!(body["code"], code, "{path}");
    }
}

#[tokio::test]
async fn test_watchdog_empty_tickers() {
    let app = demo_app().await;
    let (status, body) = get(&app, "/api/watchdog?tickers=").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
    assert!(body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_future_brief_is_not_found() {
    let app = demo_app().await;
    let (status, body) = get(&app, "/api/brief/2999-01-01").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "brief_not_found");
}

#[tokio::test]
async fn test_errors_are_localized() {
    let app = demo_app().await;
    let request = Request::get("/api/news/does-not-exist")
        .header(header::ACCEPT_LANGUAGE, "ko-KR,ko;q=0.9,en;q=0.8")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "기사를 찾을 수 없습니다.");
    assert_eq!(body["code"], "news_not_found");
}

/// Router with a handler slower than `limit`, layered like the real one
fn slow_app(limit: Duration) -> Router {
    Router::new()
        .route(
            "/slow",
            routing::get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "done"
            }),
        )
        .route("/fast", routing::get(|| async { "done" }))
        .layer(middleware::from_fn_with_state(limit, enforce_deadline))
        .layer(middleware::from_fn(localize_errors))
}

#[tokio::test]
async fn test_slow_handler_times_out_with_localized_error() {
    let app = slow_app(Duration::from_millis(50));

    let (status, body) = get(&app, "/slow").await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(body["code"], "request_timeout");
    assert_eq!(body["error"], "The request took too long. Please try again.");

    let request = Request::get("/slow")
        .header(header::ACCEPT_LANGUAGE, "ko")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(body["error"], "요청 처리 시간이 초과되었습니다. 다시 시도해 주세요.");

    let response = app
        .clone()
        .oneshot(Request::get("/fast").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = demo_app().await;
    let (status, body) = get(&app, "/api/nothing-here").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_vote_without_store_is_not_persisted() {
    let app = demo_app().await;
    let poll = fallback::predictions().remove(0);

    let (status, body) = send(
        &app,
        post_json(&format!("/api/predict/{}/vote", poll.id), json!({"choice": "a"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predictionId"], poll.id.as_str());
    assert_eq!(body["votesA"], poll.votes_a + 1);
    assert_eq!(body["votesB"], poll.votes_b);
    assert_eq!(body["persisted"], false);

    let (status, _) = send(
        &app,
        post_json(&format!("/api/predict/{}/vote", poll.id), json!({"choice": "c"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, post_json("/api/predict/nope/vote", json!({"choice": "b"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "prediction_not_found");
}

#[tokio::test]
async fn test_bookmark_without_store() {
    let app = demo_app().await;

    let (status, body) = send(&app, post_json("/api/user/bookmarks", json!({"newsId": "abc123"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["newsId"], "abc123");
    assert_eq!(body["bookmarked"], true);
    assert_eq!(body["persisted"], false);

    let (status, _) = send(&app, post_json("/api/user/bookmarks", json!({"newsId": " "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let malformed = Request::builder()
        .method(Method::POST)
        .uri("/api/user/bookmarks")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
}

fn cron_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::POST).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_cron_disabled_without_secret() {
    let app = demo_app().await;
    let (status, body) = send(&app, cron_request("/api/cron/collect/rss", Some("anything"))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "invalid_cron_secret");
}

#[tokio::test]
async fn test_cron_requires_matching_secret() {
    let app = app_with_secret("s3cret").await;

    let (status, _) = send(&app, cron_request("/api/cron/collect/rss", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, cron_request("/api/cron/collect/rss", Some("wrong"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Auth is checked before the collector name
    let (status, _) = send(&app, cron_request("/api/cron/collect/nope", Some("wrong"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, cron_request("/api/cron/collect/nope", Some("s3cret"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "collector_not_found");
}

#[tokio::test]
async fn test_cron_generates_weekly_reports() {
    let app = app_with_secret("s3cret").await;
    let (status, body) = send(&app, cron_request("/api/cron/reports", Some("s3cret"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["collected"], 6);
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_rate_limit_blocks_with_retry_after() {
    let app = demo_app().await;

    // Uncached class: 30 per minute
    for _ in 0..30 {
        let (status, _) = get(&app, "/api/news/country?country=US").await;
        assert_eq!(status, StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/news/country?country=US")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "rate_limited");

    // Other classes keep their own budget
    let (status, _) = get(&app, "/api/news").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_is_per_caller() {
    let app = demo_app().await;
    let request = |peer: [u8; 4], user: &str| {
        let mut request = Request::post("/api/user/bookmarks")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-user-id", user)
            .header("x-forwarded-for", format!("198.51.100.{}", user.len()))
            .body(Body::from(json!({"newsId": "abc"}).to_string()))
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((peer, 4000))));
        request
    };

    // Write class: 20 per minute
    for _ in 0..20 {
        let (status, _) = send(&app, request([10, 0, 0, 1], "alice")).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, _) = send(&app, request([10, 0, 0, 1], "alice")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    // Swapping the identity headers from the same peer does not reset the limit
    let (status, _) = send(&app, request([10, 0, 0, 1], "mallory")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    let (status, _) = send(&app, request([10, 0, 0, 2], "alice")).await;
    assert_eq!(status, StatusCode::OK);
}
