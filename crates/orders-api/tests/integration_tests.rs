//! Integration tests for the orders API.
//!
//! Drives the full router, middleware included, through
//! `tower::ServiceExt::oneshot`. Every test builds its own state, so
//! rate-limit buckets and stored restaurants are never shared.

use std::io::Write;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, HeaderName, Method, Request, StatusCode};
use axum::routing::get;
use axum::{Extension, Router};
use http_body_util::BodyExt;
use orders_api::config::AppConfig;
use orders_api::middleware::client::ClientDevice;
use orders_api::registry::{RouteGroup, RouteModule};
use orders_api::{app, default_modules, router, AppState};
use orders_core::{RepositoryError, Restaurant, RestaurantId, RestaurantRepository};
use serde_json::{json, Value};
use tower::ServiceExt;

// -- Helpers ------------------------------------------------------------------

fn test_app() -> Router {
    app(AppState::new())
}

fn app_with(config: AppConfig) -> Router {
    app(AppState::with_config(config))
}

fn register_request(body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/v1/restaurants/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

/// GET as it arrives from `peer`, with extra headers.
fn get_from(uri: &str, peer: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut request = get_request(uri);
    for (name, value) in headers {
        request.headers_mut().insert(
            name.parse::<HeaderName>().unwrap(),
            value.parse().unwrap(),
        );
    }
    let peer: SocketAddr = peer.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(peer));
    request
}

fn restaurant(slug: &str) -> Value {
    json!({
        "name": "Luigi's Trattoria",
        "slug": slug,
        "email": "owner@luigis.example",
    })
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Test-only module whose handler always panics.
struct Boom;

impl RouteModule for Boom {
    fn name(&self) -> &'static str {
        "boom"
    }

    fn register(&self, group: RouteGroup) -> RouteGroup {
        group.route("/boom", get(boom))
    }
}

async fn boom() -> &'static str {
    panic!("kaboom")
}

/// Test-only module echoing the client device key.
struct WhoAmI;

impl RouteModule for WhoAmI {
    fn name(&self) -> &'static str {
        "whoami"
    }

    fn register(&self, group: RouteGroup) -> RouteGroup {
        group.route(
            "/whoami",
            get(|device: Option<Extension<ClientDevice>>| async move {
                device.map_or_else(|| "anonymous".to_string(), |Extension(d)| d.key())
            }),
        )
    }
}

fn app_with_extra(config: AppConfig, extra: Box<dyn RouteModule>) -> Router {
    let state = AppState::with_config(config);
    let mut modules = default_modules(&state);
    modules.push(extra);
    router(state, modules)
}

/// Repository whose every call fails.
struct Unreachable;

#[async_trait]
impl RestaurantRepository for Unreachable {
    async fn create(&self, _: &Restaurant) -> Result<(), RepositoryError> {
        Err(RepositoryError::backend(std::io::Error::other("connection refused")))
    }
    async fn get_by_id(&self, _: RestaurantId) -> Result<Option<Restaurant>, RepositoryError> {
        Err(RepositoryError::backend(std::io::Error::other("connection refused")))
    }
    async fn get_by_slug(&self, _: &str) -> Result<Option<Restaurant>, RepositoryError> {
        Err(RepositoryError::backend(std::io::Error::other("connection refused")))
    }
    async fn list(&self, _: i64, _: i64) -> Result<Vec<Restaurant>, RepositoryError> {
        Err(RepositoryError::backend(std::io::Error::other("connection refused")))
    }
    async fn update(&self, _: &Restaurant) -> Result<(), RepositoryError> {
        Err(RepositoryError::backend(std::io::Error::other("connection refused")))
    }
    async fn delete(&self, _: RestaurantId) -> Result<(), RepositoryError> {
        Err(RepositoryError::backend(std::io::Error::other("connection refused")))
    }
}

// -- Registration -------------------------------------------------------------

#[tokio::test]
async fn register_returns_201_with_defaults() {
    let response = test_app()
        .oneshot(register_request(&restaurant("luigis")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert!(uuid::Uuid::parse_str(body["id"].as_str().unwrap()).is_ok());
    assert_eq!(body["slug"], "luigis");
    assert_eq!(body["opening_time"], "10:00");
    assert_eq!(body["closing_time"], "22:00");
    assert_eq!(body["delivery_fee"], 0.0);
    assert_eq!(body["minimum_order"], 0.0);
    assert_eq!(body["estimated_delivery_time"], 30);
    assert_eq!(body["is_open"], true);
    assert_eq!(body["country"], "USA");
    assert_eq!(body["rating"], 0.0);
    assert_eq!(body["total_reviews"], 0);
    assert!(chrono::DateTime::parse_from_rfc3339(body["created_at"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn duplicate_slug_returns_409() {
    let app = test_app();
    let first = app
        .clone()
        .oneshot(register_request(&restaurant("luigis")))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .oneshot(register_request(&restaurant("luigis")))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body = body_json(second).await;
    assert_eq!(body["error"]["code"], "CONFLICT");
    assert!(body["error"]["message"].as_str().unwrap().contains("luigis"));
}

#[tokio::test]
async fn empty_opening_time_keeps_default() {
    let mut req = restaurant("blank-hours");
    req["opening_time"] = json!("");
    req["closing_time"] = json!("21:30");
    req["delivery_fee"] = json!(2.5);

    let response = test_app().oneshot(register_request(&req)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["opening_time"], "10:00");
    assert_eq!(body["closing_time"], "21:30");
    assert_eq!(body["delivery_fee"], 2.5);
}

#[tokio::test]
async fn malformed_json_returns_400() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/restaurants/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn missing_required_field_returns_400() {
    let response = test_app()
        .oneshot(register_request(&json!({ "name": "No Slug", "email": "a@b.example" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_fields_return_validation_error() {
    let app = test_app();
    let cases = [
        json!({ "name": "", "slug": "ok", "email": "a@b.example" }),
        json!({ "name": "x", "slug": "Not A Slug", "email": "a@b.example" }),
        json!({ "name": "x", "slug": "ok", "email": "nope" }),
        json!({ "name": "x", "slug": "ok", "email": "a@b.example", "opening_time": "25:00" }),
        json!({ "name": "x", "slug": "ok", "email": "a@b.example", "delivery_fee": -3 }),
        json!({ "name": "x", "slug": "ok", "email": "a@b.example", "delivery_fee": 2.555 }),
        json!({ "name": "x", "slug": "ok", "email": "a@b.example", "minimum_order": 1e9 }),
    ];
    for case in cases {
        let response = app.clone().oneshot(register_request(&case)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{case}");
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR", "{case}");
    }
}

#[tokio::test]
async fn store_failure_returns_500_without_details() {
    let state = AppState::new().with_repository(Arc::new(Unreachable));
    let response = app(state)
        .oneshot(register_request(&restaurant("luigis")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
    assert_eq!(body["error"]["message"], "An internal error occurred");
}

/// Log sink shared with the subscriber under test.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

#[tokio::test]
async fn store_failure_is_logged_with_method_and_path() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let state = AppState::new().with_repository(Arc::new(Unreachable));
    let response = app(state)
        .oneshot(register_request(&restaurant("luigis")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let output = logs.contents();
    let line = output
        .lines()
        .find(|l| l.contains("ERROR"))
        .unwrap_or_else(|| panic!("no error logged:\n{output}"));
    assert!(line.contains("/api/v1/restaurants/register"), "{line}");
    assert!(line.contains("POST"), "{line}");
    assert!(line.contains("connection refused"), "{line}");
}

// -- Lookup -------------------------------------------------------------------

#[tokio::test]
async fn registered_restaurant_is_fetchable_by_slug() {
    let app = test_app();
    let created = body_json(
        app.clone()
            .oneshot(register_request(&restaurant("round-trip")))
            .await
            .unwrap(),
    )
    .await;

    let response = app
        .oneshot(get_request("/api/v1/restaurants/round-trip"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert_eq!(fetched["id"], created["id"]);
    assert_eq!(fetched["slug"], "round-trip");
    assert_eq!(fetched["opening_time"], created["opening_time"]);
    assert_eq!(fetched["created_at"], created["created_at"]);
}

#[tokio::test]
async fn unknown_slug_returns_404() {
    let response = test_app()
        .oneshot(get_request("/api/v1/restaurants/nobody"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn list_respects_limit() {
    let app = test_app();
    for slug in ["a", "b", "c"] {
        let response = app.clone().oneshot(register_request(&restaurant(slug))).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let all = body_json(app.clone().oneshot(get_request("/api/v1/restaurants")).await.unwrap()).await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let page = body_json(
        app.clone()
            .oneshot(get_request("/api/v1/restaurants?limit=2&offset=0"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(page.as_array().unwrap().len(), 2);

    let bad = app
        .oneshot(get_request("/api/v1/restaurants?limit=lots"))
        .await
        .unwrap();
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
}

// -- Rate limiting ------------------------------------------------------------

#[tokio::test]
async fn eleventh_request_in_a_burst_is_rejected_silently() {
    let app = test_app();

    for i in 0..10 {
        let response = app
            .clone()
            .oneshot(get_from("/health/liveness", "203.0.113.9:50000", &[]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "request {i}");
    }

    let rejected = app
        .clone()
        .oneshot(get_from("/health/liveness", "203.0.113.9:50001", &[]))
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(body_bytes(rejected).await.is_empty());

    let other_client = app
        .oneshot(get_from("/health/liveness", "203.0.113.10:50000", &[]))
        .await
        .unwrap();
    assert_eq!(other_client.status(), StatusCode::OK);
}

#[tokio::test]
async fn rotating_forwarded_for_does_not_escape_the_limit() {
    let state = AppState::new();
    let limiter = state.limiter.clone();
    let app = app(state);

    let mut admitted = 0;
    for i in 0..50 {
        let spoofed = format!("198.18.0.{i}");
        let response = app
            .clone()
            .oneshot(get_from(
                "/health/liveness",
                "192.0.2.77:40000",
                &[("x-forwarded-for", &spoofed), ("x-real-ip", &spoofed)],
            ))
            .await
            .unwrap();
        if response.status() == StatusCode::OK {
            admitted += 1;
        }
    }
    assert_eq!(admitted, 10);
    assert_eq!(limiter.tracked(), 1);
}

#[tokio::test]
async fn trusted_proxy_hop_keys_on_the_appended_address() {
    let state = AppState::with_config(AppConfig {
        trusted_proxy_hops: 1,
        ..AppConfig::default()
    });
    let limiter = state.limiter.clone();
    let app = app(state);

    for i in 0..20 {
        let chain = format!("198.18.0.{i}, 203.0.113.50");
        app.clone()
            .oneshot(get_from(
                "/health/liveness",
                "10.0.0.2:443",
                &[("x-forwarded-for", &chain)],
            ))
            .await
            .unwrap();
    }
    assert_eq!(limiter.tracked(), 1);

    let neighbour = app
        .oneshot(get_from(
            "/health/liveness",
            "10.0.0.2:443",
            &[("x-forwarded-for", "203.0.113.51")],
        ))
        .await
        .unwrap();
    assert_eq!(neighbour.status(), StatusCode::OK);
    assert_eq!(limiter.tracked(), 2);
}

#[tokio::test]
async fn bucket_refills_after_a_second() {
    let app = test_app();
    let request = || get_from("/health/liveness", "198.51.100.4:6000", &[]);
    for _ in 0..11 {
        app.clone().oneshot(request()).await.unwrap();
    }

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    for i in 0..5 {
        let response = app.clone().oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "refilled request {i}");
    }
}

// -- Panic recovery -----------------------------------------------------------

#[tokio::test]
async fn panic_yields_500_while_concurrent_registration_succeeds() {
    let app = app_with_extra(AppConfig::default(), Box::new(Boom));

    let (panicked, registered) = tokio::join!(
        app.clone().oneshot(get_request("/api/v1/boom")),
        app.clone().oneshot(register_request(&restaurant("survivor"))),
    );

    let panicked = panicked.unwrap();
    assert_eq!(panicked.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(panicked).await;
    assert_eq!(body["error"]["message"], "Something went wrong on our end.");
    assert!(body["error"].get("details").is_none());

    assert_eq!(registered.unwrap().status(), StatusCode::CREATED);

    let after = app.oneshot(get_request("/health/liveness")).await.unwrap();
    assert_eq!(after.status(), StatusCode::OK);
}

#[tokio::test]
async fn debug_mode_exposes_panic_details() {
    let config = AppConfig {
        debug: true,
        ..AppConfig::default()
    };
    let response = app_with_extra(config, Box::new(Boom))
        .oneshot(get_request("/api/v1/boom"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["error"]["message"], "Internal Server Error - Debug Mode");
    assert_eq!(body["error"]["details"]["panic"], "panic: kaboom");
    assert!(!body["error"]["details"]["stack"].as_str().unwrap().is_empty());
}

// -- Client identification ----------------------------------------------------

#[tokio::test]
async fn user_agent_tags_request_with_device() {
    let app = app_with_extra(AppConfig::default(), Box::new(WhoAmI));

    let tagged = app
        .clone()
        .oneshot(
            get_from(
                "/api/v1/whoami",
                "203.0.113.5:51000",
                &[(
                    "user-agent",
                    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)",
                )],
            ),
        )
        .await
        .unwrap();
    assert_eq!(body_bytes(tagged).await, b"203.0.113.5:iphone");

    let untagged = app.oneshot(get_request("/api/v1/whoami")).await.unwrap();
    assert_eq!(untagged.status(), StatusCode::OK);
    assert_eq!(body_bytes(untagged).await, b"anonymous");
}

// -- Bearer gate --------------------------------------------------------------

#[tokio::test]
async fn bearer_gate_rejects_missing_or_malformed_tokens() {
    let app = app_with(AppConfig {
        require_bearer: true,
        ..AppConfig::default()
    });

    let missing = app
        .clone()
        .oneshot(register_request(&restaurant("gated")))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let mut malformed = register_request(&restaurant("gated"));
    malformed
        .headers_mut()
        .insert(header::AUTHORIZATION, "Token abc".parse().unwrap());
    assert_eq!(
        app.clone().oneshot(malformed).await.unwrap().status(),
        StatusCode::UNAUTHORIZED
    );

    let mut authorized = register_request(&restaurant("gated"));
    authorized
        .headers_mut()
        .insert(header::AUTHORIZATION, "Bearer abc123".parse().unwrap());
    assert_eq!(
        app.clone().oneshot(authorized).await.unwrap().status(),
        StatusCode::CREATED
    );

    let liveness = app.oneshot(get_request("/health/liveness")).await.unwrap();
    assert_eq!(liveness.status(), StatusCode::OK);
}

// -- CORS ---------------------------------------------------------------------

#[tokio::test]
async fn preflight_is_answered() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/v1/restaurants/register")
                .header(header::ORIGIN, "https://app.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}

#[tokio::test]
async fn configured_origins_are_echoed() {
    let app = app_with(AppConfig {
        cors_allowed_origins: vec!["https://app.example".into()],
        ..AppConfig::default()
    });
    let response = app
        .oneshot(
            Request::get("/health/liveness")
                .header(header::ORIGIN, "https://app.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://app.example"
    );
}

// -- Operational endpoints ----------------------------------------------------

#[tokio::test]
async fn health_probes_answer_without_dependencies() {
    let app = test_app();
    let live = app.clone().oneshot(get_request("/health/liveness")).await.unwrap();
    assert_eq!(live.status(), StatusCode::OK);
    assert_eq!(body_bytes(live).await, b"ok");

    let ready = app.oneshot(get_request("/health/readiness")).await.unwrap();
    assert_eq!(ready.status(), StatusCode::OK);
    assert_eq!(body_bytes(ready).await, b"ready");
}

#[tokio::test]
async fn metrics_endpoint_is_absent_without_recorder() {
    let response = test_app().oneshot(get_request("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let response = test_app().oneshot(get_request("/openapi.json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response).await;
    assert!(doc["paths"]["/api/v1/restaurants/register"].is_object());
}
