//! Router-level tests for the HTTP API

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use motorgate::actuator::RecordingActuator;
use motorgate::audit::MemoryAuditLog;
use motorgate::clock::ManualClock;
use motorgate::config::MotorConfig;
use motorgate::http::{router, AppState};
use motorgate::MotorService;

struct Api {
    app: Router,
    audit: Arc<MemoryAuditLog>,
    // Keeps the queue open; the processor is never started
    _service: MotorService,
}

fn api_with(settings: MotorConfig, metrics_enabled: bool) -> Api {
    let audit = Arc::new(MemoryAuditLog::new());
    let service = MotorService::new(
        &settings,
        Arc::new(RecordingActuator::new()),
        audit.clone(),
        Arc::new(ManualClock::default()),
    );
    let app = router(AppState::new(&service), metrics_enabled);
    Api {
        app,
        audit,
        _service: service,
    }
}

fn api() -> Api {
    api_with(MotorConfig::default(), false)
}

fn request(method: Method, uri: &str, user: Option<(&str, &str)>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((id, role)) = user {
        builder = builder.header("x-user-id", id).header("x-user-role", role);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, body)
}

const USER: Option<(&str, &str)> = Some(("alice", "user"));
const ADMIN: Option<(&str, &str)> = Some(("opA", "admin"));

#[tokio::test]
async fn motor_request_is_queued() {
    let api = api();

    let (status, _, body) = send(
        &api.app,
        request(Method::POST, "/api/motor", USER, Some(json!({"duration": 40}))),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Request queued");
    assert!(body["request_id"].is_string());
    assert_eq!(body["duration_secs"], 2400);

    let records = api.audit.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].requester, "alice");
}

#[tokio::test]
async fn motor_request_without_identity_is_unauthorized() {
    let api = api();

    let (status, _, body) = send(
        &api.app,
        request(Method::POST, "/api/motor", None, Some(json!({"duration": 5}))),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn invalid_durations_are_bad_requests() {
    let api = api();

    for body in [json!({}), json!({"duration": 0}), json!({"duration": -3}), json!({"duration": "ten"})] {
        let (status, _, _) = send(
            &api.app,
            request(Method::POST, "/api/motor", USER, Some(body)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
    assert!(api.audit.is_empty().await);
}

#[tokio::test]
async fn exhausted_quota_is_too_many_requests() {
    let api = api();

    send(
        &api.app,
        request(Method::POST, "/api/motor", USER, Some(json!({"duration": 40}))),
    )
    .await;
    let (status, _, body) = send(
        &api.app,
        request(Method::POST, "/api/motor", USER, Some(json!({"duration": 30}))),
    )
    .await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Daily motor-on quota reached. Try again after"));
    assert!(body["resets_at"].is_string());
}

#[tokio::test]
async fn full_queue_is_unavailable_with_retry_after() {
    let api = api_with(
        MotorConfig {
            queue_capacity: 1,
            ..MotorConfig::default()
        },
        false,
    );

    let (first, _, _) = send(
        &api.app,
        request(Method::POST, "/api/motor", USER, Some(json!({"duration": 1}))),
    )
    .await;
    let (second, headers, _) = send(
        &api.app,
        request(Method::POST, "/api/motor", USER, Some(json!({"duration": 1}))),
    )
    .await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::SERVICE_UNAVAILABLE);
    assert!(headers.contains_key(header::RETRY_AFTER));
}

#[tokio::test]
async fn audit_failure_is_internal_error() {
    let api = api();
    api.audit.set_unavailable(true);

    let (status, _, body) = send(
        &api.app,
        request(Method::POST, "/api/motor", USER, Some(json!({"duration": 1}))),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "failed to log request");
}

#[tokio::test]
async fn admin_routes_require_admin_role() {
    let api = api();

    let (status, _, _) = send(
        &api.app,
        request(
            Method::POST,
            "/admin/shutdown",
            USER,
            Some(json!({"reason": "Unauthorized attempt"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = send(&api.app, request(Method::POST, "/admin/restart", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, _, body) = send(&api.app, request(Method::GET, "/api/motor/status", USER, None)).await;
    assert_eq!(body["shutdown_status"]["is_shutdown"], false);
}

#[tokio::test]
async fn shutdown_blocks_requests_until_restart() {
    let api = api();

    let (status, _, body) = send(
        &api.app,
        request(
            Method::POST,
            "/admin/shutdown",
            ADMIN,
            Some(json!({"reason": "Emergency maintenance"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["shutdown_status"]["is_shutdown"], true);

    let (status, _, body) = send(
        &api.app,
        request(Method::POST, "/api/motor", USER, Some(json!({"duration": 1}))),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["reason"], "Emergency maintenance");
    assert_eq!(body["shutdown_by"], "opA");

    let (status, _, body) = send(&api.app, request(Method::GET, "/api/motor/status", USER, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["shutdown_status"]["is_shutdown"], true);
    assert_eq!(body["shutdown_status"]["reason"], "Emergency maintenance");
    assert_eq!(body["shutdown_status"]["shutdown_by"], "opA");

    let (status, _, _) = send(&api.app, request(Method::POST, "/admin/restart", ADMIN, None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(
        &api.app,
        request(Method::POST, "/api/motor", USER, Some(json!({"duration": 1}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn shutdown_without_reason_still_engages() {
    for body in [Some(json!({"reason": "  "})), Some(json!({})), None] {
        let api = api();

        let (status, _, body) = send(
            &api.app,
            request(Method::POST, "/admin/shutdown", ADMIN, body),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["shutdown_status"]["is_shutdown"], true);
        assert_eq!(body["shutdown_status"]["reason"], "unspecified");

        let (_, _, status_body) =
            send(&api.app, request(Method::GET, "/api/motor/status", USER, None)).await;
        assert_eq!(status_body["shutdown_status"]["is_shutdown"], true);
    }
}

#[tokio::test]
async fn shutdown_with_malformed_body_still_engages() {
    let api = api();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/admin/shutdown")
        .header("x-user-id", "opA")
        .header("x-user-role", "admin")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, _, body) = send(&api.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["shutdown_status"]["shutdown_by"], "opA");
}

#[tokio::test]
async fn status_reports_quota_and_queue() {
    let api = api();

    send(
        &api.app,
        request(Method::POST, "/api/motor", USER, Some(json!({"duration": 15}))),
    )
    .await;
    let (status, _, body) = send(&api.app, request(Method::GET, "/api/motor/status", USER, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quota"]["used_secs"], 900);
    assert_eq!(body["quota"]["limit_secs"], 3600);
    assert_eq!(body["quota"]["remaining_secs"], 2700);
    assert_eq!(body["queue_depth"], 1);
    assert_eq!(body["queue_capacity"], 100);
    assert_eq!(body["charge_mode"], "single");
}

#[tokio::test]
async fn health_and_metrics_endpoints() {
    motorgate::metrics::init().unwrap();
    let with_metrics = api_with(MotorConfig::default(), true);
    let without_metrics = api();

    let (status, _, body) = send(&with_metrics.app, request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let response = with_metrics
        .app
        .clone()
        .oneshot(request(Method::GET, "/metrics", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&text).contains("motor_"));

    let (status, _, _) = send(&without_metrics.app, request(Method::GET, "/metrics", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
