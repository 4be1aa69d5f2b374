mod common;

use axum::http::{header, StatusCode};
use common::{body_json, TestApp};

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;

    let res = app.get("/health", None).await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = body_json(res).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "access-service");
    assert_eq!(body["environment"], "dev");
}

#[tokio::test]
async fn test_security_headers_present() {
    let app = TestApp::new().await;

    let res = app.get("/health", None).await;
    assert_eq!(
        res.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(res.headers().get("x-frame-options").unwrap(), "DENY");
    assert!(res.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_metrics_endpoint_serves_text() {
    let app = TestApp::new().await;

    let res = app.get("/metrics", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
}

#[tokio::test]
async fn test_openapi_document_lists_routes() {
    let app = TestApp::new().await;

    let res = app.get("/.well-known/openapi.json", None).await;
    assert_eq!(res.status(), StatusCode::OK);

    let doc = body_json(res).await;
    for path in ["/signup", "/login", "/auth/check-session", "/admin/approve-user"] {
        assert!(doc["paths"].get(path).is_some(), "missing {}", path);
    }
    assert!(doc["components"]["securitySchemes"]
        .get("session_cookie")
        .is_some());
}
