//! The router end to end, for routes that never touch the database.

#![allow(clippy::unwrap_used)]

use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use serde_json::{Value, json};
use tower::ServiceExt;

use eyeric_integration_tests::{SUPABASE_URL, test_app};

const BODY_LIMIT: usize = 1024 * 1024;

async fn send(request: Request<Body>) -> Response {
    test_app().oneshot(request).await.unwrap()
}

fn api_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", "203.0.113.7");
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_content_page_renders_with_security_headers() {
    let response = send(Request::get("/about").body(Body::empty()).unwrap()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let csp = response
        .headers()
        .get(header::CONTENT_SECURITY_POLICY)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(csp.contains("script-src 'self'"));
    assert!(csp.contains(SUPABASE_URL));
    assert_eq!(
        response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
        "nosniff"
    );

    let html = body_text(response).await;
    assert!(html.contains("About Eyeric"));
    assert!(html.contains(r#"href="/privacy""#));
}

#[tokio::test]
async fn test_health_and_request_id() {
    let response = send(
        Request::get("/health")
            .header("x-request-id", "trace-123")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-request-id").unwrap(), "trace-123");
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_reports_unreachable_database() {
    let response = send(Request::get("/health/ready").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_static_css_is_served() {
    let response = send(
        Request::get("/static/css/main.css")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_guest_cart_count_is_zero() {
    let response = send(Request::get("/cart/count").body(Body::empty()).unwrap()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "count": 0 }));
}

#[tokio::test]
async fn test_lens_flow_starts_idle() {
    let response = send(api_request(Method::GET, "/api/lens-flow", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["step"], "idle");
    assert_eq!(body["kinds"], json!([]));
    assert_eq!(body["lenses"], json!([]));
}

#[tokio::test]
async fn test_cancel_is_accepted_while_idle() {
    let response = send(api_request(
        Method::POST,
        "/api/lens-flow/event",
        Some(json!({ "type": "cancel" })),
    ))
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["step"], "idle");
}

#[tokio::test]
async fn test_back_while_idle_is_a_conflict() {
    let response = send(api_request(
        Method::POST,
        "/api/lens-flow/event",
        Some(json!({ "type": "back" })),
    ))
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_malformed_event_is_rejected() {
    let response = send(api_request(
        Method::POST,
        "/api/lens-flow/event",
        Some(json!({ "type": "teleport" })),
    ))
    .await;

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_orders_require_login() {
    let response = send(Request::get("/orders").body(Body::empty()).unwrap()).await;

    assert!(response.status().is_redirection());
    let location = response.headers().get(header::LOCATION).unwrap();
    assert!(location.to_str().unwrap().starts_with("/auth/login"));
}
