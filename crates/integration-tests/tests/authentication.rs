//! Every catalog and order endpoint refuses requests without a valid token.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::json;

use bodegon_integration_tests::{TestApp, read_json};

const PROTECTED: &[(&str, &str)] = &[
    ("GET", "/categories"),
    ("POST", "/categories"),
    ("GET", "/products"),
    ("POST", "/products"),
    ("GET", "/products/1"),
    ("PATCH", "/products/1"),
    ("POST", "/products/1/upload-image"),
    ("GET", "/orders"),
    ("POST", "/orders"),
    ("GET", "/orders/1"),
    ("GET", "/items"),
    ("GET", "/items/1"),
    ("GET", "/user/me"),
    ("PATCH", "/user/me"),
];

async fn send_with_auth(app: &TestApp, method: &str, uri: &str, auth: Option<&str>) -> StatusCode {
    let mut builder = Request::builder()
        .method(Method::from_bytes(method.as_bytes()).expect("valid method"))
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    let response = app
        .send(builder.body(Body::from("{}")).expect("request"))
        .await;
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        assert_eq!(
            response
                .headers()
                .get(header::WWW_AUTHENTICATE)
                .expect("challenge header"),
            "Token"
        );
    }
    status
}

#[tokio::test]
async fn test_missing_token_is_unauthorized_everywhere() {
    let app = TestApp::new();
    for (method, uri) in PROTECTED {
        assert_eq!(
            send_with_auth(&app, method, uri, None).await,
            StatusCode::UNAUTHORIZED,
            "{method} {uri}"
        );
    }
}

#[tokio::test]
async fn test_unknown_or_malformed_token_is_unauthorized() {
    let app = TestApp::new();
    for auth in ["Token nope", "Token", "Basic dXNlcjpwYXNz", "nope"] {
        for (method, uri) in PROTECTED {
            assert_eq!(
                send_with_auth(&app, method, uri, Some(auth)).await,
                StatusCode::UNAUTHORIZED,
                "{auth:?} {method} {uri}"
            );
        }
    }
}

#[tokio::test]
async fn test_unauthorized_body_explains() {
    let app = TestApp::new();
    let (status, body) = app.get("/orders", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication credentials were not provided");
}

#[tokio::test]
async fn test_bearer_scheme_is_accepted() {
    let app = TestApp::new();
    let user = app.sample_user("user@bodegonasusalud.com").await;
    let status = send_with_auth(
        &app,
        "GET",
        "/categories",
        Some(&format!("Bearer {}", user.token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_public_endpoints_need_no_token() {
    let app = TestApp::new();

    let (status, _) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get("/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/user/create",
            None,
            &json!({"email": "new@bodegonasusalud.com", "password": "password123", "name": "New"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/user/api_token")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"email": "new@bodegonasusalud.com", "password": "password123"}).to_string(),
        ))
        .expect("request");
    let (status, body) = read_json(app.send(request).await).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());
}
