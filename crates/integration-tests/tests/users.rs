//! Registration, token issue and profile endpoints.

use axum::http::StatusCode;
use serde_json::json;

use bodegon_integration_tests::{PASSWORD, TestApp};

#[tokio::test]
async fn test_register_returns_public_profile() {
    let app = TestApp::new();

    let (status, body) = app
        .post(
            "/user/create",
            None,
            &json!({"email": "  Ana@BodegonASuSalud.com ", "password": PASSWORD, "name": "Ana"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body,
        json!({"email": "ana@bodegonasusalud.com", "name": "Ana"})
    );
}

#[tokio::test]
async fn test_register_rejects_bad_input() {
    let app = TestApp::new();
    app.sample_user("ana@bodegonasusalud.com").await;

    let (status, body) = app
        .post(
            "/user/create",
            None,
            &json!({"email": "ANA@bodegonasusalud.com", "password": PASSWORD}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "email");

    let (status, body) = app
        .post(
            "/user/create",
            None,
            &json!({"email": "new@bodegonasusalud.com", "password": "1234"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "password");

    let (status, body) = app
        .post(
            "/user/create",
            None,
            &json!({"email": "not-an-email", "password": PASSWORD}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "email");
}

#[tokio::test]
async fn test_token_is_stable_across_logins() {
    let app = TestApp::new();
    let user = app.sample_user("ana@bodegonasusalud.com").await;

    let credentials = json!({"email": "ana@bodegonasusalud.com", "password": PASSWORD});
    let (status, first) = app.post("/user/api_token", None, &credentials).await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = app.post("/user/api_token", None, &credentials).await;

    assert_eq!(first["token"], user.token);
    assert_eq!(first["token"], second["token"]);
    assert_eq!(user.token.len(), 40);
}

#[tokio::test]
async fn test_token_alias_issues_same_token() {
    let app = TestApp::new();
    let user = app.sample_user("ana@bodegonasusalud.com").await;

    let credentials = json!({"email": "ana@bodegonasusalud.com", "password": PASSWORD});
    for uri in ["/user/api_token", "/user/api_token/", "/user/token"] {
        let (status, body) = app.post(uri, None, &credentials).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["token"], user.token, "{uri}");
    }
}

#[tokio::test]
async fn test_token_rejects_bad_credentials() {
    let app = TestApp::new();
    app.sample_user("ana@bodegonasusalud.com").await;

    for credentials in [
        json!({"email": "ana@bodegonasusalud.com", "password": "wrong-password"}),
        json!({"email": "nobody@bodegonasusalud.com", "password": PASSWORD}),
        json!({"email": "", "password": ""}),
    ] {
        let (status, body) = app.post("/user/api_token", None, &credentials).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{credentials}");
        assert_eq!(
            body["error"],
            "Unable to authenticate with provided credentials"
        );
    }
}

#[tokio::test]
async fn test_me_shows_and_updates_profile() {
    let app = TestApp::new();
    let user = app.sample_user("ana@bodegonasusalud.com").await;

    let (status, body) = app.get("/user/me", Some(&user.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"email": "ana@bodegonasusalud.com", "name": "Test User"})
    );

    let (status, body) = app
        .patch(
            "/user/me",
            Some(&user.token),
            &json!({"name": "Ana María", "password": "new-password"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Ana María");

    // The existing token survives a password change; the new password works.
    let (status, _) = app.get("/user/me", Some(&user.token)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app
        .post(
            "/user/api_token",
            None,
            &json!({"email": "ana@bodegonasusalud.com", "password": "new-password"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token"], user.token);

    let (status, body) = app
        .patch("/user/me", Some(&user.token), &json!({"password": "abc"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "password");
}

#[tokio::test]
async fn test_me_rejects_other_methods() {
    let app = TestApp::new();
    let user = app.sample_user("ana@bodegonasusalud.com").await;

    let (status, _) = app.post("/user/me", Some(&user.token), &json!({})).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
