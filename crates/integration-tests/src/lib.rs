//! HTTP integration tests for the Bodegón API.
//!
//! Tests drive the real router (`bodegon_api::app::service`) in-process with
//! `tower::ServiceExt::oneshot`, backed by a fresh `MemoryStore` per test.
//! No server or database is needed:
//!
//! ```bash
//! cargo test -p bodegon-integration-tests
//! ```
//!
//! # Fixtures
//!
//! - [`TestApp::sample_user`] - registered user plus API token
//! - [`TestApp::sample_category`] - category owned by a user
//! - [`TestApp::sample_product`] - product owned by a user

#![allow(clippy::missing_panics_doc)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response, StatusCode, header},
};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;
use tower_http::normalize_path::NormalizePath;

use bodegon_api::config::ApiConfig;
use bodegon_api::db::{MemoryStore, Store};
use bodegon_api::models::{Category, NewCategory, NewProduct, Product, User};
use bodegon_api::services::auth::AuthService;
use bodegon_api::state::AppState;
use bodegon_core::{CategoryId, Discount};

/// Default fixture password.
pub const PASSWORD: &str = "password123";

/// Response status and decoded JSON body (`Null` when empty).
pub type JsonResponse = (StatusCode, Value);

/// A registered user and their API token.
pub struct TestUser {
    pub user: User,
    pub token: String,
}

/// The API router over an in-memory store.
pub struct TestApp {
    service: NormalizePath<Router>,
    store: MemoryStore,
    media_root: PathBuf,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.media_root);
    }
}

impl TestApp {
    /// Fresh app with an empty store and its own media directory.
    #[must_use]
    pub fn new() -> Self {
        let media_root =
            std::env::temp_dir().join(format!("bodegon-it-{}", uuid::Uuid::new_v4()));
        let store = MemoryStore::new();
        let state = AppState::new(
            ApiConfig::in_memory(media_root.clone()),
            Arc::new(store.clone()),
        );

        Self {
            service: bodegon_api::app::service(state),
            store,
            media_root,
        }
    }

    /// Direct store access for arranging and inspecting state.
    #[must_use]
    pub const fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Where uploaded media lands.
    #[must_use]
    pub const fn media_root(&self) -> &PathBuf {
        &self.media_root
    }

    // ========================================================================
    // Fixtures
    // ========================================================================

    /// Register a user and log them in.
    pub async fn sample_user(&self, email: &str) -> TestUser {
        let auth = AuthService::new(&self.store);
        let user = auth
            .register(email, PASSWORD, "Test User")
            .await
            .expect("Failed to register sample user");
        let token = auth
            .issue_token(email, PASSWORD)
            .await
            .expect("Failed to issue sample token");
        TestUser { user, token }
    }

    /// Create a category owned by `owner`.
    pub async fn sample_category(&self, owner: &TestUser, name: &str) -> Category {
        self.store
            .create_category(NewCategory {
                user_id: owner.user.id,
                name: name.to_string(),
            })
            .await
            .expect("Failed to create sample category")
    }

    /// Create a product owned by `owner`. `price` is in cents.
    pub async fn sample_product(
        &self,
        owner: &TestUser,
        name: &str,
        price_cents: i64,
        discount: Option<i64>,
        categories: &[CategoryId],
    ) -> Product {
        self.store
            .create_product(NewProduct {
                user_id: owner.user.id,
                name: name.to_string(),
                description: String::new(),
                price: Decimal::new(price_cents, 2),
                discount: discount.map(|pct| {
                    Discount::new(Decimal::from(pct)).expect("Invalid sample discount")
                }),
                weight: "0.70".to_string(),
                units: "l".to_string(),
                featured: false,
                category_ids: categories.to_vec(),
            })
            .await
            .expect("Failed to create sample product")
    }

    // ========================================================================
    // Requests
    // ========================================================================

    /// Send a raw request through the full middleware stack.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.service
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible")
    }

    /// Send a JSON (or bodiless) request and decode the JSON response.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> JsonResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .send(builder.body(body).expect("Failed to build request"))
            .await;
        read_json(response).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> JsonResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: &Value) -> JsonResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: &Value) -> JsonResponse {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }
}

/// Decode a response body as JSON; empty or non-JSON bodies become `Null`.
pub async fn read_json(response: Response<Body>) -> JsonResponse {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Build a `multipart/form-data` body with one file field.
#[must_use]
pub fn multipart_body(field: &str, file_name: &str, bytes: &[u8]) -> (String, Vec<u8>) {
    let boundary = "bodegon-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}
