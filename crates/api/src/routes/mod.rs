//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Liveness check
//! GET  /health/ready                 - Readiness check (store reachable)
//!
//! # Catalog (token required)
//! GET  /categories                   - All categories
//! POST /categories                   - Create category
//! GET  /products?category=NAME       - Own products, optional category filter
//! POST /products                     - Create product
//! GET  /products/{id}                - Own product detail
//! PATCH /products/{id}               - Update own product
//! POST /products/{id}/upload-image   - Attach image (multipart field `image`)
//!
//! # Orders (token required)
//! GET  /orders?order=1,2             - Own orders with items
//! POST /orders                       - Place order
//! GET  /orders/{id}                  - Own order detail
//! GET  /items?order=1,2              - Items of own orders
//! GET  /items/{id}                   - Own order item
//!
//! # Users
//! POST /user/create                  - Register
//! POST /user/api_token               - Exchange credentials for a token
//! POST /user/token                   - Alias of /user/api_token
//! GET  /user/me                      - Own profile (token required)
//! PATCH /user/me                     - Update own profile (token required)
//! ```
//!
//! Trailing slashes are stripped before routing, so `/orders/` matches too.

pub mod categories;
pub mod items;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Path,
        rejection::{JsonRejection, PathRejection},
    },
    routing::{get, post},
};

use crate::error::AppError;
use crate::state::AppState;

/// Largest accepted image upload.
const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Create the API routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/categories",
            get(categories::index).post(categories::create),
        )
        .route("/products", get(products::index).post(products::create))
        .route(
            "/products/{id}",
            get(products::show).patch(products::update),
        )
        .route(
            "/products/{id}/upload-image",
            post(products::upload_image).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES)),
        )
        .route("/orders", get(orders::index).post(orders::create))
        .route("/orders/{id}", get(orders::show))
        .route("/items", get(items::index))
        .route("/items/{id}", get(items::show))
        .nest("/user", user_routes())
}

/// Create the user account routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(users::create))
        .route("/api_token", post(users::token))
        .route("/token", post(users::token))
        .route("/me", get(users::me).patch(users::update_me))
}

/// Unwrap a JSON body, turning rejections into `400` responses.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// Unwrap an integer path id. Non-integers cannot name a resource, so they
/// are `404` like any other unknown id.
pub(crate) fn path_id(id: Result<Path<i32>, PathRejection>) -> Result<i32, AppError> {
    id.map(|Path(id)| id)
        .map_err(|_| AppError::NotFound("Not found".to_string()))
}
