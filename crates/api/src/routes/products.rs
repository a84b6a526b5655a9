//! Product route handlers.

use axum::{
    Json,
    extract::{
        Multipart, Path, Query, State,
        multipart::MultipartRejection,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use serde::Deserialize;

use bodegon_core::ProductId;

use super::{json_body, path_id};
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::services::catalog::{CatalogService, ProductInput, ProductUpdate};
use crate::state::AppState;
use crate::views::{ProductDetailView, ProductImageView, ProductSummaryView};

/// Multipart field carrying the image file.
const IMAGE_FIELD: &str = "image";

/// Product listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
}

/// List the caller's products, newest first.
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<ProductSummaryView>>> {
    let products = CatalogService::new(state.store())
        .list_products(&user, query.category.as_deref())
        .await?;
    let urls = state.media_urls();
    Ok(Json(
        products
            .iter()
            .map(|p| ProductSummaryView::summary(p, urls))
            .collect(),
    ))
}

/// Show one of the caller's products with nested categories.
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    id: std::result::Result<Path<i32>, PathRejection>,
) -> Result<Json<ProductDetailView>> {
    let id = ProductId::new(path_id(id)?);
    let product = CatalogService::new(state.store())
        .get_product(&user, id)
        .await?;
    Ok(Json(ProductDetailView::detail(&product, state.media_urls())))
}

/// Create a product owned by the caller.
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    body: std::result::Result<Json<ProductInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ProductDetailView>)> {
    let input = json_body(body)?;
    let product = CatalogService::new(state.store())
        .create_product(&user, input)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ProductDetailView::detail(&product, state.media_urls())),
    ))
}

/// Partially update one of the caller's products.
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    id: std::result::Result<Path<i32>, PathRejection>,
    body: std::result::Result<Json<ProductUpdate>, JsonRejection>,
) -> Result<Json<ProductDetailView>> {
    let id = ProductId::new(path_id(id)?);
    let update = json_body(body)?;
    let product = CatalogService::new(state.store())
        .update_product(&user, id, update)
        .await?;
    Ok(Json(ProductDetailView::detail(&product, state.media_urls())))
}

/// Attach an uploaded image to one of the caller's products.
pub async fn upload_image(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    id: std::result::Result<Path<i32>, PathRejection>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ProductImageView>> {
    let id = ProductId::new(path_id(id)?);
    let catalog = CatalogService::new(state.store());

    // Check ownership before writing anything to disk.
    catalog.get_product(&user, id).await?;

    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() == Some(IMAGE_FIELD) {
            let file_name = field.file_name().map(str::to_owned);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            upload = Some((file_name, bytes));
            break;
        }
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| AppError::BadRequest("No image file was submitted".to_string()))?;
    let path = state
        .media()
        .save_product_image(file_name.as_deref(), &bytes)
        .await?;
    let product = catalog.attach_image(&user, id, &path).await?;

    Ok(Json(ProductImageView::new(&product, state.media_urls())))
}
