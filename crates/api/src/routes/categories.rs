//! Category route handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;

use super::json_body;
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::services::catalog::CatalogService;
use crate::state::AppState;
use crate::views::CategoryView;

#[derive(Debug, Deserialize)]
pub struct CategoryInput {
    #[serde(default)]
    pub name: String,
}

/// List every category, name descending.
pub async fn index(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
) -> Result<Json<Vec<CategoryView>>> {
    let categories = CatalogService::new(state.store()).list_categories().await?;
    Ok(Json(categories.iter().map(CategoryView::from).collect()))
}

/// Create a category owned by the caller.
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    body: std::result::Result<Json<CategoryInput>, JsonRejection>,
) -> Result<(StatusCode, Json<CategoryView>)> {
    let input = json_body(body)?;
    let category = CatalogService::new(state.store())
        .create_category(&user, &input.name)
        .await?;
    Ok((StatusCode::CREATED, Json(CategoryView::from(&category))))
}
