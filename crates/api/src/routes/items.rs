//! Order item route handlers.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::PathRejection},
};

use bodegon_core::OrderItemId;

use super::orders::OrderQuery;
use super::path_id;
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::services::orders::OrderService;
use crate::state::AppState;
use crate::views::OrderItemView;

/// List items of the caller's orders.
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Vec<OrderItemView>>> {
    let items = OrderService::new(state.store())
        .list_items(&user, query.order.as_deref())
        .await?;
    Ok(Json(items.iter().map(OrderItemView::from).collect()))
}

/// Show one item of the caller's orders.
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    id: std::result::Result<Path<i32>, PathRejection>,
) -> Result<Json<OrderItemView>> {
    let id = OrderItemId::new(path_id(id)?);
    let item = OrderService::new(state.store()).get_item(&user, id).await?;
    Ok(Json(OrderItemView::from(&item)))
}
