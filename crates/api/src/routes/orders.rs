//! Order route handlers.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use serde::Deserialize;

use bodegon_core::OrderId;

use super::{json_body, path_id};
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::services::orders::{OrderService, OrderSubmission};
use crate::state::AppState;
use crate::views::{MessageView, OrderView};

/// `?order=1,2,3` filter shared by the order and item listings.
#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    pub order: Option<String>,
}

/// List the caller's orders, newest first, with nested items.
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Vec<OrderView>>> {
    let orders = OrderService::new(state.store())
        .list_orders(&user, query.order.as_deref())
        .await?;
    Ok(Json(orders.iter().map(OrderView::from).collect()))
}

/// Place an order. The order itself is not echoed back.
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    body: std::result::Result<Json<OrderSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageView>)> {
    let submission = json_body(body)?;
    OrderService::new(state.store())
        .place_order(&user, submission)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageView {
            message: "Order created successfully",
        }),
    ))
}

/// Show one of the caller's orders.
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    id: std::result::Result<Path<i32>, PathRejection>,
) -> Result<Json<OrderView>> {
    let id = OrderId::new(path_id(id)?);
    let order = OrderService::new(state.store()).get_order(&user, id).await?;
    Ok(Json(OrderView::from(&order)))
}
