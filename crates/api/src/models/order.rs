//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use bodegon_core::{Discount, OrderId, OrderItemId, OrderStatus, ProductId, TrackingNumber, UserId};

/// An order placed by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub order_status: OrderStatus,
    pub payment_mode: String,
    pub tracking_number: TrackingNumber,
    /// Unset only while the order is being placed.
    pub order_total: Option<Decimal>,
    pub is_paid: bool,
    pub order_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    pub shipped_date: Option<DateTime<Utc>>,
    /// Line items in creation order.
    pub items: Vec<OrderItem>,
}

/// One line of an order.
///
/// `item_price` and `discount` are copies of the product's values when the
/// order was placed and never follow later product edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub item_price: Decimal,
    pub discount: Option<Discount>,
    pub total_price: Decimal,
}

/// Parameters for inserting an order row.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub payment_mode: String,
    pub tracking_number: TrackingNumber,
}

/// Parameters for inserting an order item row.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub item_price: Decimal,
    pub discount: Option<Discount>,
    pub total_price: Decimal,
}
