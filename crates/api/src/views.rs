//! JSON views returned by the API.
//!
//! Every view lists its fields explicitly; nothing is serialized straight
//! from a model. Decimals serialize as strings (`"15.00"`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use bodegon_core::{CategoryId, Discount, OrderId, OrderItemId, OrderStatus, ProductId};

use crate::config::MediaUrls;
use crate::models::{Category, Order, OrderItem, Product, User};

#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    pub id: CategoryId,
    pub name: String,
}

impl From<&Category> for CategoryView {
    fn from(c: &Category) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
        }
    }
}

/// Product fields shared by the list and detail views; `C` is how each
/// category is rendered.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView<C> {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub discount: Option<Decimal>,
    pub weight: String,
    pub units: String,
    pub featured: bool,
    pub category: Vec<C>,
    /// Absolute URL or `null`.
    pub image: Option<String>,
}

/// List entry: categories as names.
pub type ProductSummaryView = ProductView<String>;

/// Detail: categories as nested objects.
pub type ProductDetailView = ProductView<CategoryView>;

fn product_view<C>(
    product: &Product,
    urls: &MediaUrls,
    category: impl Fn(&Category) -> C,
) -> ProductView<C> {
    ProductView {
        id: product.id,
        name: product.name.clone(),
        description: product.description.clone(),
        price: product.price,
        discount: product.discount.map(Discount::percent),
        weight: product.weight.clone(),
        units: product.units.clone(),
        featured: product.featured,
        category: product.categories.iter().map(category).collect(),
        image: product.image.as_deref().map(|path| urls.url(path)),
    }
}

impl ProductView<String> {
    #[must_use]
    pub fn summary(product: &Product, urls: &MediaUrls) -> Self {
        product_view(product, urls, |c| c.name.clone())
    }
}

impl ProductView<CategoryView> {
    #[must_use]
    pub fn detail(product: &Product, urls: &MediaUrls) -> Self {
        product_view(product, urls, |c: &Category| CategoryView::from(c))
    }
}

/// Response to an image upload.
#[derive(Debug, Clone, Serialize)]
pub struct ProductImageView {
    pub id: ProductId,
    pub image: Option<String>,
}

impl ProductImageView {
    #[must_use]
    pub fn new(product: &Product, urls: &MediaUrls) -> Self {
        Self {
            id: product.id,
            image: product.image.as_deref().map(|path| urls.url(path)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderItemView {
    pub id: OrderItemId,
    pub order: OrderId,
    pub product: ProductId,
    pub quantity: i32,
    pub item_price: Decimal,
    pub discount: Option<Decimal>,
    pub total_price: Decimal,
}

impl From<&OrderItem> for OrderItemView {
    fn from(item: &OrderItem) -> Self {
        Self {
            id: item.id,
            order: item.order_id,
            product: item.product_id,
            quantity: item.quantity,
            item_price: item.item_price,
            discount: item.discount.map(Discount::percent),
            total_price: item.total_price,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub id: OrderId,
    pub order_status: OrderStatus,
    pub payment_mode: String,
    pub tracking_number: String,
    pub order_total: Option<Decimal>,
    pub is_paid: bool,
    pub order_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    pub shipped_date: Option<DateTime<Utc>>,
    pub order_items: Vec<OrderItemView>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            order_status: order.order_status,
            payment_mode: order.payment_mode.clone(),
            tracking_number: order.tracking_number.as_str().to_owned(),
            order_total: order.order_total,
            is_paid: order.is_paid,
            order_date: order.order_date,
            updated_date: order.updated_date,
            shipped_date: order.shipped_date,
            order_items: order.items.iter().map(OrderItemView::from).collect(),
        }
    }
}

/// Public profile. The password hash never leaves the store.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub email: String,
    pub name: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.as_str().to_owned(),
            name: user.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenView {
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub message: &'static str,
}
