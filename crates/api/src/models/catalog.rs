//! Category and product domain types.

use rust_decimal::Decimal;

use bodegon_core::{CategoryId, Discount, ProductId, UserId};

/// A product category.
///
/// Categories record their creator but are readable by every user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub user_id: UserId,
}

/// Parameters for creating a category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub user_id: UserId,
    pub name: String,
}

/// A product owned by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub user_id: UserId,
    pub name: String,
    pub description: String,
    /// Unit price, two fraction digits.
    pub price: Decimal,
    /// `None` and a zero discount both mean full price.
    pub discount: Option<Discount>,
    pub weight: String,
    pub units: String,
    pub featured: bool,
    /// Path relative to the media root, if an image was uploaded.
    pub image: Option<String>,
    /// Categories in ascending id order.
    pub categories: Vec<Category>,
}

/// Parameters for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub user_id: UserId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub discount: Option<Discount>,
    pub weight: String,
    pub units: String,
    pub featured: bool,
    pub category_ids: Vec<CategoryId>,
}

/// Partial product update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    /// `Some(None)` clears the discount.
    pub discount: Option<Option<Discount>>,
    pub weight: Option<String>,
    pub units: Option<String>,
    pub featured: Option<bool>,
    pub category_ids: Option<Vec<CategoryId>>,
}
