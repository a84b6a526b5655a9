//! Persistence port and its adapters.
//!
//! Services depend only on the [`Store`] trait. Two adapters implement it:
//!
//! - [`PgStore`] - `PostgreSQL` via sqlx (production)
//! - [`MemoryStore`] - in-process maps (local development and tests)
//!
//! ## Tables
//!
//! - `app_user`, `auth_token` - accounts and API tokens
//! - `category`, `product`, `product_category` - catalog
//! - `customer_order`, `order_item` - orders and their line items
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p bodegon-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use bodegon_core::{CategoryId, Email, OrderId, OrderItemId, ProductId, UserId};

use crate::models::{
    Category, NewCategory, NewOrder, NewOrderItem, NewProduct, NewUser, Order, OrderItem,
    Product, ProductPatch, User, UserPatch,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Products visible to one owner, optionally narrowed to a category.
#[derive(Debug, Clone)]
pub struct ProductFilter {
    pub owner: UserId,
    /// Category name, matched case-insensitively and exactly.
    pub category: Option<String>,
}

/// Orders (or order items) visible to one owner.
#[derive(Debug, Clone)]
pub struct OrderFilter {
    pub owner: UserId,
    /// When set, only these order IDs.
    pub order_ids: Option<Vec<OrderId>>,
}

/// Storage capability used by every service.
///
/// Every owner-scoped lookup takes the owner explicitly and returns `None`
/// for rows owned by someone else, so callers cannot tell "missing" from
/// "not yours".
#[async_trait]
pub trait Store: Send + Sync {
    /// Check that storage is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    // Users ---------------------------------------------------------------

    /// Insert a user. `Conflict` if the email is taken.
    async fn create_user(&self, new: NewUser) -> Result<User, RepositoryError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Load a user together with their password hash.
    async fn get_user_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// Apply a profile patch. `NotFound` if the user does not exist.
    async fn update_user(&self, id: UserId, patch: UserPatch) -> Result<User, RepositoryError>;

    // Tokens --------------------------------------------------------------

    async fn get_token(&self, user_id: UserId) -> Result<Option<String>, RepositoryError>;

    /// Store a token key. `Conflict` if the user already has one.
    async fn create_token(&self, user_id: UserId, key: &str) -> Result<(), RepositoryError>;

    async fn get_user_by_token(&self, key: &str) -> Result<Option<User>, RepositoryError>;

    // Catalog -------------------------------------------------------------

    async fn create_category(&self, new: NewCategory) -> Result<Category, RepositoryError>;

    /// All categories, name descending then id descending.
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;

    /// Categories with the given IDs; unknown IDs are skipped.
    async fn get_categories(&self, ids: &[CategoryId]) -> Result<Vec<Category>, RepositoryError>;

    async fn create_product(&self, new: NewProduct) -> Result<Product, RepositoryError>;

    /// Matching products, id descending.
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError>;

    async fn get_product(
        &self,
        owner: UserId,
        id: ProductId,
    ) -> Result<Option<Product>, RepositoryError>;

    async fn update_product(
        &self,
        owner: UserId,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Option<Product>, RepositoryError>;

    async fn set_product_image(
        &self,
        owner: UserId,
        id: ProductId,
        image: &str,
    ) -> Result<Option<Product>, RepositoryError>;

    // Orders --------------------------------------------------------------

    /// Open a transaction for placing one order.
    async fn begin(&self) -> Result<Box<dyn OrderTransaction>, RepositoryError>;

    /// Matching orders with their items, id descending.
    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError>;

    async fn get_order(&self, owner: UserId, id: OrderId)
    -> Result<Option<Order>, RepositoryError>;

    /// Items whose parent order matches the filter, id ascending.
    async fn list_order_items(
        &self,
        filter: &OrderFilter,
    ) -> Result<Vec<OrderItem>, RepositoryError>;

    async fn get_order_item(
        &self,
        owner: UserId,
        id: OrderItemId,
    ) -> Result<Option<OrderItem>, RepositoryError>;
}

/// A unit of work for placing one order.
///
/// Nothing written through a transaction is visible to other readers until
/// [`OrderTransaction::commit`]. Dropping it uncommitted discards every
/// write.
#[async_trait]
pub trait OrderTransaction: Send {
    /// Insert the order row with an unset total.
    async fn insert_order(&mut self, new: NewOrder) -> Result<Order, RepositoryError>;

    /// Resolve a product owned by `owner`, reading its current price.
    async fn find_product(
        &mut self,
        owner: UserId,
        id: ProductId,
    ) -> Result<Option<Product>, RepositoryError>;

    async fn insert_order_item(&mut self, new: NewOrderItem)
    -> Result<OrderItem, RepositoryError>;

    /// Write the final order total and bump `updated_date`.
    async fn finalize_order_total(
        &mut self,
        order_id: OrderId,
        total: Decimal,
    ) -> Result<(), RepositoryError>;

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
