//! Categories and owner-scoped products.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use tracing::instrument;

use bodegon_core::pricing::{MAX_PRICE, round_currency};
use bodegon_core::{CategoryId, Discount, ProductId, normalize_category_name};

use super::{ServiceError, ServiceResult};
use crate::db::{ProductFilter, Store};
use crate::models::{Category, NewCategory, NewProduct, Product, ProductPatch, User};

/// Product creation payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub discount: Option<Discount>,
    #[serde(default)]
    pub weight: String,
    #[serde(default)]
    pub units: String,
    #[serde(default)]
    pub featured: bool,
    /// Category ids.
    #[serde(default)]
    pub category: Vec<CategoryId>,
}

/// Partial product update payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    /// `null` removes the discount.
    #[serde(default, deserialize_with = "explicit_null")]
    pub discount: Option<Option<Discount>>,
    pub weight: Option<String>,
    pub units: Option<String>,
    pub featured: Option<bool>,
    pub category: Option<Vec<CategoryId>>,
}

fn validate_name(field: &str, name: &str) -> ServiceResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::validation(field, "this field may not be blank"));
    }
    Ok(name.to_owned())
}

fn validate_price(price: Decimal) -> ServiceResult<Decimal> {
    if price.is_sign_negative() {
        return Err(ServiceError::validation("price", "price must not be negative"));
    }
    let price = round_currency(price);
    if price > MAX_PRICE {
        return Err(ServiceError::validation(
            "price",
            format!("price must not exceed {MAX_PRICE}"),
        ));
    }
    Ok(price)
}

/// Keep an explicit `null` apart from an absent field: absent is `None`,
/// `null` is `Some(None)`.
fn explicit_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Catalog operations.
pub struct CatalogService<'a> {
    store: &'a dyn Store,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// All categories, visible to every authenticated user.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the store fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> ServiceResult<Vec<Category>> {
        Ok(self.store.list_categories().await?)
    }

    /// Create a category owned by the acting user.
    ///
    /// # Errors
    ///
    /// Returns `Validation` on field `name` if the name is blank.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn create_category(&self, user: &User, name: &str) -> ServiceResult<Category> {
        let name = validate_name("name", name)?;
        let category = self
            .store
            .create_category(NewCategory {
                user_id: user.id,
                name,
            })
            .await?;
        tracing::info!(category_id = %category.id, "Category created");
        Ok(category)
    }

    /// Products of the acting user, newest first.
    ///
    /// A `category` filter is title-cased and then matched exactly, ignoring
    /// case, against category names.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the store fails.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn list_products(
        &self,
        user: &User,
        category: Option<&str>,
    ) -> ServiceResult<Vec<Product>> {
        let filter = ProductFilter {
            owner: user.id,
            category: category.map(normalize_category_name),
        };
        Ok(self.store.list_products(&filter).await?)
    }

    /// One product of the acting user.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist or is not the user's.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn get_product(&self, user: &User, id: ProductId) -> ServiceResult<Product> {
        self.store
            .get_product(user.id, id)
            .await?
            .ok_or_else(|| product_not_found(id))
    }

    /// Create a product owned by the acting user.
    ///
    /// # Errors
    ///
    /// - `Validation` for a blank name or negative price
    /// - `NotFound` if a referenced category does not exist
    #[instrument(skip(self, user, input), fields(user_id = %user.id))]
    pub async fn create_product(&self, user: &User, input: ProductInput) -> ServiceResult<Product> {
        let name = validate_name("name", &input.name)?;
        let price = validate_price(input.price)?;
        self.ensure_categories_exist(&input.category).await?;

        let product = self
            .store
            .create_product(NewProduct {
                user_id: user.id,
                name,
                description: input.description,
                price,
                discount: input.discount,
                weight: input.weight,
                units: input.units,
                featured: input.featured,
                category_ids: input.category,
            })
            .await?;
        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Apply a partial update to one of the acting user's products.
    ///
    /// Existing order items keep the price and discount they were placed with.
    ///
    /// # Errors
    ///
    /// - `Validation` for a blank name or negative price
    /// - `NotFound` for a missing product or category
    #[instrument(skip(self, user, update), fields(user_id = %user.id))]
    pub async fn update_product(
        &self,
        user: &User,
        id: ProductId,
        update: ProductUpdate,
    ) -> ServiceResult<Product> {
        let name = update
            .name
            .as_deref()
            .map(|name| validate_name("name", name))
            .transpose()?;
        let price = update.price.map(validate_price).transpose()?;
        if let Some(category_ids) = &update.category {
            self.ensure_categories_exist(category_ids).await?;
        }

        let patch = ProductPatch {
            name,
            description: update.description,
            price,
            discount: update.discount,
            weight: update.weight,
            units: update.units,
            featured: update.featured,
            category_ids: update.category,
        };
        self.store
            .update_product(user.id, id, patch)
            .await?
            .ok_or_else(|| product_not_found(id))
    }

    /// Record an uploaded image path on one of the acting user's products.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist or is not the user's.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn attach_image(
        &self,
        user: &User,
        id: ProductId,
        path: &str,
    ) -> ServiceResult<Product> {
        self.store
            .set_product_image(user.id, id, path)
            .await?
            .ok_or_else(|| product_not_found(id))
    }

    async fn ensure_categories_exist(&self, ids: &[CategoryId]) -> ServiceResult<()> {
        let found = self.store.get_categories(ids).await?;
        if let Some(missing) = ids.iter().find(|id| !found.iter().any(|c| c.id == **id)) {
            return Err(ServiceError::NotFound {
                entity: "category",
                id: missing.as_i32(),
            });
        }
        Ok(())
    }
}

const fn product_not_found(id: ProductId) -> ServiceError {
    ServiceError::NotFound {
        entity: "product",
        id: id.as_i32(),
    }
}
