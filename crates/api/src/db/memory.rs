//! In-memory [`Store`] adapter.
//!
//! Backs `BODEGON_STORAGE=memory` for local development and every HTTP test.
//! IDs come from per-table sequences that, like `SERIAL` columns, are not
//! rolled back, so aborted orders leave gaps.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use rust_decimal::Decimal;

use bodegon_core::{
    CategoryId, Email, OrderId, OrderItemId, OrderStatus, ProductId, TrackingNumber, UserId,
};

use super::{OrderFilter, OrderTransaction, ProductFilter, RepositoryError, Store};
use crate::models::{
    Category, NewCategory, NewOrder, NewOrderItem, NewProduct, NewUser, Order, OrderItem,
    Product, ProductPatch, User, UserPatch,
};

/// Thread-safe, cloneable in-memory store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, (User, String)>,
    tokens: HashMap<String, UserId>,
    categories: BTreeMap<CategoryId, Category>,
    products: BTreeMap<ProductId, StoredProduct>,
    orders: BTreeMap<OrderId, Order>,
    items: BTreeMap<OrderItemId, OrderItem>,
    sequences: Sequences,
}

#[derive(Default)]
struct Sequences {
    user: i32,
    category: i32,
    product: i32,
    order: i32,
    item: i32,
}

fn next(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

/// Products keep category IDs; names are joined in on read so renamed
/// categories show up everywhere.
struct StoredProduct {
    product: Product,
    category_ids: Vec<CategoryId>,
}

impl Tables {
    fn hydrate_product(&self, stored: &StoredProduct) -> Product {
        let mut ids = stored.category_ids.clone();
        ids.sort_unstable();
        ids.dedup();
        Product {
            categories: ids
                .iter()
                .filter_map(|id| self.categories.get(id).cloned())
                .collect(),
            ..stored.product.clone()
        }
    }

    fn hydrate_order(&self, order: &Order) -> Order {
        Order {
            items: self
                .items
                .values()
                .filter(|item| item.order_id == order.id)
                .cloned()
                .collect(),
            ..order.clone()
        }
    }

    fn owned_product_mut(&mut self, owner: UserId, id: ProductId) -> Option<&mut StoredProduct> {
        self.products
            .get_mut(&id)
            .filter(|stored| stored.product.user_id == owner)
    }

    fn order_visible(&self, order_id: OrderId, filter: &OrderFilter) -> bool {
        self.orders
            .get(&order_id)
            .is_some_and(|order| order.user_id == filter.owner)
            && filter
                .order_ids
                .as_ref()
                .is_none_or(|ids| ids.contains(&order_id))
    }

    fn tracking_number_taken(&self, tracking_number: &TrackingNumber) -> bool {
        self.orders
            .values()
            .any(|order| &order.tracking_number == tracking_number)
    }
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn create_user(&self, new: NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write();
        if tables.users.values().any(|(u, _)| u.email == new.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(next(&mut tables.sequences.user)),
            email: new.email,
            name: new.name,
            address: String::new(),
            city: String::new(),
            state: String::new(),
            zip: String::new(),
            phone: String::new(),
            id_type: String::new(),
            id_number: String::new(),
            is_active: true,
            is_staff: new.is_staff,
            created_at: now,
            updated_at: now,
        };
        tables
            .users
            .insert(user.id, (user.clone(), new.password_hash));
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables.read().users.get(&id).map(|(u, _)| u.clone()))
    }

    async fn get_user_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        Ok(self
            .tables
            .read()
            .users
            .values()
            .find(|(u, _)| &u.email == email)
            .cloned())
    }

    async fn update_user(&self, id: UserId, patch: UserPatch) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write();
        let (user, password_hash) = tables.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        if let Some(hash) = patch.password_hash.clone() {
            *password_hash = hash;
        }
        patch.apply(user);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn get_token(&self, user_id: UserId) -> Result<Option<String>, RepositoryError> {
        Ok(self
            .tables
            .read()
            .tokens
            .iter()
            .find(|(_, owner)| **owner == user_id)
            .map(|(key, _)| key.clone()))
    }

    async fn create_token(&self, user_id: UserId, key: &str) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write();
        if tables.tokens.contains_key(key) || tables.tokens.values().any(|u| *u == user_id) {
            return Err(RepositoryError::Conflict("token already exists".to_owned()));
        }
        tables.tokens.insert(key.to_owned(), user_id);
        Ok(())
    }

    async fn get_user_by_token(&self, key: &str) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read();
        Ok(tables
            .tokens
            .get(key)
            .and_then(|id| tables.users.get(id))
            .map(|(u, _)| u.clone()))
    }

    async fn create_category(&self, new: NewCategory) -> Result<Category, RepositoryError> {
        let mut tables = self.tables.write();
        let category = Category {
            id: CategoryId::new(next(&mut tables.sequences.category)),
            name: new.name,
            user_id: new.user_id,
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let mut categories: Vec<Category> =
            self.tables.read().categories.values().cloned().collect();
        categories.sort_by(|a, b| b.name.cmp(&a.name).then(b.id.cmp(&a.id)));
        Ok(categories)
    }

    async fn get_categories(&self, ids: &[CategoryId]) -> Result<Vec<Category>, RepositoryError> {
        let tables = self.tables.read();
        Ok(tables
            .categories
            .values()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect())
    }

    async fn create_product(&self, new: NewProduct) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.write();
        let product = Product {
            id: ProductId::new(next(&mut tables.sequences.product)),
            user_id: new.user_id,
            name: new.name,
            description: new.description,
            price: new.price,
            discount: new.discount,
            weight: new.weight,
            units: new.units,
            featured: new.featured,
            image: None,
            categories: Vec::new(),
        };
        let stored = StoredProduct {
            product,
            category_ids: new.category_ids,
        };
        let hydrated = tables.hydrate_product(&stored);
        tables.products.insert(hydrated.id, stored);
        Ok(hydrated)
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.tables.read();
        let wanted = filter.category.as_deref().map(str::to_lowercase);
        Ok(tables
            .products
            .values()
            .rev()
            .filter(|stored| stored.product.user_id == filter.owner)
            .map(|stored| tables.hydrate_product(stored))
            .filter(|product| {
                wanted.as_ref().is_none_or(|name| {
                    product
                        .categories
                        .iter()
                        .any(|c| c.name.to_lowercase() == *name)
                })
            })
            .collect())
    }

    async fn get_product(
        &self,
        owner: UserId,
        id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        let tables = self.tables.read();
        Ok(tables
            .products
            .get(&id)
            .filter(|stored| stored.product.user_id == owner)
            .map(|stored| tables.hydrate_product(stored)))
    }

    async fn update_product(
        &self,
        owner: UserId,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut tables = self.tables.write();
        let Some(stored) = tables.owned_product_mut(owner, id) else {
            return Ok(None);
        };

        let product = &mut stored.product;
        if let Some(name) = patch.name {
            product.name = name;
        }
        if let Some(description) = patch.description {
            product.description = description;
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(discount) = patch.discount {
            product.discount = discount;
        }
        if let Some(weight) = patch.weight {
            product.weight = weight;
        }
        if let Some(units) = patch.units {
            product.units = units;
        }
        if let Some(featured) = patch.featured {
            product.featured = featured;
        }
        if let Some(category_ids) = patch.category_ids {
            stored.category_ids = category_ids;
        }

        Ok(tables
            .products
            .get(&id)
            .map(|stored| tables.hydrate_product(stored)))
    }

    async fn set_product_image(
        &self,
        owner: UserId,
        id: ProductId,
        image: &str,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut tables = self.tables.write();
        let Some(stored) = tables.owned_product_mut(owner, id) else {
            return Ok(None);
        };
        stored.product.image = Some(image.to_owned());
        Ok(tables
            .products
            .get(&id)
            .map(|stored| tables.hydrate_product(stored)))
    }

    async fn begin(&self) -> Result<Box<dyn OrderTransaction>, RepositoryError> {
        Ok(Box::new(MemoryTransaction {
            tables: Arc::clone(&self.tables),
            order: None,
            items: Vec::new(),
        }))
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        let tables = self.tables.read();
        Ok(tables
            .orders
            .values()
            .rev()
            .filter(|order| tables.order_visible(order.id, filter))
            .map(|order| tables.hydrate_order(order))
            .collect())
    }

    async fn get_order(
        &self,
        owner: UserId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let tables = self.tables.read();
        Ok(tables
            .orders
            .get(&id)
            .filter(|order| order.user_id == owner)
            .map(|order| tables.hydrate_order(order)))
    }

    async fn list_order_items(
        &self,
        filter: &OrderFilter,
    ) -> Result<Vec<OrderItem>, RepositoryError> {
        let tables = self.tables.read();
        Ok(tables
            .items
            .values()
            .filter(|item| tables.order_visible(item.order_id, filter))
            .cloned()
            .collect())
    }

    async fn get_order_item(
        &self,
        owner: UserId,
        id: OrderItemId,
    ) -> Result<Option<OrderItem>, RepositoryError> {
        let tables = self.tables.read();
        let filter = OrderFilter {
            owner,
            order_ids: None,
        };
        Ok(tables
            .items
            .get(&id)
            .filter(|item| tables.order_visible(item.order_id, &filter))
            .cloned())
    }
}

/// Staged order writes, applied to the shared tables only on commit.
struct MemoryTransaction {
    tables: Arc<RwLock<Tables>>,
    order: Option<Order>,
    items: Vec<OrderItem>,
}

impl MemoryTransaction {
    fn staged_order_mut(&mut self, order_id: OrderId) -> Result<&mut Order, RepositoryError> {
        self.order
            .as_mut()
            .filter(|order| order.id == order_id)
            .ok_or(RepositoryError::NotFound)
    }
}

#[async_trait]
impl OrderTransaction for MemoryTransaction {
    async fn insert_order(&mut self, new: NewOrder) -> Result<Order, RepositoryError> {
        if self.order.is_some() {
            return Err(RepositoryError::Conflict(
                "transaction already holds an order".to_owned(),
            ));
        }

        let id = {
            let mut tables = self.tables.write();
            if tables.tracking_number_taken(&new.tracking_number) {
                return Err(RepositoryError::Conflict(
                    "tracking number already exists".to_owned(),
                ));
            }
            OrderId::new(next(&mut tables.sequences.order))
        };

        let now = Utc::now();
        let order = Order {
            id,
            user_id: new.user_id,
            order_status: OrderStatus::Created,
            payment_mode: new.payment_mode,
            tracking_number: new.tracking_number,
            order_total: None,
            is_paid: false,
            order_date: now,
            updated_date: now,
            shipped_date: None,
            items: Vec::new(),
        };
        self.order = Some(order.clone());
        Ok(order)
    }

    async fn find_product(
        &mut self,
        owner: UserId,
        id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        let tables = self.tables.read();
        Ok(tables
            .products
            .get(&id)
            .filter(|stored| stored.product.user_id == owner)
            .map(|stored| tables.hydrate_product(stored)))
    }

    async fn insert_order_item(
        &mut self,
        new: NewOrderItem,
    ) -> Result<OrderItem, RepositoryError> {
        self.staged_order_mut(new.order_id)?;
        let id = OrderItemId::new(next(&mut self.tables.write().sequences.item));
        let item = OrderItem {
            id,
            order_id: new.order_id,
            product_id: new.product_id,
            quantity: new.quantity,
            item_price: new.item_price,
            discount: new.discount,
            total_price: new.total_price,
        };
        self.items.push(item.clone());
        Ok(item)
    }

    async fn finalize_order_total(
        &mut self,
        order_id: OrderId,
        total: Decimal,
    ) -> Result<(), RepositoryError> {
        let order = self.staged_order_mut(order_id)?;
        order.order_total = Some(total);
        order.updated_date = Utc::now();
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let Self {
            tables,
            order,
            items,
        } = *self;
        let Some(order) = order else {
            return Ok(());
        };

        let mut tables = tables.write();
        if tables.tracking_number_taken(&order.tracking_number) {
            return Err(RepositoryError::Conflict(
                "tracking number already exists".to_owned(),
            ));
        }
        tables.orders.insert(order.id, order);
        for item in items {
            tables.items.insert(item.id, item);
        }
        Ok(())
    }
}
