//! `PostgreSQL` [`Store`] adapter.
//!
//! Queries are built at runtime (`query_as` + `FromRow`) so the crate
//! compiles without a live database.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use bodegon_core::{
    CategoryId, Discount, Email, OrderId, OrderItemId, OrderStatus, ProductId, TrackingNumber,
    UserId,
};

use super::{OrderFilter, OrderTransaction, ProductFilter, RepositoryError, Store};
use crate::models::{
    Category, NewCategory, NewOrder, NewOrderItem, NewProduct, NewUser, Order, OrderItem,
    Product, ProductPatch, User, UserPatch,
};

macro_rules! user_columns {
    () => {
        "id, email, name, address, city, state, zip, phone, id_type, id_number, \
         is_active, is_staff, created_at, updated_at"
    };
}

macro_rules! product_columns {
    () => {
        "id, user_id, name, description, price, discount, weight, units, featured, image"
    };
}

macro_rules! order_columns {
    () => {
        "id, user_id, order_status, payment_mode, tracking_number, order_total, is_paid, \
         order_date, updated_date, shipped_date"
    };
}

macro_rules! item_columns {
    () => {
        "i.id, i.order_id, i.product_id, i.quantity, i.item_price, i.discount, i.total_price"
    };
}

// =============================================================================
// Row types
// =============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    name: String,
    address: String,
    city: String,
    state: String,
    zip: String,
    phone: String,
    id_type: String,
    id_number: String,
    is_active: bool,
    is_staff: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&r.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(r.id),
            email,
            name: r.name,
            address: r.address,
            city: r.city,
            state: r.state,
            zip: r.zip,
            phone: r.phone,
            id_type: r.id_type,
            id_number: r.id_number,
            is_active: r.is_active,
            is_staff: r.is_staff,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserWithPasswordRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    user_id: i32,
}

impl From<CategoryRow> for Category {
    fn from(r: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(r.id),
            name: r.name,
            user_id: UserId::new(r.user_id),
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProductCategoryRow {
    product_id: i32,
    #[sqlx(flatten)]
    category: CategoryRow,
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    user_id: i32,
    name: String,
    description: String,
    price: Decimal,
    discount: Option<Decimal>,
    weight: String,
    units: String,
    featured: bool,
    image: Option<String>,
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    order_status: OrderStatus,
    payment_mode: String,
    tracking_number: String,
    order_total: Option<Decimal>,
    is_paid: bool,
    order_date: DateTime<Utc>,
    updated_date: DateTime<Utc>,
    shipped_date: Option<DateTime<Utc>>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let tracking_number = TrackingNumber::parse(&self.tracking_number).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid tracking number in database: {e}"))
        })?;

        Ok(Order {
            id: OrderId::new(self.id),
            user_id: UserId::new(self.user_id),
            order_status: self.order_status,
            payment_mode: self.payment_mode,
            tracking_number,
            order_total: self.order_total,
            is_paid: self.is_paid,
            order_date: self.order_date,
            updated_date: self.updated_date,
            shipped_date: self.shipped_date,
            items,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    quantity: i32,
    item_price: Decimal,
    discount: Option<Decimal>,
    total_price: Decimal,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(r: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: OrderItemId::new(r.id),
            order_id: OrderId::new(r.order_id),
            product_id: ProductId::new(r.product_id),
            quantity: r.quantity,
            item_price: r.item_price,
            discount: decode_discount(r.discount)?,
            total_price: r.total_price,
        })
    }
}

fn decode_discount(value: Option<Decimal>) -> Result<Option<Discount>, RepositoryError> {
    value
        .map(Discount::new)
        .transpose()
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid discount in database: {e}")))
}

/// Map unique violations to `Conflict`, everything else to `Database`.
fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

fn raw_ids<T: Copy + Into<i32>>(ids: &[T]) -> Vec<i32> {
    ids.iter().map(|id| (*id).into()).collect()
}

// =============================================================================
// Shared loaders (pool connections and transactions)
// =============================================================================

/// Join categories onto product rows, preserving row order.
async fn attach_categories(
    conn: &mut PgConnection,
    rows: Vec<ProductRow>,
) -> Result<Vec<Product>, RepositoryError> {
    let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
    let links = sqlx::query_as::<_, ProductCategoryRow>(
        r"
        SELECT pc.product_id, c.id, c.name, c.user_id
        FROM product_category pc
        JOIN category c ON c.id = pc.category_id
        WHERE pc.product_id = ANY($1)
        ORDER BY c.id
        ",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut by_product: HashMap<i32, Vec<Category>> = HashMap::new();
    for link in links {
        by_product
            .entry(link.product_id)
            .or_default()
            .push(link.category.into());
    }

    rows.into_iter()
        .map(|r| {
            Ok(Product {
                id: ProductId::new(r.id),
                user_id: UserId::new(r.user_id),
                name: r.name,
                description: r.description,
                price: r.price,
                discount: decode_discount(r.discount)?,
                weight: r.weight,
                units: r.units,
                featured: r.featured,
                image: r.image,
                categories: by_product.remove(&r.id).unwrap_or_default(),
            })
        })
        .collect()
}

async fn load_owned_product(
    conn: &mut PgConnection,
    owner: UserId,
    id: ProductId,
) -> Result<Option<Product>, RepositoryError> {
    let row = sqlx::query_as::<_, ProductRow>(concat!(
        "SELECT ",
        product_columns!(),
        " FROM product WHERE id = $1 AND user_id = $2"
    ))
    .bind(id.as_i32())
    .bind(owner.as_i32())
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => Ok(attach_categories(conn, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

async fn replace_product_categories(
    conn: &mut PgConnection,
    product_id: i32,
    category_ids: &[CategoryId],
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM product_category WHERE product_id = $1")
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        r"
        INSERT INTO product_category (product_id, category_id)
        SELECT $1, UNNEST($2::int4[])
        ON CONFLICT DO NOTHING
        ",
    )
    .bind(product_id)
    .bind(raw_ids(category_ids))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn attach_items(
    conn: &mut PgConnection,
    rows: Vec<OrderRow>,
) -> Result<Vec<Order>, RepositoryError> {
    let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
    let item_rows = sqlx::query_as::<_, OrderItemRow>(concat!(
        "SELECT ",
        item_columns!(),
        " FROM order_item i WHERE i.order_id = ANY($1) ORDER BY i.id"
    ))
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut by_order: HashMap<i32, Vec<OrderItem>> = HashMap::new();
    for row in item_rows {
        let order_id = row.order_id;
        by_order.entry(order_id).or_default().push(row.try_into()?);
    }

    rows.into_iter()
        .map(|r| {
            let items = by_order.remove(&r.id).unwrap_or_default();
            r.into_order(items)
        })
        .collect()
}

// =============================================================================
// Store
// =============================================================================

/// sqlx-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, new: NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(concat!(
            "INSERT INTO app_user (email, password_hash, name, is_staff) VALUES ($1, $2, $3, $4) RETURNING ",
            user_columns!()
        ))
        .bind(new.email.as_str())
        .bind(&new.password_hash)
        .bind(&new.name)
        .bind(new.is_staff)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?;

        row.try_into()
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM app_user WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn get_user_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithPasswordRow>(concat!(
            "SELECT ",
            user_columns!(),
            ", password_hash FROM app_user WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(r) = row else {
            return Ok(None);
        };
        Ok(Some((r.user.try_into()?, r.password_hash)))
    }

    async fn update_user(&self, id: UserId, patch: UserPatch) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(concat!(
            r"
            UPDATE app_user SET
                name = COALESCE($2, name),
                password_hash = COALESCE($3, password_hash),
                address = COALESCE($4, address),
                city = COALESCE($5, city),
                state = COALESCE($6, state),
                zip = COALESCE($7, zip),
                phone = COALESCE($8, phone),
                id_type = COALESCE($9, id_type),
                id_number = COALESCE($10, id_number),
                updated_at = NOW()
            WHERE id = $1
            RETURNING ",
            user_columns!()
        ))
        .bind(id.as_i32())
        .bind(patch.name)
        .bind(patch.password_hash)
        .bind(patch.address)
        .bind(patch.city)
        .bind(patch.state)
        .bind(patch.zip)
        .bind(patch.phone)
        .bind(patch.id_type)
        .bind(patch.id_number)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    async fn get_token(&self, user_id: UserId) -> Result<Option<String>, RepositoryError> {
        let key = sqlx::query_scalar::<_, String>("SELECT key FROM auth_token WHERE user_id = $1")
            .bind(user_id.as_i32())
            .fetch_optional(&self.pool)
            .await?;
        Ok(key)
    }

    async fn create_token(&self, user_id: UserId, key: &str) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO auth_token (key, user_id) VALUES ($1, $2)")
            .bind(key)
            .bind(user_id.as_i32())
            .execute(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "token"))?;
        Ok(())
    }

    async fn get_user_by_token(&self, key: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM app_user WHERE id = (SELECT user_id FROM auth_token WHERE key = $1)"
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn create_category(&self, new: NewCategory) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "INSERT INTO category (user_id, name) VALUES ($1, $2) RETURNING id, name, user_id",
        )
        .bind(new.user_id.as_i32())
        .bind(&new.name)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, user_id FROM category ORDER BY name DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn get_categories(&self, ids: &[CategoryId]) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, user_id FROM category WHERE id = ANY($1) ORDER BY id",
        )
        .bind(raw_ids(ids))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn create_product(&self, new: NewProduct) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, i32>(
            r"
            INSERT INTO product (user_id, name, description, price, discount, weight, units, featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            ",
        )
        .bind(new.user_id.as_i32())
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price)
        .bind(new.discount.map(Discount::percent))
        .bind(&new.weight)
        .bind(&new.units)
        .bind(new.featured)
        .fetch_one(&mut *tx)
        .await?;

        replace_product_categories(&mut tx, id, &new.category_ids).await?;
        let product = load_owned_product(&mut tx, new.user_id, ProductId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;
        Ok(product)
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query_as::<_, ProductRow>(concat!(
            "SELECT ",
            product_columns!(),
            r"
            FROM product p
            WHERE p.user_id = $1
              AND ($2::text IS NULL OR EXISTS (
                  SELECT 1
                  FROM product_category pc
                  JOIN category c ON c.id = pc.category_id
                  WHERE pc.product_id = p.id AND LOWER(c.name) = LOWER($2)
              ))
            ORDER BY p.id DESC
            "
        ))
        .bind(filter.owner.as_i32())
        .bind(filter.category.as_deref())
        .fetch_all(&mut *conn)
        .await?;

        attach_categories(&mut conn, rows).await
    }

    async fn get_product(
        &self,
        owner: UserId,
        id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        load_owned_product(&mut conn, owner, id).await
    }

    async fn update_product(
        &self,
        owner: UserId,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_scalar::<_, i32>(
            r"
            UPDATE product SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                price = COALESCE($5, price),
                discount = CASE WHEN $6 THEN $7 ELSE discount END,
                weight = COALESCE($8, weight),
                units = COALESCE($9, units),
                featured = COALESCE($10, featured)
            WHERE id = $1 AND user_id = $2
            RETURNING id
            ",
        )
        .bind(id.as_i32())
        .bind(owner.as_i32())
        .bind(patch.name)
        .bind(patch.description)
        .bind(patch.price)
        .bind(patch.discount.is_some())
        .bind(patch.discount.flatten().map(Discount::percent))
        .bind(patch.weight)
        .bind(patch.units)
        .bind(patch.featured)
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_none() {
            return Ok(None);
        }

        if let Some(category_ids) = patch.category_ids {
            replace_product_categories(&mut tx, id.as_i32(), &category_ids).await?;
        }

        let product = load_owned_product(&mut tx, owner, id).await?;
        tx.commit().await?;
        Ok(product)
    }

    async fn set_product_image(
        &self,
        owner: UserId,
        id: ProductId,
        image: &str,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let updated = sqlx::query_scalar::<_, i32>(
            "UPDATE product SET image = $3 WHERE id = $1 AND user_id = $2 RETURNING id",
        )
        .bind(id.as_i32())
        .bind(owner.as_i32())
        .bind(image)
        .fetch_optional(&mut *conn)
        .await?;

        if updated.is_none() {
            return Ok(None);
        }
        load_owned_product(&mut conn, owner, id).await
    }

    async fn begin(&self) -> Result<Box<dyn OrderTransaction>, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgOrderTransaction { tx }))
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query_as::<_, OrderRow>(concat!(
            "SELECT ",
            order_columns!(),
            r"
            FROM customer_order
            WHERE user_id = $1 AND ($2::int4[] IS NULL OR id = ANY($2))
            ORDER BY id DESC
            "
        ))
        .bind(filter.owner.as_i32())
        .bind(filter.order_ids.as_deref().map(raw_ids))
        .fetch_all(&mut *conn)
        .await?;

        attach_items(&mut conn, rows).await
    }

    async fn get_order(
        &self,
        owner: UserId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query_as::<_, OrderRow>(concat!(
            "SELECT ",
            order_columns!(),
            " FROM customer_order WHERE id = $1 AND user_id = $2"
        ))
        .bind(id.as_i32())
        .bind(owner.as_i32())
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(row) => Ok(attach_items(&mut conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_order_items(
        &self,
        filter: &OrderFilter,
    ) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(concat!(
            "SELECT ",
            item_columns!(),
            r"
            FROM order_item i
            JOIN customer_order o ON o.id = i.order_id
            WHERE o.user_id = $1 AND ($2::int4[] IS NULL OR i.order_id = ANY($2))
            ORDER BY i.id
            "
        ))
        .bind(filter.owner.as_i32())
        .bind(filter.order_ids.as_deref().map(raw_ids))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(OrderItem::try_from).collect()
    }

    async fn get_order_item(
        &self,
        owner: UserId,
        id: OrderItemId,
    ) -> Result<Option<OrderItem>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderItemRow>(concat!(
            "SELECT ",
            item_columns!(),
            r"
            FROM order_item i
            JOIN customer_order o ON o.id = i.order_id
            WHERE i.id = $1 AND o.user_id = $2
            "
        ))
        .bind(id.as_i32())
        .bind(owner.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        row.map(OrderItem::try_from).transpose()
    }
}

// =============================================================================
// Order transaction
// =============================================================================

/// Wraps a sqlx transaction; sqlx rolls back on drop unless committed.
struct PgOrderTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl OrderTransaction for PgOrderTransaction {
    async fn insert_order(&mut self, new: NewOrder) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(concat!(
            r"
            INSERT INTO customer_order (user_id, payment_mode, tracking_number)
            VALUES ($1, $2, $3)
            RETURNING ",
            order_columns!()
        ))
        .bind(new.user_id.as_i32())
        .bind(&new.payment_mode)
        .bind(new.tracking_number.as_str())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| conflict_on_unique(e, "tracking number"))?;

        row.into_order(Vec::new())
    }

    async fn find_product(
        &mut self,
        owner: UserId,
        id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        load_owned_product(&mut self.tx, owner, id).await
    }

    async fn insert_order_item(
        &mut self,
        new: NewOrderItem,
    ) -> Result<OrderItem, RepositoryError> {
        let row = sqlx::query_as::<_, OrderItemRow>(
            r"
            INSERT INTO order_item AS i
                (order_id, product_id, quantity, item_price, discount, total_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING i.id, i.order_id, i.product_id, i.quantity, i.item_price, i.discount, i.total_price
            ",
        )
        .bind(new.order_id.as_i32())
        .bind(new.product_id.as_i32())
        .bind(new.quantity)
        .bind(new.item_price)
        .bind(new.discount.map(Discount::percent))
        .bind(new.total_price)
        .fetch_one(&mut *self.tx)
        .await?;

        row.try_into()
    }

    async fn finalize_order_total(
        &mut self,
        order_id: OrderId,
        total: Decimal,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE customer_order SET order_total = $2, updated_date = NOW() WHERE id = $1",
        )
        .bind(order_id.as_i32())
        .bind(total)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}
