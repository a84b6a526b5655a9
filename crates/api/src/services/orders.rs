//! Order placement and owner-scoped order queries.

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use bodegon_core::{
    OrderId, OrderItemId, ProductId, TrackingNumber, compute_item_total, compute_order_total,
    parse_order_ids,
};

use super::{ServiceError, ServiceResult};
use crate::db::{OrderFilter, RepositoryError, Store};
use crate::models::{NewOrder, NewOrderItem, Order, OrderItem, User};

/// Order creation payload as submitted by the client.
///
/// Every field is optional at this level so that missing values surface as
/// field-level validation errors rather than body rejections.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderSubmission {
    pub payment_mode: Option<String>,
    pub order_items: Option<Vec<OrderLine>>,
    pub tracking_number: Option<String>,
}

/// One requested line of an order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderLine {
    pub product: Option<i32>,
    pub quantity: Option<i64>,
}

/// A line that passed validation.
#[derive(Debug, Clone, Copy)]
struct ValidLine {
    product: ProductId,
    quantity: i32,
}

/// A submission that passed validation.
#[derive(Debug)]
struct ValidSubmission {
    payment_mode: String,
    tracking_number: Option<TrackingNumber>,
    lines: Vec<ValidLine>,
}

/// Check the whole submission before anything is written.
fn validate(submission: OrderSubmission) -> ServiceResult<ValidSubmission> {
    let entries = match submission.order_items {
        Some(entries) if !entries.is_empty() => entries,
        _ => {
            return Err(ServiceError::validation(
                "order_items",
                "at least one order item is required",
            ));
        }
    };

    let mut lines = Vec::with_capacity(entries.len());
    for (i, entry) in entries.into_iter().enumerate() {
        let product = entry.product.ok_or_else(|| {
            ServiceError::validation(format!("order_items[{i}].product"), "this field is required")
        })?;
        let quantity = entry.quantity.ok_or_else(|| {
            ServiceError::validation(format!("order_items[{i}].quantity"), "this field is required")
        })?;
        let quantity = i32::try_from(quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or_else(|| {
                ServiceError::validation(
                    format!("order_items[{i}].quantity"),
                    "quantity must be a positive integer",
                )
            })?;
        lines.push(ValidLine {
            product: ProductId::new(product),
            quantity,
        });
    }

    let payment_mode = submission
        .payment_mode
        .map(|mode| mode.trim().to_owned())
        .filter(|mode| !mode.is_empty())
        .ok_or_else(|| ServiceError::validation("payment_mode", "this field is required"))?;

    let tracking_number = submission
        .tracking_number
        .map(|raw| TrackingNumber::parse(&raw))
        .transpose()
        .map_err(|e| ServiceError::validation("tracking_number", e.to_string()))?;

    Ok(ValidSubmission {
        payment_mode,
        tracking_number,
        lines,
    })
}

/// Parse the optional `order=1,2,3` query value.
fn order_filter(user: &User, order_param: Option<&str>) -> ServiceResult<OrderFilter> {
    let order_ids = order_param
        .map(parse_order_ids)
        .transpose()
        .map_err(|segment| {
            ServiceError::validation("order", format!("'{segment}' is not a valid order id"))
        })?;

    Ok(OrderFilter {
        owner: user.id,
        order_ids,
    })
}

/// Order operations for one acting user.
pub struct OrderService<'a> {
    store: &'a dyn Store,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Place an order atomically.
    ///
    /// Either the order, every item and the final total are all stored, or
    /// nothing is. Each item copies the product's current price and discount.
    ///
    /// # Errors
    ///
    /// - `Validation` for malformed input, or a line or order total too large
    ///   to store (nothing written)
    /// - `NotFound` if a product does not exist or belongs to another user
    ///   (transaction rolled back)
    /// - `Conflict` if the tracking number is already in use
    #[instrument(skip(self, user, submission), fields(user_id = %user.id))]
    pub async fn place_order(
        &self,
        user: &User,
        submission: OrderSubmission,
    ) -> ServiceResult<OrderId> {
        let valid = validate(submission)?;

        let mut tx = self.store.begin().await?;
        let order = tx
            .insert_order(NewOrder {
                user_id: user.id,
                payment_mode: valid.payment_mode,
                tracking_number: valid
                    .tracking_number
                    .unwrap_or_else(TrackingNumber::generate),
            })
            .await
            .map_err(conflict_as_service)?;

        let mut totals: Vec<Decimal> = Vec::with_capacity(valid.lines.len());
        for (i, line) in valid.lines.iter().enumerate() {
            // Returning early drops `tx`, discarding the order and prior items.
            let product = tx
                .find_product(user.id, line.product)
                .await?
                .ok_or(ServiceError::NotFound {
                    entity: "product",
                    id: line.product.as_i32(),
                })?;

            let total_price = compute_item_total(product.price, product.discount, line.quantity)
                .map_err(|e| {
                    ServiceError::validation(format!("order_items[{i}].quantity"), e.to_string())
                })?;
            tx.insert_order_item(NewOrderItem {
                order_id: order.id,
                product_id: product.id,
                quantity: line.quantity,
                item_price: product.price,
                discount: product.discount,
                total_price,
            })
            .await?;
            totals.push(total_price);
        }

        let order_total = compute_order_total(totals)
            .map_err(|e| ServiceError::validation("order_items", e.to_string()))?;
        tx.finalize_order_total(order.id, order_total).await?;
        tx.commit().await.map_err(conflict_as_service)?;

        tracing::info!(
            order_id = %order.id,
            items = valid.lines.len(),
            %order_total,
            "Order placed"
        );
        Ok(order.id)
    }

    /// Orders of the acting user, newest first, optionally narrowed by an
    /// `order=1,2,3` list.
    ///
    /// # Errors
    ///
    /// Returns `Validation` on field `order` if an id is not an integer.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn list_orders(&self, user: &User, order_param: Option<&str>) -> ServiceResult<Vec<Order>> {
        let filter = order_filter(user, order_param)?;
        Ok(self.store.list_orders(&filter).await?)
    }

    /// One order of the acting user with its items.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the order does not exist or is not the user's.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn get_order(&self, user: &User, id: OrderId) -> ServiceResult<Order> {
        self.store
            .get_order(user.id, id)
            .await?
            .ok_or(ServiceError::NotFound {
                entity: "order",
                id: id.as_i32(),
            })
    }

    /// Items of the acting user's orders, optionally narrowed by order ids.
    ///
    /// # Errors
    ///
    /// Returns `Validation` on field `order` if an id is not an integer.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn list_items(
        &self,
        user: &User,
        order_param: Option<&str>,
    ) -> ServiceResult<Vec<OrderItem>> {
        let filter = order_filter(user, order_param)?;
        Ok(self.store.list_order_items(&filter).await?)
    }

    /// One item, visible only through an order the user owns.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the item does not exist or is not the user's.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn get_item(&self, user: &User, id: OrderItemId) -> ServiceResult<OrderItem> {
        self.store
            .get_order_item(user.id, id)
            .await?
            .ok_or(ServiceError::NotFound {
                entity: "order item",
                id: id.as_i32(),
            })
    }
}

fn conflict_as_service(e: RepositoryError) -> ServiceError {
    match e {
        RepositoryError::Conflict(msg) => ServiceError::Conflict(msg),
        other => ServiceError::Storage(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{NewProduct, NewUser};
    use bodegon_core::{Discount, Email};

    async fn seed_user(store: &MemoryStore, email: &str) -> User {
        store
            .create_user(NewUser {
                email: Email::parse(email).unwrap(),
                password_hash: "hash".to_owned(),
                name: String::new(),
                is_staff: false,
            })
            .await
            .unwrap()
    }

    async fn seed_product(
        store: &MemoryStore,
        owner: &User,
        price: Decimal,
        discount: Option<i64>,
    ) -> ProductId {
        store
            .create_product(NewProduct {
                user_id: owner.id,
                name: "Ron Cacique".to_owned(),
                description: String::new(),
                price,
                discount: discount.map(|d| Discount::new(Decimal::from(d)).unwrap()),
                weight: "0.70".to_owned(),
                units: "l".to_owned(),
                featured: false,
                category_ids: Vec::new(),
            })
            .await
            .unwrap()
            .id
    }

    fn line(product: ProductId, quantity: i64) -> OrderLine {
        OrderLine {
            product: Some(product.as_i32()),
            quantity: Some(quantity),
        }
    }

    fn submission(lines: Vec<OrderLine>) -> OrderSubmission {
        OrderSubmission {
            payment_mode: Some("Credit Card".to_owned()),
            order_items: Some(lines),
            tracking_number: None,
        }
    }

    fn field_of(err: ServiceError) -> String {
        match err {
            ServiceError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_place_order_totals_items() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "user@bodegonasusalud.com").await;
        let rum = seed_product(&store, &user, Decimal::new(1500, 2), None).await;
        let wine = seed_product(&store, &user, Decimal::from(100), Some(20)).await;

        let service = OrderService::new(&store);
        let id = service
            .place_order(&user, submission(vec![line(rum, 2), line(wine, 3)]))
            .await
            .unwrap();

        let order = service.get_order(&user, id).await.unwrap();
        assert_eq!(order.order_total, Some(Decimal::new(27000, 2)));
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].total_price, Decimal::new(3000, 2));
        assert_eq!(order.items[1].total_price, Decimal::new(24000, 2));
        assert_eq!(order.items[1].item_price, Decimal::from(100));
        assert_eq!(order.payment_mode, "Credit Card");
    }

    #[tokio::test]
    async fn test_foreign_product_rolls_back() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "user@bodegonasusalud.com").await;
        let other = seed_user(&store, "other@bodegonasusalud.com").await;
        let mine = seed_product(&store, &user, Decimal::from(10), None).await;
        let theirs = seed_product(&store, &other, Decimal::from(10), None).await;

        let service = OrderService::new(&store);
        let err = service
            .place_order(&user, submission(vec![line(mine, 1), line(theirs, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::NotFound { entity: "product", id } if id == theirs.as_i32()
        ));

        assert!(service.list_orders(&user, None).await.unwrap().is_empty());
        assert!(service.list_items(&user, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_validation_names_the_field() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "user@bodegonasusalud.com").await;
        let product = seed_product(&store, &user, Decimal::from(10), None).await;
        let service = OrderService::new(&store);

        let err = service.place_order(&user, submission(Vec::new())).await.unwrap_err();
        assert_eq!(field_of(err), "order_items");

        let err = service
            .place_order(&user, submission(vec![line(product, 1), line(product, 0)]))
            .await
            .unwrap_err();
        assert_eq!(field_of(err), "order_items[1].quantity");

        let missing_product = OrderLine {
            product: None,
            quantity: Some(1),
        };
        let err = service
            .place_order(&user, submission(vec![missing_product]))
            .await
            .unwrap_err();
        assert_eq!(field_of(err), "order_items[0].product");

        let mut blank_payment = submission(vec![line(product, 1)]);
        blank_payment.payment_mode = Some("   ".to_owned());
        let err = service.place_order(&user, blank_payment).await.unwrap_err();
        assert_eq!(field_of(err), "payment_mode");

        assert!(service.list_orders(&user, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_supplied_tracking_number_is_kept_and_unique() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "user@bodegonasusalud.com").await;
        let product = seed_product(&store, &user, Decimal::from(10), None).await;
        let service = OrderService::new(&store);

        let mut first = submission(vec![line(product, 1)]);
        first.tracking_number = Some("ABC123XYZ0".to_owned());
        let id = service.place_order(&user, first.clone()).await.unwrap();
        let order = service.get_order(&user, id).await.unwrap();
        assert_eq!(order.tracking_number.as_str(), "ABC123XYZ0");

        let err = service.place_order(&user, first).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_order_filter_and_scoping() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "user@bodegonasusalud.com").await;
        let other = seed_user(&store, "other@bodegonasusalud.com").await;
        let product = seed_product(&store, &user, Decimal::from(10), None).await;
        let service = OrderService::new(&store);

        let a = service.place_order(&user, submission(vec![line(product, 1)])).await.unwrap();
        let b = service.place_order(&user, submission(vec![line(product, 2)])).await.unwrap();
        let c = service.place_order(&user, submission(vec![line(product, 3)])).await.unwrap();

        let ids: Vec<OrderId> = service
            .list_orders(&user, None)
            .await
            .unwrap()
            .iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, vec![c, b, a]);

        let param = format!("{a},{c}");
        let ids: Vec<OrderId> = service
            .list_orders(&user, Some(&param))
            .await
            .unwrap()
            .iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, vec![c, a]);

        let items = service.list_items(&user, Some(&b.to_string())).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);

        assert!(service.list_orders(&other, None).await.unwrap().is_empty());
        assert!(matches!(
            service.get_order(&other, a).await.unwrap_err(),
            ServiceError::NotFound { .. }
        ));
        assert!(matches!(
            service.get_item(&other, items[0].id).await.unwrap_err(),
            ServiceError::NotFound { .. }
        ));

        let err = service.list_orders(&user, Some("1,x")).await.unwrap_err();
        assert_eq!(field_of(err), "order");
    }
}
