//! Order repository (`orders`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use marketplace_core::{OrderId, OrderStatus, ProductId, UserId};

use super::{RepositoryError, collections, decode, timestamp, to_fields};
use crate::backend::{CollectionPath, Direction, DocumentSnapshot, DocumentStore, Query};
use crate::models::order::{Order, OrderItem};

// =============================================================================
// Stored Documents
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderDocument {
    user_id: String,
    #[serde(default)]
    order_number: String,
    status: OrderStatus,
    #[serde(default)]
    items: Vec<OrderItemDocument>,
    #[serde(default, with = "rust_decimal::serde::float")]
    total_amount: Decimal,
    #[serde(with = "timestamp")]
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderItemDocument {
    product_id: String,
    #[serde(default)]
    name: String,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
    #[serde(default = "default_quantity")]
    quantity: u32,
    #[serde(default)]
    image: Option<String>,
}

const fn default_quantity() -> u32 {
    1
}

impl From<OrderItemDocument> for OrderItem {
    fn from(doc: OrderItemDocument) -> Self {
        Self {
            product_id: ProductId::new(doc.product_id),
            name: doc.name,
            price: doc.price,
            quantity: doc.quantity,
            image: doc.image,
        }
    }
}

impl From<&OrderItem> for OrderItemDocument {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id.as_str().to_owned(),
            name: item.name.clone(),
            price: item.price,
            quantity: item.quantity,
            image: item.image.clone(),
        }
    }
}

fn into_order(snapshot: &DocumentSnapshot) -> Result<Order, RepositoryError> {
    let doc: OrderDocument = decode(snapshot)?;
    Ok(Order {
        id: OrderId::new(snapshot.id.clone()),
        user_id: UserId::new(doc.user_id),
        order_number: doc.order_number,
        status: doc.status,
        items: doc.items.into_iter().map(OrderItem::from).collect(),
        total_amount: doc.total_amount,
        created_at: doc.created_at,
    })
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for orders.
pub struct OrderRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    fn collection() -> CollectionPath {
        CollectionPath::root(collections::ORDERS)
    }

    /// List a user's orders, newest first, optionally restricted to one status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if an order document is invalid.
    pub async fn list_for_user(
        &self,
        user_id: &UserId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let mut query = Query::new(Self::collection()).where_eq("userId", user_id.as_str());
        if let Some(status) = status {
            query = query.where_eq("status", status.as_str());
        }
        let query = query.order_by("createdAt", Direction::Descending);

        self.store
            .query(&query)
            .await?
            .iter()
            .map(into_order)
            .collect()
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the read fails.
    pub async fn get(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        match self.store.get(&Self::collection().doc(id.as_str())).await? {
            Some(snapshot) => Ok(Some(into_order(&snapshot)?)),
            None => Ok(None),
        }
    }

    /// Write an order under its own ID. Checkout owns order creation; this
    /// exists for seeding and fixtures.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the write fails.
    pub async fn put(&self, order: &Order) -> Result<(), RepositoryError> {
        let document = OrderDocument {
            user_id: order.user_id.as_str().to_owned(),
            order_number: order.order_number.clone(),
            status: order.status,
            items: order.items.iter().map(OrderItemDocument::from).collect(),
            total_amount: order.total_amount,
            created_at: order.created_at,
        };
        self.store
            .set(
                &Self::collection().doc(order.id.as_str()),
                to_fields(&document)?,
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;
    use crate::backend::memory::MemoryDocumentStore;

    fn order(id: &str, user: &str, status: OrderStatus, age_days: i64) -> Order {
        Order {
            id: OrderId::new(id),
            user_id: UserId::new(user),
            order_number: format!("ORD-{id}"),
            status,
            items: vec![OrderItem {
                product_id: ProductId::new("p1"),
                name: "Lamp".into(),
                price: Decimal::new(1999, 2),
                quantity: 2,
                image: None,
            }],
            total_amount: Decimal::new(3998, 2),
            created_at: Utc::now() - Duration::days(age_days),
        }
    }

    #[tokio::test]
    async fn test_list_for_user_newest_first() {
        let store = MemoryDocumentStore::new();
        let orders = OrderRepository::new(&store);
        orders.put(&order("o1", "u1", OrderStatus::Delivered, 3)).await.unwrap();
        orders.put(&order("o2", "u1", OrderStatus::Pending, 1)).await.unwrap();
        orders.put(&order("o3", "u2", OrderStatus::Delivered, 0)).await.unwrap();

        let listed = orders.list_for_user(&UserId::new("u1"), None).await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, ["o2", "o1"]);
        assert_eq!(listed[1].total_amount, Decimal::new(3998, 2));
    }

    #[tokio::test]
    async fn test_list_for_user_with_status() {
        let store = MemoryDocumentStore::new();
        let orders = OrderRepository::new(&store);
        orders.put(&order("o1", "u1", OrderStatus::Delivered, 3)).await.unwrap();
        orders.put(&order("o2", "u1", OrderStatus::Pending, 1)).await.unwrap();

        let delivered = orders
            .list_for_user(&UserId::new("u1"), Some(OrderStatus::Delivered))
            .await
            .unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].id.as_str(), "o1");
    }

    #[tokio::test]
    async fn test_integer_prices_decode() {
        let store = MemoryDocumentStore::new();
        let path = CollectionPath::root(collections::ORDERS).doc("o9");
        store
            .set(
                &path,
                super::super::fields(json!({
                    "userId": "u1",
                    "status": "shipped",
                    "items": [{"productId": "p1", "name": "Mug", "price": 12}],
                    "totalAmount": 12,
                    "createdAt": "2024-01-01T00:00:00.000Z"
                })),
            )
            .await
            .unwrap();

        let order = OrderRepository::new(&store)
            .get(&OrderId::new("o9"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.items[0].price, Decimal::from(12));
        assert_eq!(order.items[0].quantity, 1);
        assert_eq!(order.status, OrderStatus::Shipped);
    }
}
