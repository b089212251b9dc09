//! Order history service.

use tracing::instrument;

use marketplace_core::{OrderId, OrderStatus, UserId};

use crate::backend::Backend;
use crate::db::{OrderRepository, RepositoryError};
use crate::models::Order;

/// Order history service.
pub struct OrderService<'a> {
    orders: OrderRepository<'a>,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub fn new(backend: &'a Backend) -> Self {
        Self {
            orders: OrderRepository::new(backend.documents.as_ref()),
        }
    }

    /// The user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        user_id: &UserId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, RepositoryError> {
        self.orders.list_for_user(user_id, status).await
    }

    /// One of the user's orders.
    ///
    /// Orders of other users are reported as missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist or
    /// belongs to someone else.
    #[instrument(skip(self))]
    pub async fn get_order(
        &self,
        user_id: &UserId,
        order_id: &OrderId,
    ) -> Result<Order, RepositoryError> {
        self.orders
            .get(order_id)
            .await?
            .filter(|order| &order.user_id == user_id)
            .ok_or(RepositoryError::NotFound)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::*;

    #[tokio::test]
    async fn test_get_order_of_other_user_is_not_found() {
        let backend = Backend::in_memory();
        OrderRepository::new(backend.documents.as_ref())
            .put(&Order {
                id: OrderId::new("o1"),
                user_id: UserId::new("owner"),
                order_number: "1001".into(),
                status: OrderStatus::Pending,
                items: vec![],
                total_amount: Decimal::ZERO,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        let service = OrderService::new(&backend);

        assert!(
            service
                .get_order(&UserId::new("owner"), &OrderId::new("o1"))
                .await
                .is_ok()
        );
        assert!(matches!(
            service
                .get_order(&UserId::new("intruder"), &OrderId::new("o1"))
                .await,
            Err(RepositoryError::NotFound)
        ));
    }
}
