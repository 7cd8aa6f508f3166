//! Order workflow service.
//!
//! Authorizes the caller, applies request-level rules and delegates the unit
//! of work to the store. Mutations run on their own task so a dropped request
//! never abandons an open transaction.

use std::future::Future;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::OrdersConfig;
use crate::domain::{
    check_cart_shape, Identity, NewOrder, Order, OrderStatus, PaymentStatus,
};
use crate::error::{OrderError, Result};
use crate::interfaces::{OrderFilter, OrderPage, OrderStats, OrderStore};

/// Listing request as supplied by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOrders {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Order workflow entry point shared by all transports.
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    orders: OrdersConfig,
}

fn require_admin(caller: &Identity) -> Result<()> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(OrderError::Forbidden(
            "Only administrators may perform this action".to_string(),
        ))
    }
}

fn log_failure(action: &'static str, err: &OrderError) {
    if err.is_rejection() {
        warn!(action, error = %err, "Order request rejected");
    } else {
        error!(action, error = %err, "Order request failed");
    }
}

/// Run a store mutation to completion on its own task.
async fn detached<T, F>(action: &'static str, work: F) -> Result<T>
where
    T: Send + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
{
    let result = tokio::spawn(work)
        .await
        .map_err(|e| OrderError::Persistence(format!("{action} task failed: {e}")))
        .and_then(|result| result);
    if let Err(e) = &result {
        log_failure(action, e);
    }
    result
}

impl OrderService {
    pub fn new(store: Arc<dyn OrderStore>, orders: OrdersConfig) -> Self {
        Self { store, orders }
    }

    /// Resolve a gateway-supplied user id to an identity.
    ///
    /// Unknown and deactivated accounts are rejected.
    pub async fn authenticate(&self, user_id: i64) -> Result<Identity> {
        match self.store.find_user(user_id).await? {
            Some(user) if user.is_active => Ok(Identity::from(&user)),
            Some(_) => Err(OrderError::Unauthorized(
                "User account is deactivated".to_string(),
            )),
            None => Err(OrderError::Unauthorized("User not found".to_string())),
        }
    }

    /// Place an order for the caller.
    #[tracing::instrument(name = "order.place", skip_all, fields(user_id = caller.user_id, lines = order.items.len()))]
    pub async fn place_order(&self, caller: Identity, order: NewOrder) -> Result<Order> {
        if let Err(e) = check_cart_shape(&order.items) {
            log_failure("place", &e);
            return Err(e);
        }

        let store = Arc::clone(&self.store);
        let placed = detached("place", async move {
            store.place_order(order.for_user(caller.user_id)).await
        })
        .await?;

        info!(
            order_id = placed.id,
            order_number = %placed.order_number,
            total_amount = %placed.total_amount,
            "Order placed"
        );
        Ok(placed)
    }

    /// Fetch one order; other users' orders look like missing ones.
    #[tracing::instrument(name = "order.get", skip_all, fields(user_id = caller.user_id, order_id = order_id))]
    pub async fn get_order(&self, caller: Identity, order_id: i64) -> Result<Order> {
        self.store
            .get_order(order_id, caller.scope())
            .await?
            .ok_or(OrderError::OrderNotFound)
    }

    /// List orders visible to the caller, newest first.
    #[tracing::instrument(name = "order.list", skip_all, fields(user_id = caller.user_id))]
    pub async fn list_orders(&self, caller: Identity, query: ListOrders) -> Result<OrderPage> {
        let mut filter = OrderFilter::new(
            caller.scope(),
            query.page.unwrap_or(1),
            self.orders.page_size(query.limit),
        );
        filter.status = query.status;
        filter.payment_status = query.payment_status;

        self.store.list_orders(&filter).await
    }

    /// Cancel an order and return its stock.
    #[tracing::instrument(name = "order.cancel", skip_all, fields(user_id = caller.user_id, order_id = order_id))]
    pub async fn cancel_order(&self, caller: Identity, order_id: i64) -> Result<Order> {
        let store = Arc::clone(&self.store);
        let scope = caller.scope();
        let cancelled = detached("cancel", async move {
            store.cancel_order(order_id, scope).await
        })
        .await?;

        info!(
            order_id,
            order_number = %cancelled.order_number,
            "Order cancelled, stock restored"
        );
        Ok(cancelled)
    }

    #[tracing::instrument(name = "order.update_status", skip_all, fields(user_id = caller.user_id, order_id = order_id, status = %status))]
    pub async fn update_status(
        &self,
        caller: Identity,
        order_id: i64,
        status: OrderStatus,
    ) -> Result<Order> {
        require_admin(&caller)?;

        let store = Arc::clone(&self.store);
        let updated = detached("update_status", async move {
            store.update_status(order_id, status).await
        })
        .await?;

        info!(order_id, status = %updated.status, "Order status updated");
        Ok(updated)
    }

    #[tracing::instrument(name = "order.update_payment", skip_all, fields(user_id = caller.user_id, order_id = order_id, payment_status = %status))]
    pub async fn update_payment_status(
        &self,
        caller: Identity,
        order_id: i64,
        status: PaymentStatus,
    ) -> Result<Order> {
        require_admin(&caller)?;

        let store = Arc::clone(&self.store);
        let updated = detached("update_payment", async move {
            store.update_payment_status(order_id, status).await
        })
        .await?;

        info!(order_id, payment_status = %updated.payment_status, "Payment status updated");
        Ok(updated)
    }

    #[tracing::instrument(name = "order.stats", skip_all, fields(user_id = caller.user_id))]
    pub async fn stats(&self, caller: Identity) -> Result<OrderStats> {
        require_admin(&caller)?;
        self.store.stats().await
    }
}
