//! Order persistence interface.
//!
//! Every mutating operation is one atomic unit of work: stock changes and
//! order rows are committed together or not at all.

use async_trait::async_trait;
use serde::Serialize;

use super::catalog::{CatalogReader, UserDirectory};
use crate::domain::{Money, Order, OrderScope, OrderStatus, PaymentStatus, PlaceOrder};
use crate::error::Result;

/// Filters and paging for order listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderFilter {
    pub scope: OrderScope,
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
}

impl OrderFilter {
    pub fn new(scope: OrderScope, page: u32, limit: u32) -> Self {
        Self {
            scope,
            status: None,
            payment_status: None,
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// Whether an order passes the scope and exact-match filters.
    pub fn matches(&self, order: &Order) -> bool {
        self.scope.admits(order)
            && self.status.is_none_or(|status| status == order.status)
            && self
                .payment_status
                .is_none_or(|status| status == order.payment_status)
    }
}

/// One page of orders plus the total match count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub count: u64,
    pub page: u32,
    pub total_pages: u64,
}

impl OrderPage {
    pub fn new(orders: Vec<Order>, count: u64, filter: &OrderFilter) -> Self {
        Self {
            orders,
            count,
            page: filter.page,
            total_pages: count.div_ceil(u64::from(filter.limit)),
        }
    }
}

/// Aggregate order counts and revenue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: u64,
    pub pending_orders: u64,
    pub processing_orders: u64,
    pub shipped_orders: u64,
    pub delivered_orders: u64,
    pub cancelled_orders: u64,
    /// Sum of `total_amount` over paid, non-cancelled orders.
    pub total_revenue: Money,
}

impl OrderStats {
    pub fn record_status(&mut self, status: OrderStatus, count: u64) {
        self.total_orders += count;
        let slot = match status {
            OrderStatus::Pending => &mut self.pending_orders,
            OrderStatus::Processing => &mut self.processing_orders,
            OrderStatus::Shipped => &mut self.shipped_orders,
            OrderStatus::Delivered => &mut self.delivered_orders,
            OrderStatus::Cancelled => &mut self.cancelled_orders,
        };
        *slot += count;
    }
}

/// Interface for order persistence.
///
/// Implementations:
/// - `SqliteOrderStore`: SQLite storage
/// - `PostgresOrderStore`: PostgreSQL storage
/// - `MockOrderStore`: in-memory, for tests
#[async_trait]
pub trait OrderStore: CatalogReader + UserDirectory {
    /// Validate, price and persist a cart, reserving stock for every line.
    ///
    /// Lines are validated in input order and the first failure rejects the
    /// whole cart with nothing persisted. Returns the hydrated order.
    async fn place_order(&self, order: PlaceOrder) -> Result<Order>;

    /// Fetch a hydrated order visible within `scope`.
    ///
    /// Returns `None` if the order does not exist or is out of scope.
    async fn get_order(&self, order_id: i64, scope: OrderScope) -> Result<Option<Order>>;

    /// List orders newest first.
    async fn list_orders(&self, filter: &OrderFilter) -> Result<OrderPage>;

    /// Restore stock for every item and mark the order cancelled.
    ///
    /// Orders outside `scope` report `OrderNotFound`; delivered or cancelled
    /// orders report `InvalidState`.
    async fn cancel_order(&self, order_id: i64, scope: OrderScope) -> Result<Order>;

    /// Apply an administrative status transition.
    ///
    /// Moving to `cancelled` restores stock the same way `cancel_order` does.
    async fn update_status(&self, order_id: i64, status: OrderStatus) -> Result<Order>;

    /// Apply an administrative payment status transition.
    async fn update_payment_status(&self, order_id: i64, status: PaymentStatus) -> Result<Order>;

    async fn stats(&self) -> Result<OrderStats>;
}
