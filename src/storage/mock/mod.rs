//! Mock storage implementation for testing.
//!
//! Every operation holds the state lock for its whole duration, so each
//! mutation is applied all-or-nothing just like a SQL transaction.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::{
    check_cart_shape, price_line, require_product, CustomerSummary, Order, OrderItem,
    OrderScope, OrderStatus, PaymentStatus, PlaceOrder, PricedCart, Product, User,
};
use crate::error::{OrderError, Result};
use crate::interfaces::{
    CatalogReader, CatalogWriter, NewCategory, NewProduct, NewUser, OrderFilter, OrderPage,
    OrderStats, OrderStore, UserDirectory,
};
use crate::storage::schema::timestamp;
use crate::utils::order_number::format_order_number;

#[derive(Default)]
struct MockState {
    users: BTreeMap<i64, User>,
    categories: BTreeMap<i64, NewCategory>,
    products: BTreeMap<i64, Product>,
    orders: BTreeMap<i64, Order>,
    next_id: i64,
    next_item_id: i64,
}

impl MockState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Orders are returned with fresh customer and product summaries.
    fn hydrate(&self, order: &Order) -> Order {
        let mut order = order.clone();
        order.customer = self.users.get(&order.user_id).map(|user| CustomerSummary {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
        });
        for item in &mut order.items {
            item.product = self.products.get(&item.product_id).map(Product::summary);
        }
        order
    }

    fn cancel(&mut self, order_id: i64) -> Result<()> {
        let now = timestamp(Utc::now());
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or(OrderError::OrderNotFound)?;
        order.status = OrderStatus::Cancelled;
        order.updated_at = now;

        let returns: Vec<(i64, u32)> = order
            .items
            .iter()
            .map(|item| (item.product_id, item.quantity))
            .collect();
        for (product_id, quantity) in returns {
            if let Some(product) = self.products.get_mut(&product_id) {
                product.stock += i64::from(quantity);
            }
        }
        Ok(())
    }
}

/// Mock order store that keeps users, catalog and orders in memory.
#[derive(Default)]
pub struct MockOrderStore {
    state: RwLock<MockState>,
    fail_on_write: RwLock<bool>,
}

impl MockOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every mutating operation fail with a persistence error.
    pub async fn set_fail_on_write(&self, fail: bool) {
        *self.fail_on_write.write().await = fail;
    }

    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    pub async fn stock_of(&self, product_id: i64) -> Option<i64> {
        self.state
            .read()
            .await
            .products
            .get(&product_id)
            .map(|product| product.stock)
    }

    async fn check_write(&self) -> Result<()> {
        if *self.fail_on_write.read().await {
            return Err(OrderError::Persistence("mock write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogReader for MockOrderStore {
    async fn get_product(&self, product_id: i64) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&product_id).cloned())
    }
}

#[async_trait]
impl UserDirectory for MockOrderStore {
    async fn find_user(&self, user_id: i64) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }
}

#[async_trait]
impl CatalogWriter for MockOrderStore {
    async fn insert_user(&self, user: NewUser) -> Result<i64> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(OrderError::Persistence(format!(
                "duplicate email {}",
                user.email
            )));
        }
        let id = state.allocate_id();
        state.users.insert(
            id,
            User {
                id,
                name: user.name,
                email: user.email,
                role: user.role,
                phone: user.phone,
                is_active: user.is_active,
            },
        );
        Ok(id)
    }

    async fn insert_category(&self, category: NewCategory) -> Result<i64> {
        let mut state = self.state.write().await;
        let id = state.allocate_id();
        state.categories.insert(id, category);
        Ok(id)
    }

    async fn insert_product(&self, product: NewProduct) -> Result<i64> {
        let mut state = self.state.write().await;
        if !state.categories.contains_key(&product.category_id) {
            return Err(OrderError::Persistence(format!(
                "unknown category {}",
                product.category_id
            )));
        }
        let id = state.allocate_id();
        state.products.insert(
            id,
            Product {
                id,
                name: product.name,
                price: product.price,
                discount: product.discount,
                stock: product.stock,
                unit: product.unit,
                image_url: product.image_url,
                is_available: product.is_available,
            },
        );
        Ok(id)
    }

    async fn product_count(&self) -> Result<u64> {
        Ok(self.state.read().await.products.len() as u64)
    }
}

#[async_trait]
impl OrderStore for MockOrderStore {
    async fn place_order(&self, order: PlaceOrder) -> Result<Order> {
        self.check_write().await?;
        check_cart_shape(&order.items)?;

        let mut state = self.state.write().await;
        let mut staged = state.products.clone();
        let mut cart = PricedCart::default();

        for line in &order.items {
            let product = require_product(line, staged.get(&line.product_id).cloned())?;
            let priced = price_line(line, &product)?;
            if let Some(stored) = staged.get_mut(&line.product_id) {
                stored.stock -= i64::from(line.quantity);
            }
            cart.push(priced)?;
        }

        let now = Utc::now();
        let created_at = timestamp(now);
        let id = state.allocate_id();
        let order_number = format_order_number(now, (id % 10_000) as u16);

        let mut items = Vec::with_capacity(cart.lines.len());
        for line in &cart.lines {
            state.next_item_id += 1;
            items.push(OrderItem {
                id: state.next_item_id,
                order_id: id,
                product_id: line.product_id,
                quantity: line.quantity,
                price: line.price,
                subtotal: line.subtotal,
                product: None,
            });
        }

        let stored = Order {
            id,
            user_id: order.user_id,
            order_number,
            total_amount: cart.total,
            status: OrderStatus::Pending,
            payment_method: order.payment_method,
            payment_status: PaymentStatus::Unpaid,
            shipping_address: order.shipping_address,
            notes: order.notes,
            order_date: created_at.clone(),
            created_at: created_at.clone(),
            updated_at: created_at,
            customer: None,
            items,
        };

        state.products = staged;
        state.orders.insert(id, stored.clone());
        Ok(state.hydrate(&stored))
    }

    async fn get_order(&self, order_id: i64, scope: OrderScope) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .get(&order_id)
            .filter(|order| scope.admits(order))
            .map(|order| state.hydrate(order)))
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<OrderPage> {
        let state = self.state.read().await;
        let matching: Vec<&Order> = state
            .orders
            .values()
            .rev()
            .filter(|order| filter.matches(order))
            .collect();

        let count = matching.len() as u64;
        let orders = matching
            .into_iter()
            .skip(usize::try_from(filter.offset()).unwrap_or(usize::MAX))
            .take(filter.limit as usize)
            .map(|order| state.hydrate(order))
            .collect();

        Ok(OrderPage::new(orders, count, filter))
    }

    async fn cancel_order(&self, order_id: i64, scope: OrderScope) -> Result<Order> {
        self.check_write().await?;
        let mut state = self.state.write().await;

        let status = state
            .orders
            .get(&order_id)
            .filter(|order| scope.admits(order))
            .map(|order| order.status)
            .ok_or(OrderError::OrderNotFound)?;
        if !status.is_cancellable() {
            return Err(OrderError::InvalidState(format!(
                "Order with status {status} cannot be cancelled"
            )));
        }

        state.cancel(order_id)?;
        let order = state.orders.get(&order_id).ok_or(OrderError::OrderNotFound)?;
        Ok(state.hydrate(order))
    }

    async fn update_status(&self, order_id: i64, status: OrderStatus) -> Result<Order> {
        self.check_write().await?;
        let mut state = self.state.write().await;

        let current = state
            .orders
            .get(&order_id)
            .map(|order| order.status)
            .ok_or(OrderError::OrderNotFound)?;
        if !current.can_transition_to(status) {
            return Err(OrderError::InvalidState(format!(
                "Cannot change order status from {current} to {status}"
            )));
        }

        if status == OrderStatus::Cancelled {
            state.cancel(order_id)?;
        } else if let Some(order) = state.orders.get_mut(&order_id) {
            order.status = status;
            order.updated_at = timestamp(Utc::now());
        }

        let order = state.orders.get(&order_id).ok_or(OrderError::OrderNotFound)?;
        Ok(state.hydrate(order))
    }

    async fn update_payment_status(&self, order_id: i64, status: PaymentStatus) -> Result<Order> {
        self.check_write().await?;
        let mut state = self.state.write().await;

        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or(OrderError::OrderNotFound)?;
        if !order.payment_status.can_transition_to(status) {
            return Err(OrderError::InvalidState(format!(
                "Cannot change payment status from {} to {}",
                order.payment_status, status
            )));
        }
        order.payment_status = status;
        order.updated_at = timestamp(Utc::now());

        let order = state.orders.get(&order_id).ok_or(OrderError::OrderNotFound)?;
        Ok(state.hydrate(order))
    }

    async fn stats(&self) -> Result<OrderStats> {
        let state = self.state.read().await;
        let mut stats = OrderStats::default();
        for order in state.orders.values() {
            stats.record_status(order.status, 1);
            if order.payment_status == PaymentStatus::Paid
                && order.status != OrderStatus::Cancelled
            {
                stats.total_revenue = stats
                    .total_revenue
                    .checked_add(order.total_amount)
                    .ok_or_else(|| OrderError::Persistence("revenue total overflowed".to_string()))?;
            }
        }
        Ok(stats)
    }
}
