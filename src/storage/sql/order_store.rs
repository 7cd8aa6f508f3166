//! Unified SQL OrderStore implementation.
//!
//! Uses a macro to generate implementations for each SQL backend,
//! eliminating code duplication while maintaining type safety.
//!
//! Each operation acquires one pooled connection and runs everything on it:
//! the transaction, and afterwards the read that hydrates the result.

use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_query::{
    Alias, Expr, Func, OnConflict, Order as SortOrder, Query, SelectStatement, UpdateStatement,
};
use tracing::{debug, warn};

use super::SqlDatabase;
use crate::domain::{
    check_cart_shape, price_line, require_product, DiscountRate, Money, OrderScope, OrderStatus,
    PaymentStatus, PlaceOrder, PricedCart, PricedLine, UnknownValue,
};
use crate::error::{OrderError, Result};
use crate::interfaces::OrderFilter;
use crate::storage::schema::{timestamp, Categories, OrderItems, Orders, Products, Users};
use crate::utils::order_number::{OrderNumbers, RandomOrderNumbers};

/// How many order numbers are drawn before placement gives up.
pub const DEFAULT_ORDER_NUMBER_ATTEMPTS: u32 = 5;

/// SQL-based implementation of OrderStore.
///
/// This generic implementation works with any SQL database that implements
/// the `SqlDatabase` trait (PostgreSQL, SQLite).
pub struct SqlOrderStore<DB: SqlDatabase> {
    pool: DB::Pool,
    numbers: Arc<dyn OrderNumbers>,
    order_number_attempts: u32,
    _marker: PhantomData<DB>,
}

impl<DB: SqlDatabase> SqlOrderStore<DB> {
    /// Create a new SQL order store with the given pool.
    pub fn new(pool: DB::Pool) -> Self {
        Self {
            pool,
            numbers: Arc::new(RandomOrderNumbers),
            order_number_attempts: DEFAULT_ORDER_NUMBER_ATTEMPTS,
            _marker: PhantomData,
        }
    }

    /// Replace the order number source and the number of draws per placement.
    pub fn with_order_numbers(mut self, numbers: Arc<dyn OrderNumbers>, attempts: u32) -> Self {
        self.numbers = numbers;
        self.order_number_attempts = attempts.max(1);
        self
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &DB::Pool {
        &self.pool
    }
}

fn decode<T>(value: String) -> Result<T>
where
    T: FromStr<Err = UnknownValue>,
{
    value
        .parse()
        .map_err(|e: UnknownValue| OrderError::Persistence(e.to_string()))
}

fn decode_quantity(value: i64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| OrderError::Persistence(format!("stored quantity {value} out of range")))
}

fn decode_discount(basis_points: i64) -> Result<DiscountRate> {
    u32::try_from(basis_points)
        .ok()
        .and_then(DiscountRate::from_basis_points)
        .ok_or_else(|| {
            OrderError::Persistence(format!("stored discount {basis_points} out of range"))
        })
}

fn order_columns() -> [Orders; 12] {
    [
        Orders::Id,
        Orders::UserId,
        Orders::OrderNumber,
        Orders::TotalAmount,
        Orders::Status,
        Orders::PaymentMethod,
        Orders::PaymentStatus,
        Orders::ShippingAddress,
        Orders::Notes,
        Orders::OrderDate,
        Orders::CreatedAt,
        Orders::UpdatedAt,
    ]
}

fn select_order(order_id: i64, scope: OrderScope) -> SelectStatement {
    let mut stmt = Query::select()
        .columns(order_columns())
        .from(Orders::Table)
        .and_where(Expr::col(Orders::Id).eq(order_id))
        .to_owned();
    if let Some(owner) = scope.owner() {
        stmt.and_where(Expr::col(Orders::UserId).eq(owner));
    }
    stmt
}

fn apply_filter(stmt: &mut SelectStatement, filter: &OrderFilter) {
    if let Some(owner) = filter.scope.owner() {
        stmt.and_where(Expr::col(Orders::UserId).eq(owner));
    }
    if let Some(status) = filter.status {
        stmt.and_where(Expr::col(Orders::Status).eq(status.as_str()));
    }
    if let Some(payment_status) = filter.payment_status {
        stmt.and_where(Expr::col(Orders::PaymentStatus).eq(payment_status.as_str()));
    }
}

fn select_items(order_id: i64) -> SelectStatement {
    Query::select()
        .column((OrderItems::Table, OrderItems::Id))
        .column((OrderItems::Table, OrderItems::OrderId))
        .column((OrderItems::Table, OrderItems::ProductId))
        .column((OrderItems::Table, OrderItems::Quantity))
        .column((OrderItems::Table, OrderItems::Price))
        .column((OrderItems::Table, OrderItems::Subtotal))
        .expr_as(
            Expr::col((Products::Table, Products::Name)),
            Alias::new("product_name"),
        )
        .expr_as(
            Expr::col((Products::Table, Products::ImageUrl)),
            Alias::new("product_image_url"),
        )
        .expr_as(
            Expr::col((Products::Table, Products::Unit)),
            Alias::new("product_unit"),
        )
        .from(OrderItems::Table)
        .inner_join(
            Products::Table,
            Expr::col((Products::Table, Products::Id))
                .equals((OrderItems::Table, OrderItems::ProductId)),
        )
        .and_where(Expr::col((OrderItems::Table, OrderItems::OrderId)).eq(order_id))
        .order_by((OrderItems::Table, OrderItems::Id), SortOrder::Asc)
        .to_owned()
}

/// Conditional decrement: succeeds only while enough stock remains.
fn reserve_stock(line: &PricedLine, now: &str) -> UpdateStatement {
    let quantity = i64::from(line.quantity);
    Query::update()
        .table(Products::Table)
        .value(Products::Stock, Expr::col(Products::Stock).sub(quantity))
        .value(Products::UpdatedAt, now)
        .and_where(Expr::col(Products::Id).eq(line.product_id))
        .and_where(Expr::col(Products::Stock).gte(quantity))
        .and_where(Expr::col(Products::IsAvailable).eq(true))
        .to_owned()
}

fn restore_stock(product_id: i64, quantity: u32, now: &str) -> UpdateStatement {
    Query::update()
        .table(Products::Table)
        .value(
            Products::Stock,
            Expr::col(Products::Stock).add(i64::from(quantity)),
        )
        .value(Products::UpdatedAt, now)
        .and_where(Expr::col(Products::Id).eq(product_id))
        .to_owned()
}

/// Status change guarded by the status it was read with.
fn set_status(order_id: i64, from: OrderStatus, to: OrderStatus, now: &str) -> UpdateStatement {
    Query::update()
        .table(Orders::Table)
        .value(Orders::Status, to.as_str())
        .value(Orders::UpdatedAt, now)
        .and_where(Expr::col(Orders::Id).eq(order_id))
        .and_where(Expr::col(Orders::Status).eq(from.as_str()))
        .to_owned()
}

fn set_payment_status(
    order_id: i64,
    from: PaymentStatus,
    to: PaymentStatus,
    now: &str,
) -> UpdateStatement {
    Query::update()
        .table(Orders::Table)
        .value(Orders::PaymentStatus, to.as_str())
        .value(Orders::UpdatedAt, now)
        .and_where(Expr::col(Orders::Id).eq(order_id))
        .and_where(Expr::col(Orders::PaymentStatus).eq(from.as_str()))
        .to_owned()
}

fn changed_concurrently() -> OrderError {
    OrderError::InvalidState("Order was modified concurrently".to_string())
}

/// Macro to implement the order store traits for a specific SQL backend.
macro_rules! impl_order_store {
    ($db_type:ty, $feature:literal, $conn:ty, $row:ty) => {
        #[cfg(feature = $feature)]
        impl SqlOrderStore<$db_type> {
            async fn begin(conn: &mut $conn) -> Result<()> {
                sqlx::query(<$db_type>::BEGIN).execute(&mut *conn).await?;
                Ok(())
            }

            /// Commit on success, roll back on failure.
            async fn finish<T>(conn: &mut $conn, result: Result<T>) -> Result<T> {
                match result {
                    Ok(value) => match sqlx::query("COMMIT").execute(&mut *conn).await {
                        Ok(_) => Ok(value),
                        Err(e) => {
                            let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                            Err(e.into())
                        }
                    },
                    Err(e) => {
                        let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                        Err(e)
                    }
                }
            }

            fn product_from_row(row: &$row) -> Result<crate::domain::Product> {
                use sqlx::Row;

                Ok(crate::domain::Product {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    price: Money::from_cents(row.try_get("price")?),
                    discount: decode_discount(row.try_get("discount_percentage")?)?,
                    stock: row.try_get("stock")?,
                    unit: row.try_get("unit")?,
                    image_url: row.try_get("image_url")?,
                    is_available: row.try_get("is_available")?,
                })
            }

            fn order_from_row(row: &$row) -> Result<crate::domain::Order> {
                use sqlx::Row;

                Ok(crate::domain::Order {
                    id: row.try_get("id")?,
                    user_id: row.try_get("user_id")?,
                    order_number: row.try_get("order_number")?,
                    total_amount: Money::from_cents(row.try_get("total_amount")?),
                    status: decode(row.try_get("status")?)?,
                    payment_method: decode(row.try_get("payment_method")?)?,
                    payment_status: decode(row.try_get("payment_status")?)?,
                    shipping_address: row.try_get("shipping_address")?,
                    notes: row.try_get("notes")?,
                    order_date: row.try_get("order_date")?,
                    created_at: row.try_get("created_at")?,
                    updated_at: row.try_get("updated_at")?,
                    customer: None,
                    items: Vec::new(),
                })
            }

            async fn fetch_product(
                conn: &mut $conn,
                product_id: i64,
            ) -> Result<Option<crate::domain::Product>> {
                let stmt = Query::select()
                    .columns([
                        Products::Id,
                        Products::Name,
                        Products::Price,
                        Products::DiscountPercentage,
                        Products::Stock,
                        Products::Unit,
                        Products::ImageUrl,
                        Products::IsAvailable,
                    ])
                    .from(Products::Table)
                    .and_where(Expr::col(Products::Id).eq(product_id))
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let row = sqlx::query(&sql).fetch_optional(&mut *conn).await?;
                row.as_ref().map(Self::product_from_row).transpose()
            }

            async fn fetch_user(
                conn: &mut $conn,
                user_id: i64,
            ) -> Result<Option<crate::domain::User>> {
                use sqlx::Row;

                let stmt = Query::select()
                    .columns([
                        Users::Id,
                        Users::Name,
                        Users::Email,
                        Users::Role,
                        Users::Phone,
                        Users::IsActive,
                    ])
                    .from(Users::Table)
                    .and_where(Expr::col(Users::Id).eq(user_id))
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let row = sqlx::query(&sql).fetch_optional(&mut *conn).await?;

                match row {
                    Some(row) => Ok(Some(crate::domain::User {
                        id: row.try_get("id")?,
                        name: row.try_get("name")?,
                        email: row.try_get("email")?,
                        role: decode(row.try_get("role")?)?,
                        phone: row.try_get("phone")?,
                        is_active: row.try_get("is_active")?,
                    })),
                    None => Ok(None),
                }
            }

            async fn fetch_order_row(
                conn: &mut $conn,
                order_id: i64,
                scope: OrderScope,
            ) -> Result<Option<crate::domain::Order>> {
                let sql = <$db_type>::build_select(select_order(order_id, scope));
                let row = sqlx::query(&sql).fetch_optional(&mut *conn).await?;
                row.as_ref().map(Self::order_from_row).transpose()
            }

            /// Attach the customer summary and the items with product summaries.
            async fn hydrate(
                conn: &mut $conn,
                mut order: crate::domain::Order,
            ) -> Result<crate::domain::Order> {
                use sqlx::Row;

                order.customer = Self::fetch_user(conn, order.user_id)
                    .await?
                    .map(|user| crate::domain::CustomerSummary {
                        id: user.id,
                        name: user.name,
                        email: user.email,
                        phone: user.phone,
                    });

                let sql = <$db_type>::build_select(select_items(order.id));
                let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;

                let mut items = Vec::with_capacity(rows.len());
                for row in rows {
                    let product_id: i64 = row.try_get("product_id")?;
                    items.push(crate::domain::OrderItem {
                        id: row.try_get("id")?,
                        order_id: row.try_get("order_id")?,
                        product_id,
                        quantity: decode_quantity(row.try_get("quantity")?)?,
                        price: Money::from_cents(row.try_get("price")?),
                        subtotal: Money::from_cents(row.try_get("subtotal")?),
                        product: Some(crate::domain::ProductSummary {
                            id: product_id,
                            name: row.try_get("product_name")?,
                            image_url: row.try_get("product_image_url")?,
                            unit: row.try_get("product_unit")?,
                        }),
                    });
                }
                order.items = items;

                Ok(order)
            }

            async fn fetch_order(
                conn: &mut $conn,
                order_id: i64,
                scope: OrderScope,
            ) -> Result<Option<crate::domain::Order>> {
                match Self::fetch_order_row(conn, order_id, scope).await? {
                    Some(order) => Ok(Some(Self::hydrate(conn, order).await?)),
                    None => Ok(None),
                }
            }

            /// Run an UPDATE rendered by the caller; sea-query statements are not
            /// `Send` and must not be held across an await.
            async fn execute_update(conn: &mut $conn, sql: String) -> Result<u64> {
                let result = sqlx::query(&sql).execute(&mut *conn).await?;
                Ok(result.rows_affected())
            }

            /// Insert the order row, drawing a fresh number on every conflict.
            async fn insert_order(
                &self,
                conn: &mut $conn,
                order: &PlaceOrder,
                total: Money,
                placed_at: DateTime<Utc>,
            ) -> Result<i64> {
                use sqlx::Row;

                let now = timestamp(placed_at);

                for attempt in 1..=self.order_number_attempts {
                    let order_number = self.numbers.next(placed_at);

                    let stmt = Query::insert()
                        .into_table(Orders::Table)
                        .columns([
                            Orders::UserId,
                            Orders::OrderNumber,
                            Orders::TotalAmount,
                            Orders::Status,
                            Orders::PaymentMethod,
                            Orders::PaymentStatus,
                            Orders::ShippingAddress,
                            Orders::Notes,
                            Orders::OrderDate,
                            Orders::CreatedAt,
                            Orders::UpdatedAt,
                        ])
                        .values_panic([
                            order.user_id.into(),
                            order_number.clone().into(),
                            total.cents().into(),
                            OrderStatus::Pending.as_str().into(),
                            order.payment_method.as_str().into(),
                            PaymentStatus::Unpaid.as_str().into(),
                            order.shipping_address.clone().into(),
                            order.notes.clone().into(),
                            now.clone().into(),
                            now.clone().into(),
                            now.clone().into(),
                        ])
                        .on_conflict(OnConflict::column(Orders::OrderNumber).do_nothing().to_owned())
                        .returning_col(Orders::Id)
                        .to_owned();

                    let sql = <$db_type>::build_insert(stmt);
                    if let Some(row) = sqlx::query(&sql).fetch_optional(&mut *conn).await? {
                        return Ok(row.try_get("id")?);
                    }

                    warn!(
                        order_number = %order_number,
                        attempt,
                        "Order number already taken, drawing another"
                    );
                }

                Err(OrderError::Persistence(format!(
                    "no unique order number after {} attempts",
                    self.order_number_attempts
                )))
            }

            async fn insert_items(
                conn: &mut $conn,
                order_id: i64,
                lines: &[PricedLine],
                now: &str,
            ) -> Result<()> {
                let mut stmt = Query::insert()
                    .into_table(OrderItems::Table)
                    .columns([
                        OrderItems::OrderId,
                        OrderItems::ProductId,
                        OrderItems::Quantity,
                        OrderItems::Price,
                        OrderItems::Subtotal,
                        OrderItems::CreatedAt,
                        OrderItems::UpdatedAt,
                    ])
                    .to_owned();

                for line in lines {
                    stmt.values_panic([
                        order_id.into(),
                        line.product_id.into(),
                        i64::from(line.quantity).into(),
                        line.price.cents().into(),
                        line.subtotal.cents().into(),
                        now.into(),
                        now.into(),
                    ]);
                }

                let sql = <$db_type>::build_insert(stmt);
                sqlx::query(&sql).execute(&mut *conn).await?;
                Ok(())
            }

            /// Validate, price and reserve every line, then write the order.
            async fn place_in_tx(&self, conn: &mut $conn, order: &PlaceOrder) -> Result<i64> {
                check_cart_shape(&order.items)?;

                let placed_at = Utc::now();
                let now = timestamp(placed_at);
                let mut cart = PricedCart::default();

                for line in &order.items {
                    let product =
                        require_product(line, Self::fetch_product(conn, line.product_id).await?)?;
                    let priced = price_line(line, &product)?;

                    let sql = <$db_type>::build_update(reserve_stock(&priced, &now));
                    if Self::execute_update(conn, sql).await? == 0 {
                        return Err(OrderError::InsufficientStock {
                            product: product.name,
                        });
                    }
                    cart.push(priced)?;
                }

                let order_id = self.insert_order(conn, order, cart.total, placed_at).await?;
                Self::insert_items(conn, order_id, &cart.lines, &now).await?;

                debug!(order_id, lines = cart.lines.len(), "Order rows written");
                Ok(order_id)
            }

            /// Mark the order cancelled, then put every item's quantity back.
            async fn cancel_in_tx(
                conn: &mut $conn,
                order_id: i64,
                current: OrderStatus,
            ) -> Result<()> {
                use sqlx::Row;

                let now = timestamp(Utc::now());
                let sql = <$db_type>::build_update(set_status(
                    order_id,
                    current,
                    OrderStatus::Cancelled,
                    &now,
                ));
                let changed = Self::execute_update(conn, sql).await?;
                if changed == 0 {
                    return Err(changed_concurrently());
                }

                let stmt = Query::select()
                    .columns([OrderItems::ProductId, OrderItems::Quantity])
                    .from(OrderItems::Table)
                    .and_where(Expr::col(OrderItems::OrderId).eq(order_id))
                    .order_by(OrderItems::Id, SortOrder::Asc)
                    .to_owned();
                let sql = <$db_type>::build_select(stmt);
                let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;

                for row in rows {
                    let product_id: i64 = row.try_get("product_id")?;
                    let quantity = decode_quantity(row.try_get("quantity")?)?;
                    let sql = <$db_type>::build_update(restore_stock(product_id, quantity, &now));
                    Self::execute_update(conn, sql).await?;
                }

                Ok(())
            }

            async fn cancel_checked(
                conn: &mut $conn,
                order_id: i64,
                scope: OrderScope,
            ) -> Result<()> {
                let order = Self::fetch_order_row(conn, order_id, scope)
                    .await?
                    .ok_or(OrderError::OrderNotFound)?;

                if !order.status.is_cancellable() {
                    return Err(OrderError::InvalidState(format!(
                        "Order with status {} cannot be cancelled",
                        order.status
                    )));
                }

                Self::cancel_in_tx(conn, order_id, order.status).await
            }

            async fn transition_status(
                conn: &mut $conn,
                order_id: i64,
                next: OrderStatus,
            ) -> Result<()> {
                let order = Self::fetch_order_row(conn, order_id, OrderScope::All)
                    .await?
                    .ok_or(OrderError::OrderNotFound)?;

                if !order.status.can_transition_to(next) {
                    return Err(OrderError::InvalidState(format!(
                        "Cannot change order status from {} to {}",
                        order.status, next
                    )));
                }

                if next == OrderStatus::Cancelled {
                    return Self::cancel_in_tx(conn, order_id, order.status).await;
                }

                let now = timestamp(Utc::now());
                let sql = <$db_type>::build_update(set_status(order_id, order.status, next, &now));
                let changed = Self::execute_update(conn, sql).await?;
                if changed == 0 {
                    return Err(changed_concurrently());
                }
                Ok(())
            }

            async fn transition_payment(
                conn: &mut $conn,
                order_id: i64,
                next: PaymentStatus,
            ) -> Result<()> {
                let order = Self::fetch_order_row(conn, order_id, OrderScope::All)
                    .await?
                    .ok_or(OrderError::OrderNotFound)?;

                if !order.payment_status.can_transition_to(next) {
                    return Err(OrderError::InvalidState(format!(
                        "Cannot change payment status from {} to {}",
                        order.payment_status, next
                    )));
                }

                let now = timestamp(Utc::now());
                let sql = <$db_type>::build_update(set_payment_status(
                    order_id,
                    order.payment_status,
                    next,
                    &now,
                ));
                let changed = Self::execute_update(conn, sql).await?;
                if changed == 0 {
                    return Err(changed_concurrently());
                }
                Ok(())
            }

            async fn fetch_committed(conn: &mut $conn, order_id: i64) -> Result<crate::domain::Order> {
                Self::fetch_order(conn, order_id, OrderScope::All)
                    .await?
                    .ok_or(OrderError::OrderNotFound)
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::interfaces::CatalogReader for SqlOrderStore<$db_type> {
            async fn get_product(&self, product_id: i64) -> Result<Option<crate::domain::Product>> {
                let mut conn = self.pool.acquire().await?;
                Self::fetch_product(&mut conn, product_id).await
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::interfaces::UserDirectory for SqlOrderStore<$db_type> {
            async fn find_user(&self, user_id: i64) -> Result<Option<crate::domain::User>> {
                let mut conn = self.pool.acquire().await?;
                Self::fetch_user(&mut conn, user_id).await
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::interfaces::CatalogWriter for SqlOrderStore<$db_type> {
            async fn insert_user(&self, user: crate::interfaces::NewUser) -> Result<i64> {
                use sqlx::Row;

                let now = timestamp(Utc::now());
                let stmt = Query::insert()
                    .into_table(Users::Table)
                    .columns([
                        Users::Name,
                        Users::Email,
                        Users::Role,
                        Users::Phone,
                        Users::Address,
                        Users::IsActive,
                        Users::CreatedAt,
                        Users::UpdatedAt,
                    ])
                    .values_panic([
                        user.name.into(),
                        user.email.into(),
                        user.role.as_str().into(),
                        user.phone.into(),
                        user.address.into(),
                        user.is_active.into(),
                        now.clone().into(),
                        now.into(),
                    ])
                    .returning_col(Users::Id)
                    .to_owned();

                let sql = <$db_type>::build_insert(stmt);
                let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
                Ok(row.try_get("id")?)
            }

            async fn insert_category(
                &self,
                category: crate::interfaces::NewCategory,
            ) -> Result<i64> {
                use sqlx::Row;

                let now = timestamp(Utc::now());
                let stmt = Query::insert()
                    .into_table(Categories::Table)
                    .columns([
                        Categories::Name,
                        Categories::Description,
                        Categories::CreatedAt,
                        Categories::UpdatedAt,
                    ])
                    .values_panic([
                        category.name.into(),
                        category.description.into(),
                        now.clone().into(),
                        now.into(),
                    ])
                    .returning_col(Categories::Id)
                    .to_owned();

                let sql = <$db_type>::build_insert(stmt);
                let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
                Ok(row.try_get("id")?)
            }

            async fn insert_product(&self, product: crate::interfaces::NewProduct) -> Result<i64> {
                use sqlx::Row;

                let now = timestamp(Utc::now());
                let stmt = Query::insert()
                    .into_table(Products::Table)
                    .columns([
                        Products::CategoryId,
                        Products::Name,
                        Products::Description,
                        Products::Price,
                        Products::Stock,
                        Products::Unit,
                        Products::ImageUrl,
                        Products::IsAvailable,
                        Products::DiscountPercentage,
                        Products::CreatedAt,
                        Products::UpdatedAt,
                    ])
                    .values_panic([
                        product.category_id.into(),
                        product.name.into(),
                        product.description.into(),
                        product.price.cents().into(),
                        product.stock.into(),
                        product.unit.into(),
                        product.image_url.into(),
                        product.is_available.into(),
                        i64::from(product.discount.basis_points()).into(),
                        now.clone().into(),
                        now.into(),
                    ])
                    .returning_col(Products::Id)
                    .to_owned();

                let sql = <$db_type>::build_insert(stmt);
                let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
                Ok(row.try_get("id")?)
            }

            async fn product_count(&self) -> Result<u64> {
                use sqlx::Row;

                let stmt = Query::select()
                    .expr_as(Func::count(Expr::col(Products::Id)), Alias::new("total"))
                    .from(Products::Table)
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
                let total: i64 = row.try_get("total")?;
                Ok(total.unsigned_abs())
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::interfaces::OrderStore for SqlOrderStore<$db_type> {
            async fn place_order(&self, order: PlaceOrder) -> Result<crate::domain::Order> {
                let mut conn = self.pool.acquire().await?;

                Self::begin(&mut conn).await?;
                let result = self.place_in_tx(&mut conn, &order).await;
                let order_id = Self::finish(&mut conn, result).await?;

                Self::fetch_committed(&mut conn, order_id).await
            }

            async fn get_order(
                &self,
                order_id: i64,
                scope: OrderScope,
            ) -> Result<Option<crate::domain::Order>> {
                let mut conn = self.pool.acquire().await?;
                Self::fetch_order(&mut conn, order_id, scope).await
            }

            async fn list_orders(
                &self,
                filter: &OrderFilter,
            ) -> Result<crate::interfaces::OrderPage> {
                use sqlx::Row;

                let mut conn = self.pool.acquire().await?;

                let mut count_stmt = Query::select()
                    .expr_as(Func::count(Expr::col(Orders::Id)), Alias::new("total"))
                    .from(Orders::Table)
                    .to_owned();
                apply_filter(&mut count_stmt, filter);
                let sql = <$db_type>::build_select(count_stmt);
                let row = sqlx::query(&sql).fetch_one(&mut *conn).await?;
                let count: i64 = row.try_get("total")?;

                let mut page_stmt = Query::select()
                    .columns(order_columns())
                    .from(Orders::Table)
                    .order_by(Orders::CreatedAt, SortOrder::Desc)
                    .order_by(Orders::Id, SortOrder::Desc)
                    .limit(u64::from(filter.limit))
                    .offset(filter.offset())
                    .to_owned();
                apply_filter(&mut page_stmt, filter);
                let sql = <$db_type>::build_select(page_stmt);
                let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;

                let mut orders = Vec::with_capacity(rows.len());
                for row in &rows {
                    let order = Self::order_from_row(row)?;
                    orders.push(Self::hydrate(&mut conn, order).await?);
                }

                Ok(crate::interfaces::OrderPage::new(
                    orders,
                    count.unsigned_abs(),
                    filter,
                ))
            }

            async fn cancel_order(
                &self,
                order_id: i64,
                scope: OrderScope,
            ) -> Result<crate::domain::Order> {
                let mut conn = self.pool.acquire().await?;

                Self::begin(&mut conn).await?;
                let result = Self::cancel_checked(&mut conn, order_id, scope).await;
                Self::finish(&mut conn, result).await?;

                Self::fetch_committed(&mut conn, order_id).await
            }

            async fn update_status(
                &self,
                order_id: i64,
                status: OrderStatus,
            ) -> Result<crate::domain::Order> {
                let mut conn = self.pool.acquire().await?;

                Self::begin(&mut conn).await?;
                let result = Self::transition_status(&mut conn, order_id, status).await;
                Self::finish(&mut conn, result).await?;

                Self::fetch_committed(&mut conn, order_id).await
            }

            async fn update_payment_status(
                &self,
                order_id: i64,
                status: PaymentStatus,
            ) -> Result<crate::domain::Order> {
                let mut conn = self.pool.acquire().await?;

                Self::begin(&mut conn).await?;
                let result = Self::transition_payment(&mut conn, order_id, status).await;
                Self::finish(&mut conn, result).await?;

                Self::fetch_committed(&mut conn, order_id).await
            }

            async fn stats(&self) -> Result<crate::interfaces::OrderStats> {
                use sqlx::Row;

                let mut conn = self.pool.acquire().await?;
                let mut stats = crate::interfaces::OrderStats::default();

                let stmt = Query::select()
                    .column(Orders::Status)
                    .expr_as(Func::count(Expr::col(Orders::Id)), Alias::new("total"))
                    .from(Orders::Table)
                    .group_by_col(Orders::Status)
                    .to_owned();
                let sql = <$db_type>::build_select(stmt);
                for row in sqlx::query(&sql).fetch_all(&mut *conn).await? {
                    let status: OrderStatus = decode(row.try_get("status")?)?;
                    let total: i64 = row.try_get("total")?;
                    stats.record_status(status, total.unsigned_abs());
                }

                let stmt = Query::select()
                    .expr_as(
                        Expr::cust("COALESCE(CAST(SUM(total_amount) AS BIGINT), 0)"),
                        Alias::new("revenue"),
                    )
                    .from(Orders::Table)
                    .and_where(Expr::col(Orders::PaymentStatus).eq(PaymentStatus::Paid.as_str()))
                    .and_where(Expr::col(Orders::Status).ne(OrderStatus::Cancelled.as_str()))
                    .to_owned();
                let sql = <$db_type>::build_select(stmt);
                let row = sqlx::query(&sql).fetch_one(&mut *conn).await?;
                stats.total_revenue = Money::from_cents(row.try_get("revenue")?);

                Ok(stats)
            }
        }
    };
}

// Generate implementations for each SQL backend
impl_order_store!(
    super::postgres::Postgres,
    "postgres",
    sqlx::PgConnection,
    sqlx::postgres::PgRow
);
impl_order_store!(
    super::sqlite::Sqlite,
    "sqlite",
    sqlx::SqliteConnection,
    sqlx::sqlite::SqliteRow
);
