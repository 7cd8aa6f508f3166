//! Order workflow step definitions.

use std::collections::HashMap;

use cucumber::gherkin::Step;
use cucumber::{given, then, when, World};
use freshmart::config::OrdersConfig;
use freshmart::domain::{
    DiscountRate, Identity, LineRequest, Money, NewOrder, Order, OrderStatus, PaymentMethod,
    Role,
};
use freshmart::error::OrderError;
use freshmart::interfaces::{NewCategory, NewProduct, NewUser};
use freshmart::services::OrderService;

use crate::backend::{StorageBackend, StorageContext};

const UNKNOWN_PRODUCT: i64 = 987_654_321;

/// Test context for order workflow scenarios.
#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct OrderWorkflowWorld {
    backend: StorageBackend,
    context: Option<StorageContext>,
    products: HashMap<String, i64>,
    initial_stock: HashMap<String, i64>,
    customer: Option<Identity>,
    admin: Option<Identity>,
    last_order: Option<Order>,
    last_error: Option<OrderError>,
}

impl OrderWorkflowWorld {
    fn new() -> Self {
        Self {
            backend: StorageBackend::from_env(),
            context: None,
            products: HashMap::new(),
            initial_stock: HashMap::new(),
            customer: None,
            admin: None,
            last_order: None,
            last_error: None,
        }
    }

    fn context(&self) -> &StorageContext {
        self.context
            .as_ref()
            .expect("Storage context not initialized")
    }

    fn service(&self) -> OrderService {
        OrderService::new(self.context().store.clone(), OrdersConfig::default())
    }

    fn customer(&self) -> Identity {
        self.customer.expect("customer account not created")
    }

    fn admin(&self) -> Identity {
        self.admin.expect("admin account not created")
    }

    fn product(&self, name: &str) -> i64 {
        *self
            .products
            .get(name)
            .unwrap_or_else(|| panic!("unknown product {name}"))
    }

    fn order(&self) -> &Order {
        self.last_order.as_ref().expect("no order placed")
    }

    async fn stock(&self, name: &str) -> i64 {
        self.context()
            .store
            .get_product(self.product(name))
            .await
            .expect("get_product should succeed")
            .expect("product should exist")
            .stock
    }

    async fn create_user(&self, role: Role) -> Identity {
        let id = self
            .context()
            .catalog
            .insert_user(NewUser {
                name: format!("Test {role}"),
                email: format!("{role}@test.com"),
                role,
                phone: None,
                address: None,
                is_active: true,
            })
            .await
            .expect("insert_user should succeed");
        Identity::new(id, role)
    }

    async fn place(&mut self, items: Vec<LineRequest>) {
        let order = NewOrder {
            items,
            payment_method: PaymentMethod::Cash,
            shipping_address: "Jl. Customer No. 2, Jakarta".to_string(),
            notes: None,
        };
        let result = self.service().place_order(self.customer(), order).await;
        self.record(result);
    }

    fn record(&mut self, result: Result<Order, OrderError>) {
        match result {
            Ok(order) => {
                self.last_order = Some(order);
                self.last_error = None;
            }
            Err(e) => self.last_error = Some(e),
        }
    }
}

fn error_kind(err: &OrderError) -> &'static str {
    match err {
        OrderError::InvalidRequest(_) => "invalid request",
        OrderError::ProductNotFound(_) | OrderError::OrderNotFound => "not found",
        OrderError::Unavailable { .. } => "unavailable",
        OrderError::InsufficientStock { .. } => "insufficient stock",
        OrderError::InvalidState(_) => "invalid state",
        OrderError::Unauthorized(_) => "unauthorized",
        OrderError::Forbidden(_) => "forbidden",
        OrderError::Persistence(_) => "persistence",
    }
}

fn table_rows(step: &Step) -> Vec<HashMap<String, String>> {
    let table = step.table.as_ref().expect("step needs a data table");
    let header = &table.rows[0];
    table.rows[1..]
        .iter()
        .map(|row| header.iter().cloned().zip(row.iter().cloned()).collect())
        .collect()
}

// --- Background ---

#[given("an order store backend")]
async fn given_backend(world: &mut OrderWorkflowWorld) {
    println!("Using backend: {}", world.backend.name());
    world.context = Some(StorageContext::new(world.backend).await);
}

#[given("a catalog with products:")]
async fn given_catalog(world: &mut OrderWorkflowWorld, step: &Step) {
    let catalog = world.context().catalog.clone();
    let category_id = catalog
        .insert_category(NewCategory {
            name: "Sayuran".to_string(),
            description: None,
        })
        .await
        .expect("insert_category should succeed");

    for row in table_rows(step) {
        let name = row["name"].clone();
        let stock: i64 = row["stock"].parse().expect("stock");
        let id = catalog
            .insert_product(NewProduct {
                category_id,
                name: name.clone(),
                description: None,
                price: Money::from_major(row["price"].parse().expect("price")),
                discount: DiscountRate::from_percent(row["discount"].parse().expect("discount"))
                    .expect("valid discount"),
                stock,
                unit: "kg".to_string(),
                image_url: None,
                is_available: row["available"] == "true",
            })
            .await
            .expect("insert_product should succeed");
        world.products.insert(name.clone(), id);
        world.initial_stock.insert(name, stock);
    }
}

#[given("a customer account")]
async fn given_customer(world: &mut OrderWorkflowWorld) {
    world.customer = Some(world.create_user(Role::Customer).await);
}

#[given("an admin account")]
async fn given_admin(world: &mut OrderWorkflowWorld) {
    world.admin = Some(world.create_user(Role::Admin).await);
}

// --- When steps ---

#[when(expr = "the customer orders {int} of {string}")]
async fn when_customer_orders(world: &mut OrderWorkflowWorld, quantity: u32, name: String) {
    let product_id = world.product(&name);
    world.place(vec![LineRequest::new(product_id, quantity)]).await;
}

#[when(expr = "the customer orders {int} of an unknown product")]
async fn when_customer_orders_unknown(world: &mut OrderWorkflowWorld, quantity: u32) {
    world
        .place(vec![LineRequest::new(UNKNOWN_PRODUCT, quantity)])
        .await;
}

#[when("the customer orders:")]
async fn when_customer_orders_cart(world: &mut OrderWorkflowWorld, step: &Step) {
    let items = table_rows(step)
        .iter()
        .map(|row| {
            LineRequest::new(
                world.product(&row["product"]),
                row["quantity"].parse().expect("quantity"),
            )
        })
        .collect();
    world.place(items).await;
}

#[when("the customer cancels the order")]
async fn when_customer_cancels(world: &mut OrderWorkflowWorld) {
    let id = world.order().id;
    let result = world.service().cancel_order(world.customer(), id).await;
    world.record(result);
}

#[when(expr = "the admin moves the order to {string}")]
async fn when_admin_moves(world: &mut OrderWorkflowWorld, status: String) {
    let id = world.order().id;
    let status: OrderStatus = status.parse().expect("known status");
    let result = world.service().update_status(world.admin(), id, status).await;
    world.record(result);
}

#[when(expr = "the customer moves the order to {string}")]
async fn when_customer_moves(world: &mut OrderWorkflowWorld, status: String) {
    let id = world.order().id;
    let status: OrderStatus = status.parse().expect("known status");
    let result = world
        .service()
        .update_status(world.customer(), id, status)
        .await;
    world.record(result);
}

// --- Then steps ---

#[then("the order is placed")]
async fn then_order_placed(world: &mut OrderWorkflowWorld) {
    assert!(
        world.last_error.is_none(),
        "unexpected error: {:?}",
        world.last_error
    );
    assert!(world.order().order_number.starts_with("ORD-"));
}

#[then(expr = "the order total is {int}")]
async fn then_order_total(world: &mut OrderWorkflowWorld, total: i64) {
    let order = world.order();
    assert_eq!(order.total_amount, Money::from_major(total));
    assert_eq!(order.items_total(), order.total_amount);
}

#[then(expr = "line {int} has unit price {int} and subtotal {int}")]
async fn then_line_priced(world: &mut OrderWorkflowWorld, line: usize, price: i64, subtotal: i64) {
    let item = &world.order().items[line - 1];
    assert_eq!(item.price, Money::from_major(price));
    assert_eq!(item.subtotal, Money::from_major(subtotal));
}

#[then(expr = "the order is {string} and {string}")]
async fn then_order_state(world: &mut OrderWorkflowWorld, status: String, payment: String) {
    let current = world
        .service()
        .get_order(world.admin(), world.order().id)
        .await
        .expect("get_order should succeed");
    assert_eq!(current.status.as_str(), status);
    assert_eq!(current.payment_status.as_str(), payment);
}

#[then(expr = "the stock of {string} is {int}")]
async fn then_stock_is(world: &mut OrderWorkflowWorld, name: String, stock: i64) {
    assert_eq!(world.stock(&name).await, stock);
}

#[then("every stock level is unchanged")]
async fn then_stock_unchanged(world: &mut OrderWorkflowWorld) {
    for (name, stock) in world.initial_stock.clone() {
        assert_eq!(world.stock(&name).await, stock, "stock of {name} changed");
    }
}

#[then(expr = "the order is rejected as {string}")]
async fn then_order_rejected(world: &mut OrderWorkflowWorld, kind: String) {
    let err = world.last_error.as_ref().expect("expected a rejection");
    assert_eq!(error_kind(err), kind, "got {err}");
    assert!(world.last_order.is_none(), "no order should have been placed");
}

#[then(expr = "the request is rejected as {string}")]
async fn then_request_rejected(world: &mut OrderWorkflowWorld, kind: String) {
    let err = world.last_error.as_ref().expect("expected a rejection");
    assert_eq!(error_kind(err), kind, "got {err}");
}

#[then(expr = "the customer has {int} orders")]
async fn then_customer_order_count(world: &mut OrderWorkflowWorld, count: u64) {
    let page = world
        .service()
        .list_orders(world.customer(), Default::default())
        .await
        .expect("list_orders should succeed");
    assert_eq!(page.count, count);
}
