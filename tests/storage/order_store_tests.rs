//! OrderStore interface tests.
//!
//! These tests verify the contract of the OrderStore trait.
//! Each test seeds its own users and products, so they can share one store.

use std::collections::HashMap;

use freshmart::domain::{
    DiscountRate, LineRequest, Money, OrderScope, OrderStatus, PaymentMethod, PaymentStatus,
    PlaceOrder, Role,
};
use freshmart::error::OrderError;
use freshmart::interfaces::{
    CatalogReader, CatalogWriter, NewCategory, NewProduct, NewUser, OrderFilter, OrderStore,
};

/// Users and products seeded for one test.
pub struct Fixture {
    pub customer_id: i64,
    pub other_id: i64,
    products: HashMap<&'static str, i64>,
}

impl Fixture {
    pub fn product(&self, name: &str) -> i64 {
        *self
            .products
            .get(name)
            .unwrap_or_else(|| panic!("no fixture product {name}"))
    }
}

const PRODUCTS: [(&str, i64, i64, u32, bool); 5] = [
    ("Bayam Segar", 5000, 50, 0, true),
    ("Kangkung", 4000, 60, 10, true),
    ("Wortel", 8000, 40, 0, true),
    ("Ikan Salmon", 150000, 20, 0, true),
    ("Durian Montong", 100000, 10, 0, false),
];

async fn user<S: CatalogWriter>(store: &S, tag: &str, who: &str, role: Role) -> i64 {
    store
        .insert_user(NewUser {
            name: format!("{who} {tag}"),
            email: format!("{tag}-{who}@test.com"),
            role,
            phone: None,
            address: None,
            is_active: true,
        })
        .await
        .expect("insert_user should succeed")
}

/// Seed two customers and the fixture products under a unique tag.
pub async fn fixture<S: CatalogWriter>(store: &S, tag: &str) -> Fixture {
    let customer_id = user(store, tag, "customer", Role::Customer).await;
    let other_id = user(store, tag, "other", Role::Customer).await;

    let category_id = store
        .insert_category(NewCategory {
            name: format!("test_{tag}"),
            description: None,
        })
        .await
        .expect("insert_category should succeed");

    let mut products = HashMap::new();
    for (name, price, stock, discount, is_available) in PRODUCTS {
        let id = store
            .insert_product(NewProduct {
                category_id,
                name: name.to_string(),
                description: None,
                price: Money::from_major(price),
                discount: DiscountRate::from_percent(discount).expect("valid discount"),
                stock,
                unit: "kg".to_string(),
                image_url: None,
                is_available,
            })
            .await
            .expect("insert_product should succeed");
        products.insert(name, id);
    }

    Fixture {
        customer_id,
        other_id,
        products,
    }
}

pub fn cart(user_id: i64, items: Vec<LineRequest>) -> PlaceOrder {
    PlaceOrder {
        user_id,
        items,
        payment_method: PaymentMethod::Transfer,
        shipping_address: "Jl. Customer No. 2, Jakarta".to_string(),
        notes: None,
    }
}

pub async fn stock_of<S: OrderStore>(store: &S, product_id: i64) -> i64 {
    store
        .get_product(product_id)
        .await
        .expect("get_product should succeed")
        .expect("product should exist")
        .stock
}

async fn orders_of<S: OrderStore>(store: &S, user_id: i64) -> u64 {
    store
        .list_orders(&OrderFilter::new(OrderScope::owned_by(user_id), 1, 10))
        .await
        .expect("list_orders should succeed")
        .count
}

// =============================================================================
// OrderStore::place_order tests
// =============================================================================

pub async fn test_place_order_single_line<S: OrderStore + CatalogWriter>(store: &S) {
    let fx = fixture(store, "place_single").await;
    let bayam = fx.product("Bayam Segar");

    let order = store
        .place_order(cart(fx.customer_id, vec![LineRequest::new(bayam, 2)]))
        .await
        .expect("place_order should succeed");

    assert_eq!(order.total_amount, Money::from_major(10_000));
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].price, Money::from_major(5000));
    assert_eq!(order.items[0].subtotal, Money::from_major(10_000));
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Unpaid);
    assert_eq!(order.payment_method, PaymentMethod::Transfer);
    assert!(order.order_number.starts_with("ORD-"));
    assert_eq!(stock_of(store, bayam).await, 48);
}

pub async fn test_place_order_applies_discount<S: OrderStore + CatalogWriter>(store: &S) {
    let fx = fixture(store, "place_discount").await;
    let kangkung = fx.product("Kangkung");

    let order = store
        .place_order(cart(fx.customer_id, vec![LineRequest::new(kangkung, 3)]))
        .await
        .expect("place_order should succeed");

    assert_eq!(order.items[0].price, Money::from_major(3600));
    assert_eq!(order.items[0].subtotal, Money::from_major(10_800));
    assert_eq!(order.total_amount, Money::from_major(10_800));
    assert_eq!(stock_of(store, kangkung).await, 57);
}

pub async fn test_place_order_hydrates<S: OrderStore + CatalogWriter>(store: &S) {
    let fx = fixture(store, "place_hydrate").await;
    let wortel = fx.product("Wortel");
    let salmon = fx.product("Ikan Salmon");

    let placed = store
        .place_order(cart(
            fx.customer_id,
            vec![LineRequest::new(wortel, 1), LineRequest::new(salmon, 2)],
        ))
        .await
        .expect("place_order should succeed");

    let fetched = store
        .get_order(placed.id, OrderScope::All)
        .await
        .expect("get_order should succeed")
        .expect("order should exist");

    assert_eq!(fetched, placed);
    let customer = fetched.customer.as_ref().expect("customer summary");
    assert_eq!(customer.id, fx.customer_id);
    assert_eq!(customer.email, "place_hydrate-customer@test.com");
    let names: Vec<&str> = fetched
        .items
        .iter()
        .map(|item| item.product.as_ref().expect("product summary").name.as_str())
        .collect();
    assert_eq!(names, vec!["Wortel", "Ikan Salmon"]);
    assert_eq!(fetched.items_total(), fetched.total_amount);
    for item in &fetched.items {
        assert_eq!(
            item.price.checked_mul(item.quantity),
            Some(item.subtotal)
        );
    }
}

pub async fn test_place_order_rejects_bad_carts<S: OrderStore + CatalogWriter>(store: &S) {
    let fx = fixture(store, "place_bad").await;
    let bayam = fx.product("Bayam Segar");

    let err = store
        .place_order(cart(fx.customer_id, vec![]))
        .await
        .expect_err("empty cart should fail");
    assert!(matches!(err, OrderError::InvalidRequest(_)));

    let err = store
        .place_order(cart(fx.customer_id, vec![LineRequest::new(bayam, 0)]))
        .await
        .expect_err("zero quantity should fail");
    assert!(matches!(err, OrderError::InvalidRequest(_)));

    let err = store
        .place_order(cart(fx.customer_id, vec![LineRequest::new(987_654_321, 1)]))
        .await
        .expect_err("unknown product should fail");
    assert_eq!(err, OrderError::ProductNotFound(987_654_321));

    let err = store
        .place_order(cart(
            fx.customer_id,
            vec![LineRequest::new(987_654_321, 0), LineRequest::new(bayam, 1)],
        ))
        .await
        .expect_err("first line names an unknown product");
    assert_eq!(err, OrderError::ProductNotFound(987_654_321));

    let err = store
        .place_order(cart(
            fx.customer_id,
            vec![LineRequest::new(fx.product("Durian Montong"), 1)],
        ))
        .await
        .expect_err("unavailable product should fail");
    assert_eq!(
        err,
        OrderError::Unavailable {
            product: "Durian Montong".to_string()
        }
    );

    assert_eq!(orders_of(store, fx.customer_id).await, 0);
    assert_eq!(stock_of(store, bayam).await, 50);
}

pub async fn test_place_order_is_atomic<S: OrderStore + CatalogWriter>(store: &S) {
    let fx = fixture(store, "place_atomic").await;
    let bayam = fx.product("Bayam Segar");
    let salmon = fx.product("Ikan Salmon");
    let wortel = fx.product("Wortel");

    let err = store
        .place_order(cart(
            fx.customer_id,
            vec![
                LineRequest::new(bayam, 2),
                LineRequest::new(salmon, 21),
                LineRequest::new(wortel, 1),
            ],
        ))
        .await
        .expect_err("second line should fail");

    assert_eq!(
        err,
        OrderError::InsufficientStock {
            product: "Ikan Salmon".to_string()
        }
    );
    assert_eq!(stock_of(store, bayam).await, 50);
    assert_eq!(stock_of(store, salmon).await, 20);
    assert_eq!(stock_of(store, wortel).await, 40);
    assert_eq!(orders_of(store, fx.customer_id).await, 0);
}

pub async fn test_duplicate_lines_share_stock<S: OrderStore + CatalogWriter>(store: &S) {
    let fx = fixture(store, "place_duplicate").await;
    let salmon = fx.product("Ikan Salmon");

    let err = store
        .place_order(cart(
            fx.customer_id,
            vec![LineRequest::new(salmon, 15), LineRequest::new(salmon, 15)],
        ))
        .await
        .expect_err("combined quantity exceeds stock");
    assert!(matches!(err, OrderError::InsufficientStock { .. }));
    assert_eq!(stock_of(store, salmon).await, 20);

    let order = store
        .place_order(cart(
            fx.customer_id,
            vec![LineRequest::new(salmon, 12), LineRequest::new(salmon, 8)],
        ))
        .await
        .expect("combined quantity equals stock");
    assert_eq!(order.items.len(), 2);
    assert_eq!(stock_of(store, salmon).await, 0);
}

// =============================================================================
// OrderStore::cancel_order tests
// =============================================================================

pub async fn test_cancel_restores_stock_once<S: OrderStore + CatalogWriter>(store: &S) {
    let fx = fixture(store, "cancel_once").await;
    let bayam = fx.product("Bayam Segar");
    let kangkung = fx.product("Kangkung");

    let order = store
        .place_order(cart(
            fx.customer_id,
            vec![LineRequest::new(bayam, 5), LineRequest::new(kangkung, 7)],
        ))
        .await
        .expect("place_order should succeed");
    assert_eq!(stock_of(store, bayam).await, 45);

    let cancelled = store
        .cancel_order(order.id, OrderScope::owned_by(fx.customer_id))
        .await
        .expect("cancel should succeed");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.total_amount, order.total_amount);
    assert_eq!(stock_of(store, bayam).await, 50);
    assert_eq!(stock_of(store, kangkung).await, 60);

    let err = store
        .cancel_order(order.id, OrderScope::owned_by(fx.customer_id))
        .await
        .expect_err("second cancel should fail");
    assert!(matches!(err, OrderError::InvalidState(_)));
    assert_eq!(stock_of(store, bayam).await, 50);
}

pub async fn test_cancel_delivered_rejected<S: OrderStore + CatalogWriter>(store: &S) {
    let fx = fixture(store, "cancel_delivered").await;
    let wortel = fx.product("Wortel");

    let order = store
        .place_order(cart(fx.customer_id, vec![LineRequest::new(wortel, 4)]))
        .await
        .expect("place_order should succeed");
    for status in [
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ] {
        store
            .update_status(order.id, status)
            .await
            .expect("legal transition should succeed");
    }

    let err = store
        .cancel_order(order.id, OrderScope::All)
        .await
        .expect_err("delivered order cannot be cancelled");
    assert_eq!(
        err,
        OrderError::InvalidState("Order with status delivered cannot be cancelled".to_string())
    );

    let current = store
        .get_order(order.id, OrderScope::All)
        .await
        .expect("get_order should succeed")
        .expect("order should exist");
    assert_eq!(current.status, OrderStatus::Delivered);
    assert_eq!(stock_of(store, wortel).await, 36);
}

pub async fn test_cancel_out_of_scope<S: OrderStore + CatalogWriter>(store: &S) {
    let fx = fixture(store, "cancel_scope").await;
    let bayam = fx.product("Bayam Segar");

    let order = store
        .place_order(cart(fx.customer_id, vec![LineRequest::new(bayam, 1)]))
        .await
        .expect("place_order should succeed");

    let err = store
        .cancel_order(order.id, OrderScope::owned_by(fx.other_id))
        .await
        .expect_err("other customer cannot cancel");
    assert_eq!(err, OrderError::OrderNotFound);
    assert!(store
        .get_order(order.id, OrderScope::owned_by(fx.other_id))
        .await
        .expect("get_order should succeed")
        .is_none());
    assert_eq!(stock_of(store, bayam).await, 49);

    let err = store
        .cancel_order(987_654_321, OrderScope::All)
        .await
        .expect_err("missing order");
    assert_eq!(err, OrderError::OrderNotFound);
}

// =============================================================================
// Administrative transitions
// =============================================================================

pub async fn test_admin_cancel_restores_stock<S: OrderStore + CatalogWriter>(store: &S) {
    let fx = fixture(store, "admin_cancel").await;
    let wortel = fx.product("Wortel");

    let order = store
        .place_order(cart(fx.customer_id, vec![LineRequest::new(wortel, 4)]))
        .await
        .expect("place_order should succeed");
    store
        .update_status(order.id, OrderStatus::Processing)
        .await
        .expect("pending -> processing");

    let cancelled = store
        .update_status(order.id, OrderStatus::Cancelled)
        .await
        .expect("processing -> cancelled");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(stock_of(store, wortel).await, 40);
}

pub async fn test_illegal_transitions<S: OrderStore + CatalogWriter>(store: &S) {
    let fx = fixture(store, "transitions").await;
    let bayam = fx.product("Bayam Segar");

    let order = store
        .place_order(cart(fx.customer_id, vec![LineRequest::new(bayam, 1)]))
        .await
        .expect("place_order should succeed");

    let err = store
        .update_status(order.id, OrderStatus::Shipped)
        .await
        .expect_err("pending -> shipped is illegal");
    assert_eq!(
        err,
        OrderError::InvalidState("Cannot change order status from pending to shipped".to_string())
    );

    let err = store
        .update_status(order.id, OrderStatus::Pending)
        .await
        .expect_err("same status is illegal");
    assert!(matches!(err, OrderError::InvalidState(_)));

    let err = store
        .update_payment_status(order.id, PaymentStatus::Refunded)
        .await
        .expect_err("unpaid -> refunded is illegal");
    assert!(matches!(err, OrderError::InvalidState(_)));

    let paid = store
        .update_payment_status(order.id, PaymentStatus::Paid)
        .await
        .expect("unpaid -> paid");
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    let refunded = store
        .update_payment_status(order.id, PaymentStatus::Refunded)
        .await
        .expect("paid -> refunded");
    assert_eq!(refunded.payment_status, PaymentStatus::Refunded);

    let err = store
        .update_status(987_654_321, OrderStatus::Processing)
        .await
        .expect_err("missing order");
    assert_eq!(err, OrderError::OrderNotFound);
}

// =============================================================================
// Queries
// =============================================================================

pub async fn test_list_orders<S: OrderStore + CatalogWriter>(store: &S) {
    let fx = fixture(store, "list").await;
    let bayam = fx.product("Bayam Segar");

    let mut placed = Vec::new();
    for _ in 0..3 {
        let order = store
            .place_order(cart(fx.customer_id, vec![LineRequest::new(bayam, 1)]))
            .await
            .expect("place_order should succeed");
        placed.push(order.id);
    }
    store
        .place_order(cart(fx.other_id, vec![LineRequest::new(bayam, 1)]))
        .await
        .expect("place_order should succeed");
    store
        .cancel_order(placed[0], OrderScope::All)
        .await
        .expect("cancel should succeed");

    let scope = OrderScope::owned_by(fx.customer_id);
    let first = store
        .list_orders(&OrderFilter::new(scope, 1, 2))
        .await
        .expect("list_orders should succeed");
    assert_eq!(first.count, 3);
    assert_eq!(first.page, 1);
    assert_eq!(first.total_pages, 2);
    let ids: Vec<i64> = first.orders.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![placed[2], placed[1]]);
    assert!(first.orders.iter().all(|o| o.customer.is_some()));

    let second = store
        .list_orders(&OrderFilter::new(scope, 2, 2))
        .await
        .expect("list_orders should succeed");
    assert_eq!(second.orders.len(), 1);
    assert_eq!(second.orders[0].id, placed[0]);

    let mut cancelled = OrderFilter::new(scope, 1, 10);
    cancelled.status = Some(OrderStatus::Cancelled);
    let page = store
        .list_orders(&cancelled)
        .await
        .expect("list_orders should succeed");
    assert_eq!(page.count, 1);
    assert_eq!(page.orders[0].id, placed[0]);

    let mut paid = OrderFilter::new(scope, 1, 10);
    paid.payment_status = Some(PaymentStatus::Paid);
    assert_eq!(
        store.list_orders(&paid).await.expect("list_orders").count,
        0
    );
}

pub async fn test_stats<S: OrderStore + CatalogWriter>(store: &S) {
    let fx = fixture(store, "stats").await;
    let bayam = fx.product("Bayam Segar");
    let before = store.stats().await.expect("stats should succeed");

    let kept = store
        .place_order(cart(fx.customer_id, vec![LineRequest::new(bayam, 2)]))
        .await
        .expect("place_order should succeed");
    let dropped = store
        .place_order(cart(fx.customer_id, vec![LineRequest::new(bayam, 3)]))
        .await
        .expect("place_order should succeed");
    store
        .place_order(cart(fx.customer_id, vec![LineRequest::new(bayam, 1)]))
        .await
        .expect("place_order should succeed");

    for id in [kept.id, dropped.id] {
        store
            .update_payment_status(id, PaymentStatus::Paid)
            .await
            .expect("unpaid -> paid");
    }
    store
        .update_status(kept.id, OrderStatus::Processing)
        .await
        .expect("pending -> processing");
    store
        .cancel_order(dropped.id, OrderScope::All)
        .await
        .expect("cancel should succeed");

    let after = store.stats().await.expect("stats should succeed");
    assert_eq!(after.total_orders - before.total_orders, 3);
    assert_eq!(after.pending_orders - before.pending_orders, 1);
    assert_eq!(after.processing_orders - before.processing_orders, 1);
    assert_eq!(after.cancelled_orders - before.cancelled_orders, 1);
    assert_eq!(
        after.total_revenue.cents() - before.total_revenue.cents(),
        Money::from_major(10_000).cents()
    );
}

/// Run all OrderStore interface tests against a store implementation.
#[macro_export]
macro_rules! run_order_store_tests {
    ($store:expr) => {
        use $crate::storage::order_store_tests::*;

        // placement
        test_place_order_single_line($store).await;
        println!("  test_place_order_single_line: PASSED");

        test_place_order_applies_discount($store).await;
        println!("  test_place_order_applies_discount: PASSED");

        test_place_order_hydrates($store).await;
        println!("  test_place_order_hydrates: PASSED");

        test_place_order_rejects_bad_carts($store).await;
        println!("  test_place_order_rejects_bad_carts: PASSED");

        test_place_order_is_atomic($store).await;
        println!("  test_place_order_is_atomic: PASSED");

        test_duplicate_lines_share_stock($store).await;
        println!("  test_duplicate_lines_share_stock: PASSED");

        // cancellation
        test_cancel_restores_stock_once($store).await;
        println!("  test_cancel_restores_stock_once: PASSED");

        test_cancel_delivered_rejected($store).await;
        println!("  test_cancel_delivered_rejected: PASSED");

        test_cancel_out_of_scope($store).await;
        println!("  test_cancel_out_of_scope: PASSED");

        // administration
        test_admin_cancel_restores_stock($store).await;
        println!("  test_admin_cancel_restores_stock: PASSED");

        test_illegal_transitions($store).await;
        println!("  test_illegal_transitions: PASSED");

        // queries
        test_list_orders($store).await;
        println!("  test_list_orders: PASSED");

        test_stats($store).await;
        println!("  test_stats: PASSED");
    };
}
