//! Order aggregate, line items and catalog records.

use serde::Serialize;

use super::money::{DiscountRate, Money};
use super::status::{OrderStatus, PaymentMethod, PaymentStatus};

/// A product row as read by the order workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: Money,
    pub discount: DiscountRate,
    pub stock: i64,
    pub unit: String,
    pub image_url: Option<String>,
    pub is_available: bool,
}

impl Product {
    /// Unit price after the product's discount.
    pub fn final_price(&self) -> Money {
        self.price.discounted(self.discount)
    }

    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id,
            name: self.name.clone(),
            image_url: self.image_url.clone(),
            unit: self.unit.clone(),
        }
    }
}

/// One requested cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRequest {
    pub product_id: i64,
    pub quantity: u32,
}

impl LineRequest {
    pub fn new(product_id: i64, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Order metadata and cart, before the acting user is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub items: Vec<LineRequest>,
    pub payment_method: PaymentMethod,
    pub shipping_address: String,
    pub notes: Option<String>,
}

/// A cart submitted on behalf of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceOrder {
    pub user_id: i64,
    pub items: Vec<LineRequest>,
    pub payment_method: PaymentMethod,
    pub shipping_address: String,
    pub notes: Option<String>,
}

impl NewOrder {
    pub fn for_user(self, user_id: i64) -> PlaceOrder {
        PlaceOrder {
            user_id,
            items: self.items,
            payment_method: self.payment_method,
            shipping_address: self.shipping_address,
            notes: self.notes,
        }
    }
}

/// Product fields embedded in an order item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSummary {
    pub id: i64,
    pub name: String,
    pub image_url: Option<String>,
    pub unit: String,
}

/// Customer fields embedded in an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// A persisted order line. `price` is the unit price at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: u32,
    pub price: Money,
    pub subtotal: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductSummary>,
}

/// A persisted order together with its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub order_number: String,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub shipping_address: String,
    pub notes: Option<String>,
    pub order_date: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(rename = "user", skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerSummary>,
    #[serde(rename = "orderItems")]
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Sum of line subtotals; equals `total_amount` for every stored order.
    pub fn items_total(&self) -> Money {
        self.items.iter().map(|item| item.subtotal).sum()
    }
}
