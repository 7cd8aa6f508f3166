//! Business types and rules for the order workflow.
//!
//! Nothing in here performs I/O; the store and service layers feed these
//! types with rows and requests.

pub mod identity;
pub mod money;
pub mod order;
pub mod pricing;
pub mod status;

pub use identity::{Identity, OrderScope, Role, User};
pub use money::{DiscountRate, Money};
pub use order::{
    CustomerSummary, LineRequest, NewOrder, Order, OrderItem, PlaceOrder, Product,
    ProductSummary,
};
pub use pricing::{check_cart_shape, price_line, require_product, PricedCart, PricedLine};
pub use status::{OrderStatus, PaymentMethod, PaymentStatus, UnknownValue};
