//! Service layer: authorization and orchestration over the stores.

pub mod order_service;

pub use order_service::{ListOrders, OrderService};
