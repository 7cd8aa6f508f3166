//! Abstract interfaces for the order workflow.
//!
//! These traits define the contracts for:
//! - Catalog lookups (product price, discount, stock, availability)
//! - User lookups (identity resolution)
//! - Catalog writes (demo seeding and fixtures)
//! - Order persistence (the atomic unit of work)

pub mod catalog;
pub mod order_store;

pub use catalog::{
    CatalogReader, CatalogWriter, NewCategory, NewProduct, NewUser, UserDirectory,
};
pub use order_store::{OrderFilter, OrderPage, OrderStats, OrderStore};
