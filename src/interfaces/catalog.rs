//! Catalog and user lookups consumed by the order workflow.

use async_trait::async_trait;

use crate::domain::{DiscountRate, Money, Product, Role, User};
use crate::error::Result;

/// Read access to the product catalog.
///
/// Implementations:
/// - `SqliteOrderStore` / `PostgresOrderStore`: SQL storage
/// - `MockOrderStore`: in-memory, for tests
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// Current price, discount, stock and availability of a product.
    ///
    /// Returns `None` if no product has this id.
    async fn get_product(&self, product_id: i64) -> Result<Option<Product>>;
}

/// Read access to user accounts.
///
/// Accounts are created and authenticated elsewhere; the order workflow only
/// resolves the caller named by the gateway.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, user_id: i64) -> Result<Option<User>>;
}

/// A user account to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
}

/// A product category to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
}

/// A product to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub category_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub discount: DiscountRate,
    pub stock: i64,
    pub unit: String,
    pub image_url: Option<String>,
    pub is_available: bool,
}

/// Write access to users and the catalog.
///
/// Only demo seeding and test fixtures use this; account and catalog
/// management belong to their own services.
#[async_trait]
pub trait CatalogWriter: Send + Sync {
    async fn insert_user(&self, user: NewUser) -> Result<i64>;

    async fn insert_category(&self, category: NewCategory) -> Result<i64>;

    async fn insert_product(&self, product: NewProduct) -> Result<i64>;

    async fn product_count(&self) -> Result<u64>;
}
