//! Error taxonomy for the order workflow.

use crate::domain::UnknownValue;

/// Result type for order workflow operations.
pub type Result<T> = std::result::Result<T, OrderError>;

/// Errors from order placement, cancellation and administration.
///
/// Business rejections and persistence failures share one type because
/// rejections are detected inside the store's transaction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Product with ID {0} not found")]
    ProductNotFound(i64),

    #[error("Order not found")]
    OrderNotFound,

    #[error("Product {product} is not available")]
    Unavailable { product: String },

    #[error("Insufficient stock for product {product}")]
    InsufficientStock { product: String },

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl OrderError {
    /// Whether the error is a rule rejection rather than an infrastructure failure.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::Persistence(_))
    }
}

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        OrderError::Persistence(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for OrderError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        OrderError::Persistence(err.to_string())
    }
}

impl From<UnknownValue> for OrderError {
    fn from(err: UnknownValue) -> Self {
        OrderError::InvalidRequest(err.to_string())
    }
}
