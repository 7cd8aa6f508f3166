//! Order workflow tuning.

use serde::Deserialize;

use crate::storage::sql::DEFAULT_ORDER_NUMBER_ATTEMPTS;

/// Listing and placement limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrdersConfig {
    /// Page size when a listing request names none.
    pub default_page_size: u32,
    /// Largest page size a listing request may ask for.
    pub max_page_size: u32,
    /// Order numbers drawn before a placement gives up on collisions.
    pub order_number_attempts: u32,
}

impl Default for OrdersConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
            order_number_attempts: DEFAULT_ORDER_NUMBER_ATTEMPTS,
        }
    }
}

impl OrdersConfig {
    /// Resolve a requested page size against the defaults and the cap.
    pub fn page_size(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1))
    }
}
