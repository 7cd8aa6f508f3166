//! Per-line cart validation and pricing.
//!
//! Lines are checked in input order; the first failing line rejects the cart.

use crate::error::{OrderError, Result};

use super::money::Money;
use super::order::{LineRequest, Product};

/// A validated line with its price snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: i64,
    pub quantity: u32,
    pub price: Money,
    pub subtotal: Money,
}

/// Validated lines and their running total.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub total: Money,
}

impl PricedCart {
    pub fn push(&mut self, line: PricedLine) -> Result<()> {
        self.total = self
            .total
            .checked_add(line.subtotal)
            .ok_or_else(|| OrderError::InvalidRequest("Order total is too large".to_string()))?;
        self.lines.push(line);
        Ok(())
    }
}

/// Reject an empty cart before touching the store.
pub fn check_cart_shape(items: &[LineRequest]) -> Result<()> {
    if items.is_empty() {
        return Err(OrderError::InvalidRequest(
            "Items must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Resolve the product a line refers to.
pub fn require_product(line: &LineRequest, product: Option<Product>) -> Result<Product> {
    product.ok_or(OrderError::ProductNotFound(line.product_id))
}

/// Validate one line against the current product row and price it.
///
/// Quantity is checked first, then availability, then stock.
pub fn price_line(line: &LineRequest, product: &Product) -> Result<PricedLine> {
    if line.quantity == 0 {
        return Err(OrderError::InvalidRequest(format!(
            "Quantity for product {} must be at least 1",
            line.product_id
        )));
    }
    if !product.is_available {
        return Err(OrderError::Unavailable {
            product: product.name.clone(),
        });
    }
    if product.stock < i64::from(line.quantity) {
        return Err(OrderError::InsufficientStock {
            product: product.name.clone(),
        });
    }

    let price = product.final_price();
    let subtotal = price
        .checked_mul(line.quantity)
        .ok_or_else(|| OrderError::InvalidRequest("Line subtotal is too large".to_string()))?;

    Ok(PricedLine {
        product_id: product.id,
        quantity: line.quantity,
        price,
        subtotal,
    })
}
