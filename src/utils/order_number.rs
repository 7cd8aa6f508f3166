//! Order number generation.
//!
//! Numbers look like `ORD-20240315-0042`: the UTC date plus a zero-padded
//! random suffix. Uniqueness is arbitrated by the store's unique constraint;
//! a conflicting draw is simply replaced by the next one.

use chrono::{DateTime, Utc};
use rand::Rng;

/// Source of candidate order numbers.
pub trait OrderNumbers: Send + Sync {
    /// Draw the next candidate for an order placed at `now`.
    fn next(&self, now: DateTime<Utc>) -> String;
}

/// Date plus a random four-digit suffix.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomOrderNumbers;

impl OrderNumbers for RandomOrderNumbers {
    fn next(&self, now: DateTime<Utc>) -> String {
        format_order_number(now, rand::rng().random_range(0..10_000))
    }
}

/// Format an order number from a date and a suffix in `0..10_000`.
pub fn format_order_number(now: DateTime<Utc>, suffix: u16) -> String {
    format!("ORD-{}-{:04}", now.format("%Y%m%d"), suffix % 10_000)
}
