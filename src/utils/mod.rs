//! Pure utility functions.
//!
//! These are helpers shared by the binary, the storage layer and tests.

pub mod bootstrap;
pub mod order_number;
pub mod retry;
