//! Fresh Mart - grocery order backend
//!
//! Order placement with atomic stock reservation, cancellation with stock
//! compensation, and administrative status management, served over a JSON
//! REST API backed by SQLite or PostgreSQL.

pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod interfaces;
pub mod services;
pub mod storage;
pub mod utils;
pub mod validation;
