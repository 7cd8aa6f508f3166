//! HTTP handlers.
//!
//! - `rest`: axum router for the order API under `/api`
//! - `response`: JSON envelope, error mapping and caller extraction

pub mod response;
pub mod rest;

pub use rest::{router, AppState};
