//! Input validation for external data.
//!
//! The place-order body is accepted loosely typed so that every bad field can
//! be reported at once instead of failing on the first deserialization error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{LineRequest, NewOrder, PaymentMethod};

/// Length limits for validated fields.
pub mod limits {
    /// Maximum number of lines in one cart.
    pub const MAX_ORDER_LINES: usize = 100;
    /// Maximum shipping address length.
    pub const MAX_SHIPPING_ADDRESS_LENGTH: usize = 1000;
    /// Maximum notes length.
    pub const MAX_NOTES_LENGTH: usize = 2000;
}

/// Error constants for validation failures.
pub mod errmsg {
    pub const VALIDATION_FAILED: &str = "Validation failed";

    pub const ITEMS_REQUIRED: &str = "Items are required and must contain at least 1 item";
    pub const ITEMS_TOO_MANY: &str = "Too many items in one order";
    pub const PRODUCT_ID_INTEGER: &str = "Product ID must be an integer";
    pub const QUANTITY_MIN: &str = "Quantity must be at least 1";

    pub const PAYMENT_METHOD_INVALID: &str = "Payment method is not valid";
    pub const SHIPPING_ADDRESS_REQUIRED: &str = "Shipping address is required";
    pub const SHIPPING_ADDRESS_TOO_LONG: &str = "Shipping address exceeds maximum length";
    pub const NOTES_TOO_LONG: &str = "Notes exceed maximum length";
}

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: &str) -> Self {
        Self {
            field: field.into(),
            message: message.to_string(),
        }
    }
}

/// Cart line as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceOrderLine {
    #[serde(default)]
    pub product_id: Option<Value>,
    #[serde(default)]
    pub quantity: Option<Value>,
}

/// Place-order request body as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceOrderBody {
    #[serde(default)]
    pub items: Option<Vec<PlaceOrderLine>>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Integers may arrive as JSON numbers or numeric strings.
fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn validate_line(index: usize, line: &PlaceOrderLine, errors: &mut Vec<FieldError>) -> Option<LineRequest> {
    let product_id = line.product_id.as_ref().and_then(integer);
    if product_id.is_none() {
        errors.push(FieldError::new(
            format!("items[{index}].product_id"),
            errmsg::PRODUCT_ID_INTEGER,
        ));
    }

    let quantity = line
        .quantity
        .as_ref()
        .and_then(integer)
        .and_then(|q| u32::try_from(q).ok())
        .filter(|q| *q >= 1);
    if quantity.is_none() {
        errors.push(FieldError::new(
            format!("items[{index}].quantity"),
            errmsg::QUANTITY_MIN,
        ));
    }

    Some(LineRequest::new(product_id?, quantity?))
}

/// Validate a place-order body, collecting every field error.
///
/// Text fields are trimmed; blank notes are dropped.
pub fn validate_place_order(body: PlaceOrderBody) -> Result<NewOrder, Vec<FieldError>> {
    let mut errors = Vec::new();

    let mut items = Vec::new();
    match body.items.as_deref() {
        None | Some([]) => errors.push(FieldError::new("items", errmsg::ITEMS_REQUIRED)),
        Some(lines) if lines.len() > limits::MAX_ORDER_LINES => {
            errors.push(FieldError::new("items", errmsg::ITEMS_TOO_MANY))
        }
        Some(lines) => {
            for (index, line) in lines.iter().enumerate() {
                if let Some(line) = validate_line(index, line, &mut errors) {
                    items.push(line);
                }
            }
        }
    }

    let payment_method = body
        .payment_method
        .as_deref()
        .and_then(|m| m.trim().parse::<PaymentMethod>().ok());
    if payment_method.is_none() {
        errors.push(FieldError::new(
            "payment_method",
            errmsg::PAYMENT_METHOD_INVALID,
        ));
    }

    let shipping_address = body
        .shipping_address
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    if shipping_address.is_empty() {
        errors.push(FieldError::new(
            "shipping_address",
            errmsg::SHIPPING_ADDRESS_REQUIRED,
        ));
    } else if shipping_address.chars().count() > limits::MAX_SHIPPING_ADDRESS_LENGTH {
        errors.push(FieldError::new(
            "shipping_address",
            errmsg::SHIPPING_ADDRESS_TOO_LONG,
        ));
    }

    let notes = body
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);
    if notes
        .as_ref()
        .is_some_and(|n| n.chars().count() > limits::MAX_NOTES_LENGTH)
    {
        errors.push(FieldError::new("notes", errmsg::NOTES_TOO_LONG));
    }

    match payment_method {
        Some(payment_method) if errors.is_empty() => Ok(NewOrder {
            items,
            payment_method,
            shipping_address,
            notes,
        }),
        _ => Err(errors),
    }
}
