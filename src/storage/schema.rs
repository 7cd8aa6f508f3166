//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.
//! The tables themselves are created by the migrations under `migrations/`.

use sea_query::Iden;

/// Users table schema.
#[derive(Iden, Clone, Copy)]
pub enum Users {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "name"]
    Name,
    #[iden = "email"]
    Email,
    #[iden = "role"]
    Role,
    #[iden = "phone"]
    Phone,
    #[iden = "address"]
    Address,
    #[iden = "is_active"]
    IsActive,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}

/// Categories table schema.
#[derive(Iden, Clone, Copy)]
pub enum Categories {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "name"]
    Name,
    #[iden = "description"]
    Description,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}

/// Products table schema.
#[derive(Iden, Clone, Copy)]
pub enum Products {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "category_id"]
    CategoryId,
    #[iden = "name"]
    Name,
    #[iden = "description"]
    Description,
    #[iden = "price"]
    Price,
    #[iden = "stock"]
    Stock,
    #[iden = "unit"]
    Unit,
    #[iden = "image_url"]
    ImageUrl,
    #[iden = "is_available"]
    IsAvailable,
    #[iden = "discount_percentage"]
    DiscountPercentage,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}

/// Orders table schema.
#[derive(Iden, Clone, Copy)]
pub enum Orders {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "user_id"]
    UserId,
    #[iden = "order_number"]
    OrderNumber,
    #[iden = "total_amount"]
    TotalAmount,
    #[iden = "status"]
    Status,
    #[iden = "payment_method"]
    PaymentMethod,
    #[iden = "payment_status"]
    PaymentStatus,
    #[iden = "shipping_address"]
    ShippingAddress,
    #[iden = "notes"]
    Notes,
    #[iden = "order_date"]
    OrderDate,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}

/// Order items table schema.
#[derive(Iden, Clone, Copy)]
pub enum OrderItems {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "order_id"]
    OrderId,
    #[iden = "product_id"]
    ProductId,
    #[iden = "quantity"]
    Quantity,
    #[iden = "price"]
    Price,
    #[iden = "subtotal"]
    Subtotal,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}

/// Format an instant the way timestamp columns store it.
pub fn timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
