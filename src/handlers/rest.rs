//! REST API for the order workflow.
//!
//! Endpoints, all under `/api`:
//! - `GET /health`
//! - `GET /orders`, `POST /orders`
//! - `GET /orders/stats` (admin)
//! - `GET /orders/:id`
//! - `PUT /orders/:id/status` (admin), `PUT /orders/:id/payment` (admin)
//! - `PUT /orders/:id/cancel`

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::response::{ApiError, ApiResponse, Caller};
use crate::config::AuthConfig;
use crate::domain::{Order, OrderStatus, PaymentStatus};
use crate::interfaces::OrderStats;
use crate::services::{ListOrders, OrderService};
use crate::validation::{validate_place_order, PlaceOrderBody};

type ApiResult<T> = Result<T, ApiError>;

/// Shared state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: OrderService,
    /// Lowercased name of the header carrying the caller's user id.
    pub user_header: String,
}

impl AppState {
    pub fn new(service: OrderService, auth: &AuthConfig) -> Self {
        Self {
            service,
            user_header: auth.user_header.to_ascii_lowercase(),
        }
    }
}

/// Build the axum router (separated for testing).
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/stats", get(order_stats))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/status", put(update_status))
        .route("/orders/:id/payment", put(update_payment_status))
        .route("/orders/:id/cancel", put(cancel_order));

    Router::new()
        .nest("/api", api)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct ListOrdersQuery {
    status: Option<String>,
    payment_status: Option<String>,
    page: Option<String>,
    limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StatusBody {
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PaymentBody {
    #[serde(default)]
    payment_status: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    success: bool,
    message: &'static str,
    timestamp: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderListResponse {
    success: bool,
    count: u64,
    page: u32,
    total_pages: u64,
    data: Vec<Order>,
}

// ============================================================================
// Helpers
// ============================================================================

fn order_id(raw: &str) -> ApiResult<i64> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid order id: {raw}")))
}

/// Empty query values count as absent.
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn positive(name: &str, value: Option<&str>) -> ApiResult<Option<u32>> {
    present(value)
        .map(|v| {
            v.parse::<u32>()
                .map_err(|_| ApiError::bad_request(format!("{name} must be a positive integer")))
        })
        .transpose()
}

impl ListOrdersQuery {
    fn parse(&self) -> ApiResult<ListOrders> {
        let status = present(self.status.as_deref())
            .map(str::parse::<OrderStatus>)
            .transpose()
            .map_err(|e| ApiError::bad_request(e.to_string()))?;
        let payment_status = present(self.payment_status.as_deref())
            .map(str::parse::<PaymentStatus>)
            .transpose()
            .map_err(|e| ApiError::bad_request(e.to_string()))?;

        Ok(ListOrders {
            status,
            payment_status,
            page: positive("page", self.page.as_deref())?,
            limit: positive("limit", self.limit.as_deref())?,
        })
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: "API is running",
        timestamp: Utc::now().to_rfc3339(),
    })
}

async fn not_found() -> ApiError {
    ApiError::not_found("Endpoint not found")
}

async fn create_order(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<PlaceOrderBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Order>>)> {
    let Json(body) = body?;
    let order = validate_place_order(body).map_err(ApiError::validation)?;
    let placed = state.service.place_order(caller, order).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(placed, "Order created successfully")),
    ))
}

async fn list_orders(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Query(query): Query<ListOrdersQuery>,
) -> ApiResult<Json<OrderListResponse>> {
    let page = state.service.list_orders(caller, query.parse()?).await?;

    Ok(Json(OrderListResponse {
        success: true,
        count: page.count,
        page: page.page,
        total_pages: page.total_pages,
        data: page.orders,
    }))
}

async fn order_stats(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> ApiResult<Json<ApiResponse<OrderStats>>> {
    let stats = state.service.stats(caller).await?;
    Ok(Json(ApiResponse::data(stats)))
}

async fn get_order(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Order>>> {
    let order = state.service.get_order(caller, order_id(&id)?).await?;
    Ok(Json(ApiResponse::data(order)))
}

async fn update_status(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    body: Result<Json<StatusBody>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<Order>>> {
    let id = order_id(&id)?;
    let Json(body) = body?;
    let status = present(body.status.as_deref())
        .ok_or_else(|| ApiError::bad_request("Status is required"))?
        .parse::<OrderStatus>()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let order = state.service.update_status(caller, id, status).await?;
    Ok(Json(ApiResponse::with_message(
        order,
        "Order status updated successfully",
    )))
}

async fn update_payment_status(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    body: Result<Json<PaymentBody>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<Order>>> {
    let id = order_id(&id)?;
    let Json(body) = body?;
    let status = present(body.payment_status.as_deref())
        .ok_or_else(|| ApiError::bad_request("Payment status is required"))?
        .parse::<PaymentStatus>()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let order = state
        .service
        .update_payment_status(caller, id, status)
        .await?;
    Ok(Json(ApiResponse::with_message(
        order,
        "Payment status updated successfully",
    )))
}

async fn cancel_order(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Order>>> {
    let order = state.service.cancel_order(caller, order_id(&id)?).await?;
    Ok(Json(ApiResponse::with_message(
        order,
        "Order cancelled successfully",
    )))
}
