//! Order, payment, and fraud-flag handlers.
//!
//! Customers own their orders; admins see every order. Status columns have
//! no transition guard - an update may move either status to any value.

use axum::http::StatusCode;
use axum::routing::{get, patch, post, put};
use axum::{
    Json, Router,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dragonfruit_core::{
    AdminId, CartId, CustomerId, FraudFlagId, FraudSeverity, Money, OrderId, OrderStatus, Page,
    PageRequest, Patch, PaymentId, PaymentStatus,
};

use crate::db::carts::CartRepository;
use crate::db::orders::{
    FraudFlagFilter, FraudFlagRepository, NewOrder, NewPayment, OrderChanges, OrderFilter,
    OrderRepository, OrderSortKey, PaymentChanges, PaymentRepository,
};
use crate::error::{ApiError, Result};
use crate::middleware::auth::{AdminAuth, CustomerAuth};
use crate::models::order::{FraudFlag, Order, Payment};
use crate::state::AppState;

const ORDER_PAGE_LIMIT: u32 = 20;

/// Routes for this module.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Customer
        .route("/customer/orders", post(create_order).patch(list_my_orders))
        .route(
            "/customer/orders/{order_id}",
            get(get_order).put(update_order).delete(delete_order),
        )
        .route(
            "/customer/orders/{order_id}/payments",
            post(create_payment).patch(list_payments),
        )
        .route(
            "/customer/orders/{order_id}/payments/{payment_id}",
            put(update_payment),
        )
        // Admin
        .route("/admin/orders", patch(admin_list_orders))
        .route("/admin/orders/{order_id}", put(admin_update_order))
        .route("/admin/orders/{order_id}/fraud-flags", post(create_fraud_flag))
        .route("/admin/fraud-flags", patch(list_fraud_flags))
        .route(
            "/admin/fraud-flags/{flag_id}",
            axum::routing::delete(delete_fraud_flag),
        )
}

// =============================================================================
// DTOs
// =============================================================================

/// Wire shape of an order.
#[derive(Debug, Serialize)]
pub struct OrderDto {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub cart_id: Option<CartId>,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub total_price: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderDto {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            customer_id: order.customer_id,
            cart_id: order.cart_id,
            order_status: order.order_status,
            payment_status: order.payment_status,
            total_price: order.total_price,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// Wire shape of a payment.
#[derive(Debug, Serialize)]
pub struct PaymentDto {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub method: String,
    pub amount: Money,
    pub status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Payment> for PaymentDto {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            order_id: payment.order_id,
            method: payment.method,
            amount: payment.amount,
            status: payment.status,
            paid_at: payment.paid_at,
            created_at: payment.created_at,
            updated_at: payment.updated_at,
        }
    }
}

/// Wire shape of a fraud flag.
#[derive(Debug, Serialize)]
pub struct FraudFlagDto {
    pub id: FraudFlagId,
    pub order_id: OrderId,
    pub admin_id: AdminId,
    pub severity: FraudSeverity,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl From<FraudFlag> for FraudFlagDto {
    fn from(flag: FraudFlag) -> Self {
        Self {
            id: flag.id,
            order_id: flag.order_id,
            admin_id: flag.admin_id,
            severity: flag.severity,
            reason: flag.reason,
            created_at: flag.created_at,
        }
    }
}

// =============================================================================
// Customer orders
// =============================================================================

/// Order create request. When `cart_id` is present the caller must own the
/// cart; the order remembers which cart it came from.
#[derive(Debug, Deserialize)]
pub struct OrderCreateBody {
    pub cart_id: Option<CartId>,
    pub total_price: Money,
}

/// `POST /customer/orders`
async fn create_order(
    State(state): State<AppState>,
    CustomerAuth(customer_id): CustomerAuth,
    Json(body): Json<OrderCreateBody>,
) -> Result<Json<OrderDto>> {
    if let Some(cart_id) = body.cart_id {
        let cart = CartRepository::new(state.pool())
            .find_by_id(cart_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("cart".to_owned()))?;
        if cart.customer_id != customer_id {
            return Err(ApiError::Forbidden(
                "cart belongs to a different customer".to_owned(),
            ));
        }
    }

    let order = OrderRepository::new(state.pool())
        .create(NewOrder {
            id: OrderId::new(state.ids().new_id()),
            customer_id,
            cart_id: body.cart_id,
            total_price: body.total_price,
            now: state.clock().now(),
        })
        .await?;

    Ok(Json(order.into()))
}

/// Order listing request for customers; the owner filter comes from the
/// token.
#[derive(Debug, Default, Deserialize)]
pub struct OrderListRequest {
    #[serde(flatten)]
    pub page: PageRequest,
    pub sort: Option<String>,
    pub order_status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

/// `PATCH /customer/orders`
async fn list_my_orders(
    State(state): State<AppState>,
    CustomerAuth(customer_id): CustomerAuth,
    Json(body): Json<OrderListRequest>,
) -> Result<Json<Page<OrderDto>>> {
    let resolved = body.page.resolve(ORDER_PAGE_LIMIT);
    let filter = OrderFilter {
        customer_id: Some(customer_id),
        order_status: body.order_status,
        payment_status: body.payment_status,
    };
    let sort = OrderSortKey::from_param(body.sort.as_deref());

    let (records, orders) = OrderRepository::new(state.pool())
        .search(&filter, sort, resolved)
        .await?;

    Ok(Json(Page::new(resolved, records, orders).map(OrderDto::from)))
}

/// `GET /customer/orders/{order_id}`
async fn get_order(
    State(state): State<AppState>,
    CustomerAuth(customer_id): CustomerAuth,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderDto>> {
    let order = require_owned_order(&state, order_id, customer_id).await?;
    Ok(Json(order.into()))
}

/// Sparse status patch for an order. Both fields are non-nullable columns.
#[derive(Debug, Default, Deserialize)]
pub struct OrderUpdateBody {
    #[serde(default)]
    pub order_status: Patch<OrderStatus>,
    #[serde(default)]
    pub payment_status: Patch<PaymentStatus>,
}

impl OrderUpdateBody {
    fn into_changes(self) -> Result<OrderChanges> {
        if matches!(self.order_status, Patch::Null) {
            return Err(ApiError::Validation("order_status cannot be null".to_owned()));
        }
        if matches!(self.payment_status, Patch::Null) {
            return Err(ApiError::Validation(
                "payment_status cannot be null".to_owned(),
            ));
        }
        Ok(OrderChanges {
            order_status: self.order_status,
            payment_status: self.payment_status,
        })
    }
}

/// `PUT /customer/orders/{order_id}`
async fn update_order(
    State(state): State<AppState>,
    CustomerAuth(customer_id): CustomerAuth,
    Path(order_id): Path<OrderId>,
    Json(body): Json<OrderUpdateBody>,
) -> Result<Json<OrderDto>> {
    let changes = body.into_changes()?;
    let order = require_owned_order(&state, order_id, customer_id).await?;

    let order = OrderRepository::new(state.pool())
        .update(order.id, &changes, state.clock().now())
        .await?;

    Ok(Json(order.into()))
}

/// `DELETE /customer/orders/{order_id}`
async fn delete_order(
    State(state): State<AppState>,
    CustomerAuth(customer_id): CustomerAuth,
    Path(order_id): Path<OrderId>,
) -> Result<StatusCode> {
    let order = require_owned_order(&state, order_id, customer_id).await?;

    OrderRepository::new(state.pool())
        .soft_delete(order.id, state.clock().now())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Admin orders
// =============================================================================

/// Order listing request for admins; may scope to one customer.
#[derive(Debug, Default, Deserialize)]
pub struct AdminOrderListRequest {
    #[serde(flatten)]
    pub page: PageRequest,
    pub sort: Option<String>,
    pub customer_id: Option<CustomerId>,
    pub order_status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

/// `PATCH /admin/orders`
async fn admin_list_orders(
    State(state): State<AppState>,
    AdminAuth(_admin_id): AdminAuth,
    Json(body): Json<AdminOrderListRequest>,
) -> Result<Json<Page<OrderDto>>> {
    let resolved = body.page.resolve(ORDER_PAGE_LIMIT);
    let filter = OrderFilter {
        customer_id: body.customer_id,
        order_status: body.order_status,
        payment_status: body.payment_status,
    };
    let sort = OrderSortKey::from_param(body.sort.as_deref());

    let (records, orders) = OrderRepository::new(state.pool())
        .search(&filter, sort, resolved)
        .await?;

    Ok(Json(Page::new(resolved, records, orders).map(OrderDto::from)))
}

/// `PUT /admin/orders/{order_id}`
async fn admin_update_order(
    State(state): State<AppState>,
    AdminAuth(_admin_id): AdminAuth,
    Path(order_id): Path<OrderId>,
    Json(body): Json<OrderUpdateBody>,
) -> Result<Json<OrderDto>> {
    let changes = body.into_changes()?;
    let order = OrderRepository::new(state.pool())
        .update(order_id, &changes, state.clock().now())
        .await?;

    Ok(Json(order.into()))
}

// =============================================================================
// Payments
// =============================================================================

/// Payment create request. `order_id`, when present, must match the path.
#[derive(Debug, Deserialize)]
pub struct PaymentCreateBody {
    pub order_id: Option<OrderId>,
    pub method: String,
    pub amount: Money,
}

/// `POST /customer/orders/{order_id}/payments`
async fn create_payment(
    State(state): State<AppState>,
    CustomerAuth(customer_id): CustomerAuth,
    Path(order_id): Path<OrderId>,
    Json(body): Json<PaymentCreateBody>,
) -> Result<Json<PaymentDto>> {
    if let Some(body_order_id) = body.order_id
        && body_order_id != order_id
    {
        return Err(ApiError::Validation(
            "body order_id does not match the path".to_owned(),
        ));
    }
    if body.method.is_empty() {
        return Err(ApiError::Validation("method cannot be empty".to_owned()));
    }

    let order = require_owned_order(&state, order_id, customer_id).await?;

    let payment = PaymentRepository::new(state.pool())
        .create(NewPayment {
            id: PaymentId::new(state.ids().new_id()),
            order_id: order.id,
            method: body.method,
            amount: body.amount,
            now: state.clock().now(),
        })
        .await?;

    Ok(Json(payment.into()))
}

/// Payment listing request.
#[derive(Debug, Default, Deserialize)]
pub struct PaymentListRequest {
    #[serde(flatten)]
    pub page: PageRequest,
}

/// `PATCH /customer/orders/{order_id}/payments`
async fn list_payments(
    State(state): State<AppState>,
    CustomerAuth(customer_id): CustomerAuth,
    Path(order_id): Path<OrderId>,
    Json(body): Json<PaymentListRequest>,
) -> Result<Json<Page<PaymentDto>>> {
    let order = require_owned_order(&state, order_id, customer_id).await?;

    let resolved = body.page.resolve(ORDER_PAGE_LIMIT);
    let (records, payments) = PaymentRepository::new(state.pool())
        .list_by_order(order.id, resolved)
        .await?;

    Ok(Json(
        Page::new(resolved, records, payments).map(PaymentDto::from),
    ))
}

/// Sparse patch for a payment. `paid_at: null` clears the settlement time;
/// `status` is non-nullable.
#[derive(Debug, Default, Deserialize)]
pub struct PaymentUpdateBody {
    #[serde(default)]
    pub status: Patch<PaymentStatus>,
    #[serde(default)]
    pub paid_at: Patch<DateTime<Utc>>,
}

/// `PUT /customer/orders/{order_id}/payments/{payment_id}`
async fn update_payment(
    State(state): State<AppState>,
    CustomerAuth(customer_id): CustomerAuth,
    Path((order_id, payment_id)): Path<(OrderId, PaymentId)>,
    Json(body): Json<PaymentUpdateBody>,
) -> Result<Json<PaymentDto>> {
    if matches!(body.status, Patch::Null) {
        return Err(ApiError::Validation("status cannot be null".to_owned()));
    }

    let order = require_owned_order(&state, order_id, customer_id).await?;

    let repo = PaymentRepository::new(state.pool());
    let payment = repo
        .find_by_id(payment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("payment".to_owned()))?;
    if payment.order_id != order.id {
        return Err(ApiError::NotFound("payment".to_owned()));
    }

    let changes = PaymentChanges {
        status: body.status,
        paid_at: body.paid_at,
    };
    let payment = repo
        .update(payment.id, &changes, state.clock().now())
        .await?;

    Ok(Json(payment.into()))
}

// =============================================================================
// Fraud flags
// =============================================================================

/// Fraud flag create request.
#[derive(Debug, Deserialize)]
pub struct FraudFlagCreateBody {
    pub severity: FraudSeverity,
    pub reason: String,
}

/// `POST /admin/orders/{order_id}/fraud-flags`
async fn create_fraud_flag(
    State(state): State<AppState>,
    AdminAuth(admin_id): AdminAuth,
    Path(order_id): Path<OrderId>,
    Json(body): Json<FraudFlagCreateBody>,
) -> Result<Json<FraudFlagDto>> {
    let order = OrderRepository::new(state.pool())
        .find_by_id(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("order".to_owned()))?;

    let flag = FraudFlagRepository::new(state.pool())
        .create(
            FraudFlagId::new(state.ids().new_id()),
            order.id,
            admin_id,
            body.severity,
            &body.reason,
            state.clock().now(),
        )
        .await?;

    Ok(Json(flag.into()))
}

/// Fraud flag listing request.
#[derive(Debug, Default, Deserialize)]
pub struct FraudFlagListRequest {
    #[serde(flatten)]
    pub page: PageRequest,
    pub order_id: Option<OrderId>,
    pub severity: Option<FraudSeverity>,
}

/// `PATCH /admin/fraud-flags`
async fn list_fraud_flags(
    State(state): State<AppState>,
    AdminAuth(_admin_id): AdminAuth,
    Json(body): Json<FraudFlagListRequest>,
) -> Result<Json<Page<FraudFlagDto>>> {
    let resolved = body.page.resolve(ORDER_PAGE_LIMIT);
    let filter = FraudFlagFilter {
        order_id: body.order_id,
        severity: body.severity,
    };

    let (records, flags) = FraudFlagRepository::new(state.pool())
        .search(&filter, resolved)
        .await?;

    Ok(Json(
        Page::new(resolved, records, flags).map(FraudFlagDto::from),
    ))
}

/// `DELETE /admin/fraud-flags/{flag_id}`
async fn delete_fraud_flag(
    State(state): State<AppState>,
    AdminAuth(_admin_id): AdminAuth,
    Path(flag_id): Path<FraudFlagId>,
) -> Result<StatusCode> {
    FraudFlagRepository::new(state.pool()).delete(flag_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Load a live order and verify the caller owns it.
async fn require_owned_order(
    state: &AppState,
    order_id: OrderId,
    customer_id: CustomerId,
) -> Result<Order> {
    let order = OrderRepository::new(state.pool())
        .find_by_id(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("order".to_owned()))?;

    if order.customer_id != customer_id {
        return Err(ApiError::Forbidden(
            "order belongs to a different customer".to_owned(),
        ));
    }
    Ok(order)
}
