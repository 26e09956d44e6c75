//! Order, payment, and fraud-flag domain types.

use chrono::{DateTime, Utc};
use dragonfruit_core::{
    AdminId, CartId, CustomerId, FraudFlagId, FraudSeverity, Money, OrderId, OrderStatus,
    PaymentId, PaymentStatus,
};

/// A placed order.
///
/// `order_status` and `payment_status` are independent columns with no
/// transition guard: an update may move either to any other value.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    /// Cart the order was placed from, if any.
    pub cart_id: Option<CartId>,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub total_price: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A payment attempt against an order. Payments are never deleted; a failed
/// or reversed payment moves status instead.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    /// Settlement rail, e.g. "card", "bank_transfer", "mileage".
    pub method: String,
    pub amount: Money,
    pub status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An admin-recorded fraud marker on an order.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FraudFlag {
    pub id: FraudFlagId,
    pub order_id: OrderId,
    /// Admin who recorded the flag.
    pub admin_id: AdminId,
    pub severity: FraudSeverity,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}
