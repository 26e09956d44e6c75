//! Cart domain types.

use chrono::{DateTime, Utc};
use dragonfruit_core::{CartId, CartItemId, CartStatus, CustomerId, Money, SaleId};

/// A customer's shopping cart.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Cart {
    pub id: CartId,
    /// Owner; list endpoints force this filter from the caller's token.
    pub customer_id: CustomerId,
    pub status: CartStatus,
    /// Free-form customer note.
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A line in a cart. Hard-deletes; a removed line is gone.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub sale_id: SaleId,
    pub quantity: i32,
    /// Sale price snapshot taken when the line was added.
    pub unit_price: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
