//! Actor domain types.
//!
//! Three separate actor tables, one type each. Password hashes never leave
//! the repository layer; see `db::accounts::Credentials`.

use chrono::{DateTime, Utc};
use dragonfruit_core::{AdminId, CustomerId, Email, SellerId};

/// A marketplace customer.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Customer {
    /// Unique customer ID.
    pub id: CustomerId,
    /// Login email, unique among live customers.
    pub email: Email,
    /// Public display name.
    pub nickname: String,
    /// Legal name used on orders.
    pub full_name: String,
    /// Contact phone, if provided.
    pub phone: Option<String>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker; live accounts have `None`.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A seller operating storefronts on the marketplace.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Seller {
    pub id: SellerId,
    pub email: Email,
    pub nickname: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A marketplace administrator.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Admin {
    pub id: AdminId,
    pub email: Email,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}
