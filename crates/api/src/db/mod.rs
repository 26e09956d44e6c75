//! Database operations for the marketplace `PostgreSQL`.
//!
//! # Tables
//!
//! - `customers`, `sellers`, `admins` - actor accounts
//! - `channels`, `sections`, `categories` - catalog taxonomy
//! - `sales`, `sale_option_groups`, `sale_options` - listings
//! - `carts`, `cart_items` - shopping carts
//! - `orders`, `payments`, `fraud_flags` - commerce records
//! - `coupons` - discounts
//! - `ledger_entries` - mileage/deposit postings
//! - `reviews`, `inquiries`, `comments` - boards
//!
//! # Conventions
//!
//! Every repository is a thin borrow of the pool owning all SQL for one
//! entity group. List queries follow the same shape: an AND-ed filter built
//! with `QueryBuilder`, a `COUNT(*)` with the same filter, an allow-listed
//! `ORDER BY`, and `LIMIT`/`OFFSET` from the resolved page. The count and
//! the page fetch are two independent reads - no transaction wraps them.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p dragonfruit-cli -- migrate
//! ```

pub mod accounts;
pub mod boards;
pub mod carts;
pub mod catalog;
pub mod coupons;
pub mod ledger;
pub mod orders;
pub mod sales;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use accounts::{AdminRepository, CustomerRepository, SellerRepository};
pub use boards::{CommentRepository, InquiryRepository, ReviewRepository};
pub use carts::{CartItemRepository, CartRepository};
pub use catalog::{CategoryRepository, ChannelRepository, SectionRepository};
pub use coupons::CouponRepository;
pub use ledger::LedgerRepository;
pub use orders::{FraudFlagRepository, OrderRepository, PaymentRepository};
pub use sales::{OptionGroupRepository, SaleOptionRepository, SaleRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate code).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Translate a sqlx error, mapping unique violations to `Conflict`.
    pub(crate) fn conflict_on_unique(e: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Convert a `COUNT(*)` result to the envelope's record count.
pub(crate) fn as_records(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}
