//! Mileage / deposit ledger domain type.
//!
//! One append-only table serves both balances; `kind` says which. Entries
//! are never updated or deleted - corrections are posted as new entries in
//! the opposite direction.

use chrono::{DateTime, Utc};
use dragonfruit_core::{CustomerId, LedgerDirection, LedgerEntryId, LedgerKind, Money};

/// One ledger posting.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub customer_id: CustomerId,
    pub kind: LedgerKind,
    pub direction: LedgerDirection,
    pub amount: Money,
    /// Human-readable cause, e.g. "order reward" or "withdrawal".
    pub reason: String,
    pub created_at: DateTime<Utc>,
}
