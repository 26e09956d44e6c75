//! Mileage / deposit ledger repository.
//!
//! Append-only: postings are created and listed, never updated or deleted.
//! A balance is `SUM(income) - SUM(outcome)` over live postings of one kind.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use dragonfruit_core::{
    CustomerId, LedgerDirection, LedgerEntryId, LedgerKind, Money, ResolvedPage,
};

use super::{RepositoryError, as_records};
use crate::models::ledger::LedgerEntry;

const ENTRY_COLUMNS: &str = "id, customer_id, kind, direction, amount, reason, created_at";

/// Filter for ledger listings.
///
/// The customer listing forces `customer_id` from the token; the admin
/// listing leaves it optional.
#[derive(Debug, Default)]
pub struct LedgerFilter {
    pub customer_id: Option<CustomerId>,
    pub kind: Option<LedgerKind>,
    pub direction: Option<LedgerDirection>,
}

fn push_ledger_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &LedgerFilter) {
    qb.push(" WHERE TRUE");
    if let Some(customer_id) = filter.customer_id {
        qb.push(" AND customer_id = ").push_bind(customer_id);
    }
    if let Some(kind) = filter.kind {
        qb.push(" AND kind = ").push_bind(kind);
    }
    if let Some(direction) = filter.direction {
        qb.push(" AND direction = ").push_bind(direction);
    }
}

/// Fields for a new ledger posting.
#[derive(Debug)]
pub struct NewLedgerEntry {
    pub id: LedgerEntryId,
    pub customer_id: CustomerId,
    pub kind: LedgerKind,
    pub direction: LedgerDirection,
    pub amount: Money,
    pub reason: String,
    pub now: DateTime<Utc>,
}

/// Repository for ledger postings.
pub struct LedgerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LedgerRepository<'a> {
    /// Create a new ledger repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Listing, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn search(
        &self,
        filter: &LedgerFilter,
        page: ResolvedPage,
    ) -> Result<(u64, Vec<LedgerEntry>), RepositoryError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM ledger_entries");
        push_ledger_filters(&mut count_query, filter);
        let records: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut page_query =
            QueryBuilder::<Postgres>::new(format!("SELECT {ENTRY_COLUMNS} FROM ledger_entries"));
        push_ledger_filters(&mut page_query, filter);
        page_query.push(" ORDER BY created_at DESC");
        page_query.push(" LIMIT ").push_bind(page.take());
        page_query.push(" OFFSET ").push_bind(page.offset());
        let entries = page_query
            .build_query_as::<LedgerEntry>()
            .fetch_all(self.pool)
            .await?;

        Ok((as_records(records), entries))
    }

    /// Post an entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: NewLedgerEntry) -> Result<LedgerEntry, RepositoryError> {
        let row = sqlx::query_as::<_, LedgerEntry>(&format!(
            "INSERT INTO ledger_entries (id, customer_id, kind, direction, amount, reason, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {ENTRY_COLUMNS}"
        ))
        .bind(new.id)
        .bind(new.customer_id)
        .bind(new.kind)
        .bind(new.direction)
        .bind(new.amount)
        .bind(new.reason)
        .bind(new.now)
        .fetch_one(self.pool)
        .await?;

        Ok(row)
    }

    /// Current balance of one kind for one customer. A customer with no
    /// postings has a zero balance, not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn balance(
        &self,
        customer_id: CustomerId,
        kind: LedgerKind,
    ) -> Result<Decimal, RepositoryError> {
        let sum: Option<Decimal> = sqlx::query_scalar(
            "SELECT SUM(CASE WHEN direction = 'income' THEN amount ELSE -amount END)
             FROM ledger_entries WHERE customer_id = $1 AND kind = $2",
        )
        .bind(customer_id)
        .bind(kind)
        .fetch_one(self.pool)
        .await?;

        Ok(sum.unwrap_or_default())
    }
}
