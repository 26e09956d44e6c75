//! Order, payment, and fraud-flag repositories.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use dragonfruit_core::{
    AdminId, CartId, CustomerId, FraudFlagId, FraudSeverity, Money, OrderId, OrderStatus, Patch,
    PaymentId, PaymentStatus, ResolvedPage,
};

use super::{RepositoryError, as_records};
use crate::models::order::{FraudFlag, Order, Payment};

const ORDER_COLUMNS: &str = "id, customer_id, cart_id, order_status, payment_status, total_price, \
                             created_at, updated_at, deleted_at";
const PAYMENT_COLUMNS: &str =
    "id, order_id, method, amount, status, paid_at, created_at, updated_at";
const FLAG_COLUMNS: &str = "id, order_id, admin_id, severity, reason, created_at";

/// Filter for order listings.
///
/// The customer listing forces `customer_id` from the token; the admin
/// listing leaves it optional.
#[derive(Debug, Default)]
pub struct OrderFilter {
    pub customer_id: Option<CustomerId>,
    pub order_status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

/// Sort keys accepted by order listings.
#[derive(Debug, Clone, Copy, Default)]
pub enum OrderSortKey {
    #[default]
    CreatedAt,
    TotalPrice,
}

impl OrderSortKey {
    /// Parse a requested key, falling back to the default for unknown input.
    #[must_use]
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("total_price") => Self::TotalPrice,
            _ => Self::CreatedAt,
        }
    }

    const fn order_by(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at DESC",
            Self::TotalPrice => "total_price DESC",
        }
    }
}

fn push_order_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &OrderFilter) {
    qb.push(" WHERE deleted_at IS NULL");
    if let Some(customer_id) = filter.customer_id {
        qb.push(" AND customer_id = ").push_bind(customer_id);
    }
    if let Some(order_status) = filter.order_status {
        qb.push(" AND order_status = ").push_bind(order_status);
    }
    if let Some(payment_status) = filter.payment_status {
        qb.push(" AND payment_status = ").push_bind(payment_status);
    }
}

/// Fields for a new order.
#[derive(Debug)]
pub struct NewOrder {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub cart_id: Option<CartId>,
    pub total_price: Money,
    pub now: DateTime<Utc>,
}

/// Sparse patch for an order. Either status may move to any value; there is
/// no transition guard.
#[derive(Debug, Default)]
pub struct OrderChanges {
    pub order_status: Patch<OrderStatus>,
    pub payment_status: Patch<PaymentStatus>,
}

/// Repository for orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Listing with status filters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn search(
        &self,
        filter: &OrderFilter,
        sort: OrderSortKey,
        page: ResolvedPage,
    ) -> Result<(u64, Vec<Order>), RepositoryError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders");
        push_order_filters(&mut count_query, filter);
        let records: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut page_query =
            QueryBuilder::<Postgres>::new(format!("SELECT {ORDER_COLUMNS} FROM orders"));
        push_order_filters(&mut page_query, filter);
        page_query.push(" ORDER BY ").push(sort.order_by());
        page_query.push(" LIMIT ").push_bind(page.take());
        page_query.push(" OFFSET ").push_bind(page.offset());
        let orders = page_query
            .build_query_as::<Order>()
            .fetch_all(self.pool)
            .await?;

        Ok((as_records(records), orders))
    }

    /// Get a live order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Create an order. Both statuses start at `pending`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: NewOrder) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO orders (id, customer_id, cart_id, order_status, payment_status,
                                 total_price, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(new.id)
        .bind(new.customer_id)
        .bind(new.cart_id)
        .bind(OrderStatus::Pending)
        .bind(PaymentStatus::Pending)
        .bind(new.total_price)
        .bind(new.now)
        .fetch_one(self.pool)
        .await?;

        Ok(row)
    }

    /// Apply a sparse status patch and refresh `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if absent or soft-deleted.
    pub async fn update(
        &self,
        id: OrderId,
        changes: &OrderChanges,
        now: DateTime<Utc>,
    ) -> Result<Order, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE orders SET updated_at = ");
        qb.push_bind(now);
        if let Patch::Value(order_status) = changes.order_status {
            qb.push(", order_status = ").push_bind(order_status);
        }
        if let Patch::Value(payment_status) = changes.payment_status {
            qb.push(", payment_status = ").push_bind(payment_status);
        }
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" AND deleted_at IS NULL RETURNING ")
            .push(ORDER_COLUMNS);

        let row = qb
            .build_query_as::<Order>()
            .fetch_optional(self.pool)
            .await?;

        row.ok_or(RepositoryError::NotFound)
    }

    /// Soft-delete an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if already deleted or absent.
    pub async fn soft_delete(
        &self,
        id: OrderId,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders SET deleted_at = $2, updated_at = $2
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(now)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Fields for a new payment.
#[derive(Debug)]
pub struct NewPayment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub method: String,
    pub amount: Money,
    pub now: DateTime<Utc>,
}

/// Sparse patch for a payment.
#[derive(Debug, Default)]
pub struct PaymentChanges {
    pub status: Patch<PaymentStatus>,
    pub paid_at: Patch<DateTime<Utc>>,
}

/// Repository for payments. Payments are never deleted.
pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    /// Create a new payment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Listing scoped to one order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_by_order(
        &self,
        order_id: OrderId,
        page: ResolvedPage,
    ) -> Result<(u64, Vec<Payment>), RepositoryError> {
        let records: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE order_id = $1")
            .bind(order_id)
            .fetch_one(self.pool)
            .await?;

        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = $1
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(order_id)
        .bind(page.take())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok((as_records(records), payments))
    }

    /// Get a payment by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>, RepositoryError> {
        let row = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Record a payment attempt. Status starts at `pending`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: NewPayment) -> Result<Payment, RepositoryError> {
        let row = sqlx::query_as::<_, Payment>(&format!(
            "INSERT INTO payments (id, order_id, method, amount, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(new.id)
        .bind(new.order_id)
        .bind(new.method)
        .bind(new.amount)
        .bind(PaymentStatus::Pending)
        .bind(new.now)
        .fetch_one(self.pool)
        .await?;

        Ok(row)
    }

    /// Apply a sparse patch and refresh `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the payment is absent.
    pub async fn update(
        &self,
        id: PaymentId,
        changes: &PaymentChanges,
        now: DateTime<Utc>,
    ) -> Result<Payment, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE payments SET updated_at = ");
        qb.push_bind(now);
        if let Patch::Value(status) = changes.status {
            qb.push(", status = ").push_bind(status);
        }
        match changes.paid_at {
            Patch::Missing => {}
            Patch::Null => {
                qb.push(", paid_at = NULL");
            }
            Patch::Value(paid_at) => {
                qb.push(", paid_at = ").push_bind(paid_at);
            }
        }
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(PAYMENT_COLUMNS);

        let row = qb
            .build_query_as::<Payment>()
            .fetch_optional(self.pool)
            .await?;

        row.ok_or(RepositoryError::NotFound)
    }
}

/// Filter for the admin fraud-flag listing.
#[derive(Debug, Default)]
pub struct FraudFlagFilter {
    pub order_id: Option<OrderId>,
    pub severity: Option<FraudSeverity>,
}

/// Repository for fraud flags. Hard-deletes, admin-only.
pub struct FraudFlagRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FraudFlagRepository<'a> {
    /// Create a new fraud flag repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Listing with order/severity filters, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn search(
        &self,
        filter: &FraudFlagFilter,
        page: ResolvedPage,
    ) -> Result<(u64, Vec<FraudFlag>), RepositoryError> {
        let mut count_query =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM fraud_flags WHERE TRUE");
        push_flag_filters(&mut count_query, filter);
        let records: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut page_query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {FLAG_COLUMNS} FROM fraud_flags WHERE TRUE"
        ));
        push_flag_filters(&mut page_query, filter);
        page_query.push(" ORDER BY created_at DESC");
        page_query.push(" LIMIT ").push_bind(page.take());
        page_query.push(" OFFSET ").push_bind(page.offset());
        let flags = page_query
            .build_query_as::<FraudFlag>()
            .fetch_all(self.pool)
            .await?;

        Ok((as_records(records), flags))
    }

    /// Record a flag on an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        id: FraudFlagId,
        order_id: OrderId,
        admin_id: AdminId,
        severity: FraudSeverity,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<FraudFlag, RepositoryError> {
        let row = sqlx::query_as::<_, FraudFlag>(&format!(
            "INSERT INTO fraud_flags (id, order_id, admin_id, severity, reason, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {FLAG_COLUMNS}"
        ))
        .bind(id)
        .bind(order_id)
        .bind(admin_id)
        .bind(severity)
        .bind(reason)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(row)
    }

    /// Hard-delete a flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the flag is absent.
    pub async fn delete(&self, id: FraudFlagId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM fraud_flags WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

fn push_flag_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &FraudFlagFilter) {
    if let Some(order_id) = filter.order_id {
        qb.push(" AND order_id = ").push_bind(order_id);
    }
    if let Some(severity) = filter.severity {
        qb.push(" AND severity = ").push_bind(severity);
    }
}
