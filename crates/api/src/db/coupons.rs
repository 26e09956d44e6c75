//! Coupon repository.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use dragonfruit_core::{CouponId, CouponStatus, DiscountType, Money, Patch, ResolvedPage};

use super::{RepositoryError, as_records};
use crate::models::coupon::Coupon;

const COUPON_COLUMNS: &str = "id, code, name, discount_type, discount_value, status, expires_at, \
                              created_at, updated_at, deleted_at";

/// Filter for coupon listings.
#[derive(Debug, Default)]
pub struct CouponFilter {
    pub status: Option<CouponStatus>,
    /// OR-ed substring match over code and name.
    pub search: Option<String>,
    /// When set, keep only coupons redeemable at this instant: status
    /// `active` and not expired. The public listing always sets it.
    pub available_at: Option<DateTime<Utc>>,
}

/// Sort keys accepted by coupon listings.
#[derive(Debug, Clone, Copy, Default)]
pub enum CouponSortKey {
    #[default]
    CreatedAt,
    ExpiresAt,
    Code,
}

impl CouponSortKey {
    /// Parse a requested key, falling back to the default for unknown input.
    #[must_use]
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("expires_at") => Self::ExpiresAt,
            Some("code") => Self::Code,
            _ => Self::CreatedAt,
        }
    }

    const fn order_by(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at DESC",
            Self::ExpiresAt => "expires_at ASC NULLS LAST",
            Self::Code => "code ASC",
        }
    }
}

fn push_coupon_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &CouponFilter) {
    qb.push(" WHERE deleted_at IS NULL");
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(now) = filter.available_at {
        qb.push(" AND status = ").push_bind(CouponStatus::Active);
        qb.push(" AND (expires_at IS NULL OR expires_at > ")
            .push_bind(now)
            .push(")");
    }
    if let Some(term) = &filter.search {
        let pattern = format!("%{term}%");
        qb.push(" AND (code ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Fields for a new coupon.
#[derive(Debug)]
pub struct NewCoupon {
    pub id: CouponId,
    pub code: String,
    pub name: String,
    pub discount_type: DiscountType,
    pub discount_value: Money,
    pub expires_at: Option<DateTime<Utc>>,
    pub now: DateTime<Utc>,
}

/// Sparse patch for a coupon. `code` and `discount_type` are immutable once
/// issued; the handlers never build a patch for them.
#[derive(Debug, Default)]
pub struct CouponChanges {
    pub name: Patch<String>,
    pub discount_value: Patch<Money>,
    pub status: Patch<CouponStatus>,
    pub expires_at: Patch<DateTime<Utc>>,
}

/// Repository for coupons.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    /// Create a new coupon repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Listing with status/availability filters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn search(
        &self,
        filter: &CouponFilter,
        sort: CouponSortKey,
        page: ResolvedPage,
    ) -> Result<(u64, Vec<Coupon>), RepositoryError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM coupons");
        push_coupon_filters(&mut count_query, filter);
        let records: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut page_query =
            QueryBuilder::<Postgres>::new(format!("SELECT {COUPON_COLUMNS} FROM coupons"));
        push_coupon_filters(&mut page_query, filter);
        page_query.push(" ORDER BY ").push(sort.order_by());
        page_query.push(" LIMIT ").push_bind(page.take());
        page_query.push(" OFFSET ").push_bind(page.offset());
        let coupons = page_query
            .build_query_as::<Coupon>()
            .fetch_all(self.pool)
            .await?;

        Ok((as_records(records), coupons))
    }

    /// Get a live coupon by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: CouponId) -> Result<Option<Coupon>, RepositoryError> {
        let row = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Issue a coupon.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code is taken by a live
    /// coupon.
    pub async fn create(&self, new: NewCoupon) -> Result<Coupon, RepositoryError> {
        let row = sqlx::query_as::<_, Coupon>(&format!(
            "INSERT INTO coupons (id, code, name, discount_type, discount_value, status,
                                  expires_at, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
             RETURNING {COUPON_COLUMNS}"
        ))
        .bind(new.id)
        .bind(new.code)
        .bind(new.name)
        .bind(new.discount_type)
        .bind(new.discount_value)
        .bind(CouponStatus::Active)
        .bind(new.expires_at)
        .bind(new.now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::conflict_on_unique(e, "coupon code already in use"))?;

        Ok(row)
    }

    /// Apply a sparse patch and refresh `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if absent or soft-deleted.
    pub async fn update(
        &self,
        id: CouponId,
        changes: &CouponChanges,
        now: DateTime<Utc>,
    ) -> Result<Coupon, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE coupons SET updated_at = ");
        qb.push_bind(now);
        if let Patch::Value(name) = &changes.name {
            qb.push(", name = ").push_bind(name.clone());
        }
        if let Patch::Value(discount_value) = changes.discount_value {
            qb.push(", discount_value = ").push_bind(discount_value);
        }
        if let Patch::Value(status) = changes.status {
            qb.push(", status = ").push_bind(status);
        }
        match changes.expires_at {
            Patch::Missing => {}
            Patch::Null => {
                qb.push(", expires_at = NULL");
            }
            Patch::Value(expires_at) => {
                qb.push(", expires_at = ").push_bind(expires_at);
            }
        }
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" AND deleted_at IS NULL RETURNING ")
            .push(COUPON_COLUMNS);

        let row = qb
            .build_query_as::<Coupon>()
            .fetch_optional(self.pool)
            .await?;

        row.ok_or(RepositoryError::NotFound)
    }

    /// Soft-delete a coupon.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if already deleted or absent.
    pub async fn soft_delete(
        &self,
        id: CouponId,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE coupons SET deleted_at = $2, updated_at = $2
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
