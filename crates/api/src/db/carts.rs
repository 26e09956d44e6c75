//! Cart repositories.
//!
//! Carts soft-delete; cart items hard-delete. Deleting an item twice fails
//! the second time with `NotFound` - callers rely on that.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use dragonfruit_core::{
    CartId, CartItemId, CartStatus, CustomerId, Money, Patch, ResolvedPage, SaleId,
};

use super::{RepositoryError, as_records};
use crate::models::cart::{Cart, CartItem};

const CART_COLUMNS: &str = "id, customer_id, status, note, created_at, updated_at, deleted_at";
const ITEM_COLUMNS: &str = "id, cart_id, sale_id, quantity, unit_price, created_at, updated_at";

/// Filter for the customer cart listing.
///
/// `customer_id` is always present: the handler fills it from the caller's
/// token, never from the request body.
#[derive(Debug)]
pub struct CartFilter {
    pub customer_id: CustomerId,
    pub status: Option<CartStatus>,
}

/// Sort keys accepted by the cart listing.
#[derive(Debug, Clone, Copy, Default)]
pub enum CartSortKey {
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl CartSortKey {
    /// Parse a requested key, falling back to the default for unknown input.
    #[must_use]
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("updated_at") => Self::UpdatedAt,
            _ => Self::CreatedAt,
        }
    }

    const fn order_by(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at DESC",
            Self::UpdatedAt => "updated_at DESC",
        }
    }
}

fn push_cart_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &CartFilter) {
    qb.push(" WHERE deleted_at IS NULL AND customer_id = ");
    qb.push_bind(filter.customer_id);
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
}

/// Sparse patch for a cart.
#[derive(Debug, Default)]
pub struct CartChanges {
    pub status: Patch<CartStatus>,
    pub note: Patch<String>,
}

/// Repository for carts.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Listing forced to the owning customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn search(
        &self,
        filter: &CartFilter,
        sort: CartSortKey,
        page: ResolvedPage,
    ) -> Result<(u64, Vec<Cart>), RepositoryError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM carts");
        push_cart_filters(&mut count_query, filter);
        let records: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut page_query =
            QueryBuilder::<Postgres>::new(format!("SELECT {CART_COLUMNS} FROM carts"));
        push_cart_filters(&mut page_query, filter);
        page_query.push(" ORDER BY ").push(sort.order_by());
        page_query.push(" LIMIT ").push_bind(page.take());
        page_query.push(" OFFSET ").push_bind(page.offset());
        let carts = page_query
            .build_query_as::<Cart>()
            .fetch_all(self.pool)
            .await?;

        Ok((as_records(records), carts))
    }

    /// Get a live cart by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: CartId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, Cart>(&format!(
            "SELECT {CART_COLUMNS} FROM carts WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Create a cart for a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        id: CartId,
        customer_id: CustomerId,
        status: CartStatus,
        note: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Cart, RepositoryError> {
        let row = sqlx::query_as::<_, Cart>(&format!(
            "INSERT INTO carts (id, customer_id, status, note, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $5)
             RETURNING {CART_COLUMNS}"
        ))
        .bind(id)
        .bind(customer_id)
        .bind(status)
        .bind(note)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(row)
    }

    /// Apply a sparse patch and refresh `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if absent or soft-deleted.
    pub async fn update(
        &self,
        id: CartId,
        changes: &CartChanges,
        now: DateTime<Utc>,
    ) -> Result<Cart, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE carts SET updated_at = ");
        qb.push_bind(now);
        if let Patch::Value(status) = changes.status {
            qb.push(", status = ").push_bind(status);
        }
        match &changes.note {
            Patch::Missing => {}
            Patch::Null => {
                qb.push(", note = NULL");
            }
            Patch::Value(note) => {
                qb.push(", note = ").push_bind(note.clone());
            }
        }
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" AND deleted_at IS NULL RETURNING ")
            .push(CART_COLUMNS);

        let row = qb
            .build_query_as::<Cart>()
            .fetch_optional(self.pool)
            .await?;

        row.ok_or(RepositoryError::NotFound)
    }

    /// Soft-delete a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if already deleted or absent.
    pub async fn soft_delete(&self, id: CartId, now: DateTime<Utc>) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE carts SET deleted_at = $2, updated_at = $2
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

/// Sparse patch for a cart item.
#[derive(Debug, Default)]
pub struct CartItemChanges {
    pub quantity: Patch<i32>,
}

/// Repository for cart items. Hard-deletes.
pub struct CartItemRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartItemRepository<'a> {
    /// Create a new cart item repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Listing scoped to one cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_by_cart(
        &self,
        cart_id: CartId,
        page: ResolvedPage,
    ) -> Result<(u64, Vec<CartItem>), RepositoryError> {
        let records: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .fetch_one(self.pool)
            .await?;

        let items = sqlx::query_as::<_, CartItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM cart_items WHERE cart_id = $1
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(cart_id)
        .bind(page.take())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok((as_records(records), items))
    }

    /// Get a cart item by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: CartItemId) -> Result<Option<CartItem>, RepositoryError> {
        let row = sqlx::query_as::<_, CartItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM cart_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Add a line to a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        id: CartItemId,
        cart_id: CartId,
        sale_id: SaleId,
        quantity: i32,
        unit_price: Money,
        now: DateTime<Utc>,
    ) -> Result<CartItem, RepositoryError> {
        let row = sqlx::query_as::<_, CartItem>(&format!(
            "INSERT INTO cart_items (id, cart_id, sale_id, quantity, unit_price, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(id)
        .bind(cart_id)
        .bind(sale_id)
        .bind(quantity)
        .bind(unit_price)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(row)
    }

    /// Apply a sparse patch and refresh `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item is absent.
    pub async fn update(
        &self,
        id: CartItemId,
        changes: &CartItemChanges,
        now: DateTime<Utc>,
    ) -> Result<CartItem, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE cart_items SET updated_at = ");
        qb.push_bind(now);
        if let Patch::Value(quantity) = changes.quantity {
            qb.push(", quantity = ").push_bind(quantity);
        }
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(ITEM_COLUMNS);

        let row = qb
            .build_query_as::<CartItem>()
            .fetch_optional(self.pool)
            .await?;

        row.ok_or(RepositoryError::NotFound)
    }

    /// Hard-delete a cart line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line is absent (including
    /// the second of two deletes for the same id).
    pub async fn delete(&self, id: CartItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
