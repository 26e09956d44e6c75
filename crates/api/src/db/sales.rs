//! Sale listing repositories: sales, option groups, options.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use dragonfruit_core::{
    CategoryId, ChannelId, Money, OptionGroupId, Patch, ResolvedPage, SaleId, SaleOptionId,
    SaleStatus, SectionId, SellerId,
};

use super::{RepositoryError, as_records};
use crate::models::sale::{OptionGroup, Sale, SaleOption};

const SALE_COLUMNS: &str = "id, seller_id, channel_id, section_id, category_id, code, name, \
                            description, price, status, created_at, updated_at, deleted_at";
const GROUP_COLUMNS: &str = "id, sale_id, code, name, required, created_at, updated_at";
const OPTION_COLUMNS: &str = "id, group_id, name, extra_price, created_at, updated_at";

/// Filter for the public sale listing.
#[derive(Debug, Default)]
pub struct SaleFilter {
    pub seller_id: Option<SellerId>,
    pub channel_id: Option<ChannelId>,
    pub section_id: Option<SectionId>,
    pub category_id: Option<CategoryId>,
    pub status: Option<SaleStatus>,
    /// OR-ed substring match over code and name.
    pub search: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
}

/// Sort keys accepted by the sale listing.
#[derive(Debug, Clone, Copy, Default)]
pub enum SaleSortKey {
    #[default]
    CreatedAt,
    PriceAsc,
    PriceDesc,
    Name,
}

impl SaleSortKey {
    /// Parse a requested key, falling back to the default for unknown input.
    #[must_use]
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("price") => Self::PriceAsc,
            Some("price_desc") => Self::PriceDesc,
            Some("name") => Self::Name,
            _ => Self::CreatedAt,
        }
    }

    const fn order_by(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at DESC",
            Self::PriceAsc => "price ASC",
            Self::PriceDesc => "price DESC",
            Self::Name => "name ASC",
        }
    }
}

fn push_sale_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &SaleFilter) {
    qb.push(" WHERE deleted_at IS NULL");
    if let Some(seller_id) = filter.seller_id {
        qb.push(" AND seller_id = ").push_bind(seller_id);
    }
    if let Some(channel_id) = filter.channel_id {
        qb.push(" AND channel_id = ").push_bind(channel_id);
    }
    if let Some(section_id) = filter.section_id {
        qb.push(" AND section_id = ").push_bind(section_id);
    }
    if let Some(category_id) = filter.category_id {
        qb.push(" AND category_id = ").push_bind(category_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(min_price) = filter.min_price {
        qb.push(" AND price >= ").push_bind(min_price);
    }
    if let Some(max_price) = filter.max_price {
        qb.push(" AND price <= ").push_bind(max_price);
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

/// Fields for a new sale listing.
#[derive(Debug)]
pub struct NewSale {
    pub id: SaleId,
    pub seller_id: SellerId,
    pub channel_id: ChannelId,
    pub section_id: SectionId,
    pub category_id: Option<CategoryId>,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub status: SaleStatus,
    pub now: DateTime<Utc>,
}

/// Sparse patch for a sale listing.
#[derive(Debug, Default)]
pub struct SaleChanges {
    pub code: Patch<String>,
    pub name: Patch<String>,
    pub description: Patch<String>,
    pub category_id: Patch<CategoryId>,
    pub price: Patch<Money>,
    pub status: Patch<SaleStatus>,
}

/// Repository for sale listings.
pub struct SaleRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SaleRepository<'a> {
    /// Create a new sale repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Listing with the full marketplace filter set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn search(
        &self,
        filter: &SaleFilter,
        sort: SaleSortKey,
        page: ResolvedPage,
    ) -> Result<(u64, Vec<Sale>), RepositoryError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM sales");
        push_sale_filters(&mut count_query, filter);
        let records: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut page_query =
            QueryBuilder::<Postgres>::new(format!("SELECT {SALE_COLUMNS} FROM sales"));
        push_sale_filters(&mut page_query, filter);
        page_query.push(" ORDER BY ").push(sort.order_by());
        page_query.push(" LIMIT ").push_bind(page.take());
        page_query.push(" OFFSET ").push_bind(page.offset());
        let sales = page_query
            .build_query_as::<Sale>()
            .fetch_all(self.pool)
            .await?;

        Ok((as_records(records), sales))
    }

    /// Get a live sale by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: SaleId) -> Result<Option<Sale>, RepositoryError> {
        let row = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Create a sale listing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: NewSale) -> Result<Sale, RepositoryError> {
        let row = sqlx::query_as::<_, Sale>(&format!(
            "INSERT INTO sales (id, seller_id, channel_id, section_id, category_id, code, name,
                                description, price, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
             RETURNING {SALE_COLUMNS}"
        ))
        .bind(new.id)
        .bind(new.seller_id)
        .bind(new.channel_id)
        .bind(new.section_id)
        .bind(new.category_id)
        .bind(new.code)
        .bind(new.name)
        .bind(new.description)
        .bind(new.price)
        .bind(new.status)
        .bind(new.now)
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
        id: SaleId,
        changes: &SaleChanges,
        now: DateTime<Utc>,
    ) -> Result<Sale, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE sales SET updated_at = ");
        qb.push_bind(now);
        if let Patch::Value(code) = &changes.code {
            qb.push(", code = ").push_bind(code.clone());
        }
        if let Patch::Value(name) = &changes.name {
            qb.push(", name = ").push_bind(name.clone());
        }
        match &changes.description {
            Patch::Missing => {}
            Patch::Null => {
                qb.push(", description = NULL");
            }
            Patch::Value(description) => {
                qb.push(", description = ").push_bind(description.clone());
            }
        }
        match changes.category_id {
            Patch::Missing => {}
            Patch::Null => {
                qb.push(", category_id = NULL");
            }
            Patch::Value(category_id) => {
                qb.push(", category_id = ").push_bind(category_id);
            }
        }
        if let Patch::Value(price) = changes.price {
            qb.push(", price = ").push_bind(price);
        }
        if let Patch::Value(status) = changes.status {
            qb.push(", status = ").push_bind(status);
        }
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" AND deleted_at IS NULL RETURNING ")
            .push(SALE_COLUMNS);

        let row = qb
            .build_query_as::<Sale>()
            .fetch_optional(self.pool)
            .await?;

        row.ok_or(RepositoryError::NotFound)
    }

    /// Soft-delete a sale listing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if already deleted or absent.
    pub async fn soft_delete(&self, id: SaleId, now: DateTime<Utc>) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE sales SET deleted_at = $2, updated_at = $2
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

/// Sparse patch for an option group.
#[derive(Debug, Default)]
pub struct OptionGroupChanges {
    pub code: Patch<String>,
    pub name: Patch<String>,
    pub required: Patch<bool>,
}

/// Repository for sale option groups. Hard-deletes.
pub struct OptionGroupRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OptionGroupRepository<'a> {
    /// Create a new option group repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Listing scoped to one sale.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_by_sale(
        &self,
        sale_id: SaleId,
        page: ResolvedPage,
    ) -> Result<(u64, Vec<OptionGroup>), RepositoryError> {
        let records: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sale_option_groups WHERE sale_id = $1")
                .bind(sale_id)
                .fetch_one(self.pool)
                .await?;

        let groups = sqlx::query_as::<_, OptionGroup>(&format!(
            "SELECT {GROUP_COLUMNS} FROM sale_option_groups WHERE sale_id = $1
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(sale_id)
        .bind(page.take())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok((as_records(records), groups))
    }

    /// Get an option group by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(
        &self,
        id: OptionGroupId,
    ) -> Result<Option<OptionGroup>, RepositoryError> {
        let row = sqlx::query_as::<_, OptionGroup>(&format!(
            "SELECT {GROUP_COLUMNS} FROM sale_option_groups WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Create an option group under a sale.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code is taken within the
    /// sale.
    pub async fn create(
        &self,
        id: OptionGroupId,
        sale_id: SaleId,
        code: &str,
        name: &str,
        required: bool,
        now: DateTime<Utc>,
    ) -> Result<OptionGroup, RepositoryError> {
        let row = sqlx::query_as::<_, OptionGroup>(&format!(
            "INSERT INTO sale_option_groups (id, sale_id, code, name, required, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             RETURNING {GROUP_COLUMNS}"
        ))
        .bind(id)
        .bind(sale_id)
        .bind(code)
        .bind(name)
        .bind(required)
        .bind(now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::conflict_on_unique(e, "option group code already in use"))?;

        Ok(row)
    }

    /// Apply a sparse patch and refresh `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the group is absent.
    pub async fn update(
        &self,
        id: OptionGroupId,
        changes: &OptionGroupChanges,
        now: DateTime<Utc>,
    ) -> Result<OptionGroup, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE sale_option_groups SET updated_at = ");
        qb.push_bind(now);
        if let Patch::Value(code) = &changes.code {
            qb.push(", code = ").push_bind(code.clone());
        }
        if let Patch::Value(name) = &changes.name {
            qb.push(", name = ").push_bind(name.clone());
        }
        if let Patch::Value(required) = changes.required {
            qb.push(", required = ").push_bind(required);
        }
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(GROUP_COLUMNS);

        let row = qb
            .build_query_as::<OptionGroup>()
            .fetch_optional(self.pool)
            .await
            .map_err(|e| {
                RepositoryError::conflict_on_unique(e, "option group code already in use")
            })?;

        row.ok_or(RepositoryError::NotFound)
    }

    /// Hard-delete an option group (and, via cascade, its options).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the group is absent.
    pub async fn delete(&self, id: OptionGroupId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM sale_option_groups WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Repository for options within a group. Hard-deletes.
pub struct SaleOptionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SaleOptionRepository<'a> {
    /// Create a new sale option repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Listing scoped to one group.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_by_group(
        &self,
        group_id: OptionGroupId,
        page: ResolvedPage,
    ) -> Result<(u64, Vec<SaleOption>), RepositoryError> {
        let records: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sale_options WHERE group_id = $1")
                .bind(group_id)
                .fetch_one(self.pool)
                .await?;

        let options = sqlx::query_as::<_, SaleOption>(&format!(
            "SELECT {OPTION_COLUMNS} FROM sale_options WHERE group_id = $1
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(group_id)
        .bind(page.take())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok((as_records(records), options))
    }

    /// Get an option by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: SaleOptionId) -> Result<Option<SaleOption>, RepositoryError> {
        let row = sqlx::query_as::<_, SaleOption>(&format!(
            "SELECT {OPTION_COLUMNS} FROM sale_options WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Create an option within a group.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        id: SaleOptionId,
        group_id: OptionGroupId,
        name: &str,
        extra_price: Money,
        now: DateTime<Utc>,
    ) -> Result<SaleOption, RepositoryError> {
        let row = sqlx::query_as::<_, SaleOption>(&format!(
            "INSERT INTO sale_options (id, group_id, name, extra_price, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $5)
             RETURNING {OPTION_COLUMNS}"
        ))
        .bind(id)
        .bind(group_id)
        .bind(name)
        .bind(extra_price)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(row)
    }

    /// Hard-delete an option.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the option is absent.
    pub async fn delete(&self, id: SaleOptionId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM sale_options WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
