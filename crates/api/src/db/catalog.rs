//! Catalog taxonomy repositories: channels, sections, categories.
//!
//! Codes are unique among live rows only - a deleted channel frees its code.
//! The partial unique indexes in the migrations enforce this; the
//! repositories translate the violation into `Conflict`.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use dragonfruit_core::{CategoryId, ChannelId, Patch, ResolvedPage, SectionId};

use super::{RepositoryError, as_records};
use crate::models::catalog::{Category, Channel, Section};

const CHANNEL_COLUMNS: &str = "id, code, name, created_at, updated_at, deleted_at";
const SECTION_COLUMNS: &str = "id, channel_id, code, name, created_at, updated_at, deleted_at";
const CATEGORY_COLUMNS: &str =
    "id, channel_id, parent_id, code, name, created_at, updated_at, deleted_at";

/// Filter for the public channel listing.
#[derive(Debug, Default)]
pub struct ChannelFilter {
    /// OR-ed substring match over code and name.
    pub search: Option<String>,
}

/// Sort keys accepted by catalog listings.
#[derive(Debug, Clone, Copy, Default)]
pub enum CatalogSortKey {
    #[default]
    CreatedAt,
    Code,
    Name,
}

impl CatalogSortKey {
    /// Parse a requested key, falling back to the default for unknown input.
    #[must_use]
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("code") => Self::Code,
            Some("name") => Self::Name,
            _ => Self::CreatedAt,
        }
    }

    const fn order_by(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at DESC",
            Self::Code => "code ASC",
            Self::Name => "name ASC",
        }
    }
}

fn push_code_name_search(qb: &mut QueryBuilder<'_, Postgres>, search: Option<&String>) {
    if let Some(term) = search {
        let pattern = format!("%{term}%");
        qb.push(" AND (code ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Sparse patch shared by channels, sections, and categories.
///
/// `code` and `name` are non-nullable columns; the handlers reject
/// `Patch::Null` for them before this struct is built.
#[derive(Debug, Default)]
pub struct TaxonomyChanges {
    pub code: Patch<String>,
    pub name: Patch<String>,
}

fn push_taxonomy_changes(qb: &mut QueryBuilder<'_, Postgres>, changes: &TaxonomyChanges) {
    if let Patch::Value(code) = &changes.code {
        qb.push(", code = ").push_bind(code.clone());
    }
    if let Patch::Value(name) = &changes.name {
        qb.push(", name = ").push_bind(name.clone());
    }
}

/// Repository for sales channels.
pub struct ChannelRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ChannelRepository<'a> {
    /// Create a new channel repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Public listing with code/name search.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn search(
        &self,
        filter: &ChannelFilter,
        sort: CatalogSortKey,
        page: ResolvedPage,
    ) -> Result<(u64, Vec<Channel>), RepositoryError> {
        let mut count_query =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM channels WHERE deleted_at IS NULL");
        push_code_name_search(&mut count_query, filter.search.as_ref());
        let records: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut page_query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {CHANNEL_COLUMNS} FROM channels WHERE deleted_at IS NULL"
        ));
        push_code_name_search(&mut page_query, filter.search.as_ref());
        page_query.push(" ORDER BY ").push(sort.order_by());
        page_query.push(" LIMIT ").push_bind(page.take());
        page_query.push(" OFFSET ").push_bind(page.offset());
        let channels = page_query
            .build_query_as::<Channel>()
            .fetch_all(self.pool)
            .await?;

        Ok((as_records(records), channels))
    }

    /// Get a live channel by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: ChannelId) -> Result<Option<Channel>, RepositoryError> {
        let row = sqlx::query_as::<_, Channel>(&format!(
            "SELECT {CHANNEL_COLUMNS} FROM channels WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Create a channel.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code is taken by a live
    /// channel.
    pub async fn create(
        &self,
        id: ChannelId,
        code: &str,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Channel, RepositoryError> {
        let row = sqlx::query_as::<_, Channel>(&format!(
            "INSERT INTO channels (id, code, name, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $4)
             RETURNING {CHANNEL_COLUMNS}"
        ))
        .bind(id)
        .bind(code)
        .bind(name)
        .bind(now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::conflict_on_unique(e, "channel code already in use"))?;

        Ok(row)
    }

    /// Apply a sparse patch and refresh `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if absent or soft-deleted, and
    /// `RepositoryError::Conflict` if a code change collides.
    pub async fn update(
        &self,
        id: ChannelId,
        changes: &TaxonomyChanges,
        now: DateTime<Utc>,
    ) -> Result<Channel, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE channels SET updated_at = ");
        qb.push_bind(now);
        push_taxonomy_changes(&mut qb, changes);
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" AND deleted_at IS NULL RETURNING ")
            .push(CHANNEL_COLUMNS);

        let row = qb
            .build_query_as::<Channel>()
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::conflict_on_unique(e, "channel code already in use"))?;

        row.ok_or(RepositoryError::NotFound)
    }

    /// Soft-delete a channel.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if already deleted or absent.
    pub async fn soft_delete(
        &self,
        id: ChannelId,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE channels SET deleted_at = $2, updated_at = $2
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

/// Repository for channel sections.
pub struct SectionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SectionRepository<'a> {
    /// Create a new section repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Listing scoped to one channel.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn search(
        &self,
        channel_id: ChannelId,
        search: Option<&String>,
        sort: CatalogSortKey,
        page: ResolvedPage,
    ) -> Result<(u64, Vec<Section>), RepositoryError> {
        let mut count_query = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM sections WHERE deleted_at IS NULL AND channel_id = ",
        );
        count_query.push_bind(channel_id);
        push_code_name_search(&mut count_query, search);
        let records: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut page_query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {SECTION_COLUMNS} FROM sections WHERE deleted_at IS NULL AND channel_id = "
        ));
        page_query.push_bind(channel_id);
        push_code_name_search(&mut page_query, search);
        page_query.push(" ORDER BY ").push(sort.order_by());
        page_query.push(" LIMIT ").push_bind(page.take());
        page_query.push(" OFFSET ").push_bind(page.offset());
        let sections = page_query
            .build_query_as::<Section>()
            .fetch_all(self.pool)
            .await?;

        Ok((as_records(records), sections))
    }

    /// Get a live section by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: SectionId) -> Result<Option<Section>, RepositoryError> {
        let row = sqlx::query_as::<_, Section>(&format!(
            "SELECT {SECTION_COLUMNS} FROM sections WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Create a section under a channel.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code is taken within the
    /// channel.
    pub async fn create(
        &self,
        id: SectionId,
        channel_id: ChannelId,
        code: &str,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Section, RepositoryError> {
        let row = sqlx::query_as::<_, Section>(&format!(
            "INSERT INTO sections (id, channel_id, code, name, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $5)
             RETURNING {SECTION_COLUMNS}"
        ))
        .bind(id)
        .bind(channel_id)
        .bind(code)
        .bind(name)
        .bind(now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::conflict_on_unique(e, "section code already in use"))?;

        Ok(row)
    }

    /// Apply a sparse patch and refresh `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if absent or soft-deleted.
    pub async fn update(
        &self,
        id: SectionId,
        changes: &TaxonomyChanges,
        now: DateTime<Utc>,
    ) -> Result<Section, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE sections SET updated_at = ");
        qb.push_bind(now);
        push_taxonomy_changes(&mut qb, changes);
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" AND deleted_at IS NULL RETURNING ")
            .push(SECTION_COLUMNS);

        let row = qb
            .build_query_as::<Section>()
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::conflict_on_unique(e, "section code already in use"))?;

        row.ok_or(RepositoryError::NotFound)
    }

    /// Soft-delete a section.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if already deleted or absent.
    pub async fn soft_delete(
        &self,
        id: SectionId,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE sections SET deleted_at = $2, updated_at = $2
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

/// Sparse patch for categories; `parent_id` is nullable (null = make root).
#[derive(Debug, Default)]
pub struct CategoryChanges {
    pub code: Patch<String>,
    pub name: Patch<String>,
    pub parent_id: Patch<CategoryId>,
}

/// Repository for channel categories.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Listing scoped to one channel, optionally to one parent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn search(
        &self,
        channel_id: ChannelId,
        parent_id: Option<CategoryId>,
        search: Option<&String>,
        sort: CatalogSortKey,
        page: ResolvedPage,
    ) -> Result<(u64, Vec<Category>), RepositoryError> {
        let mut count_query = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM categories WHERE deleted_at IS NULL AND channel_id = ",
        );
        count_query.push_bind(channel_id);
        if let Some(parent) = parent_id {
            count_query.push(" AND parent_id = ").push_bind(parent);
        }
        push_code_name_search(&mut count_query, search);
        let records: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut page_query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE deleted_at IS NULL AND channel_id = "
        ));
        page_query.push_bind(channel_id);
        if let Some(parent) = parent_id {
            page_query.push(" AND parent_id = ").push_bind(parent);
        }
        push_code_name_search(&mut page_query, search);
        page_query.push(" ORDER BY ").push(sort.order_by());
        page_query.push(" LIMIT ").push_bind(page.take());
        page_query.push(" OFFSET ").push_bind(page.offset());
        let categories = page_query
            .build_query_as::<Category>()
            .fetch_all(self.pool)
            .await?;

        Ok((as_records(records), categories))
    }

    /// Get a live category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Create a category under a channel.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        id: CategoryId,
        channel_id: ChannelId,
        parent_id: Option<CategoryId>,
        code: &str,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, Category>(&format!(
            "INSERT INTO categories (id, channel_id, parent_id, code, name, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(id)
        .bind(channel_id)
        .bind(parent_id)
        .bind(code)
        .bind(name)
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
        id: CategoryId,
        changes: &CategoryChanges,
        now: DateTime<Utc>,
    ) -> Result<Category, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE categories SET updated_at = ");
        qb.push_bind(now);
        if let Patch::Value(code) = &changes.code {
            qb.push(", code = ").push_bind(code.clone());
        }
        if let Patch::Value(name) = &changes.name {
            qb.push(", name = ").push_bind(name.clone());
        }
        match changes.parent_id {
            Patch::Missing => {}
            Patch::Null => {
                qb.push(", parent_id = NULL");
            }
            Patch::Value(parent) => {
                qb.push(", parent_id = ").push_bind(parent);
            }
        }
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" AND deleted_at IS NULL RETURNING ")
            .push(CATEGORY_COLUMNS);

        let row = qb
            .build_query_as::<Category>()
            .fetch_optional(self.pool)
            .await?;

        row.ok_or(RepositoryError::NotFound)
    }

    /// Soft-delete a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if already deleted or absent.
    pub async fn soft_delete(
        &self,
        id: CategoryId,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE categories SET deleted_at = $2, updated_at = $2
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
