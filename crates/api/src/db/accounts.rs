//! Actor repositories: customers, sellers, admins.
//!
//! Password hashes stay inside this module; lookups that need them return
//! the narrow [`Credentials`] pair instead of the domain type.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use dragonfruit_core::{AdminId, CustomerId, Email, Patch, ResolvedPage, SellerId};

use super::{RepositoryError, as_records};
use crate::models::accounts::{Admin, Customer, Seller};

const CUSTOMER_COLUMNS: &str =
    "id, email, nickname, full_name, phone, created_at, updated_at, deleted_at";
const SELLER_COLUMNS: &str = "id, email, nickname, created_at, updated_at, deleted_at";
const ADMIN_COLUMNS: &str = "id, email, name, created_at, updated_at, deleted_at";

/// Login lookup result: the actor id plus its password hash.
#[derive(Debug, sqlx::FromRow)]
pub struct Credentials {
    pub id: Uuid,
    pub password_hash: String,
}

/// Fields for a new customer account.
#[derive(Debug)]
pub struct NewCustomer {
    pub id: CustomerId,
    pub email: Email,
    pub password_hash: String,
    pub nickname: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub now: DateTime<Utc>,
}

/// Sparse patch for the customer profile.
#[derive(Debug, Default)]
pub struct CustomerChanges {
    pub nickname: Patch<String>,
    pub full_name: Patch<String>,
    pub phone: Patch<String>,
}

/// Filter for the admin customer listing.
#[derive(Debug, Default)]
pub struct CustomerFilter {
    /// OR-ed substring match over email, nickname, and full name.
    pub search: Option<String>,
    /// When set, list soft-deleted accounts instead of live ones.
    pub deleted: bool,
}

/// Sort keys accepted by the admin customer listing.
#[derive(Debug, Clone, Copy, Default)]
pub enum CustomerSortKey {
    #[default]
    CreatedAt,
    Email,
    Nickname,
}

impl CustomerSortKey {
    /// Parse a requested key, falling back to the default for unknown input.
    #[must_use]
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("email") => Self::Email,
            Some("nickname") => Self::Nickname,
            _ => Self::CreatedAt,
        }
    }

    const fn order_by(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at DESC",
            Self::Email => "email ASC",
            Self::Nickname => "nickname ASC",
        }
    }
}

fn push_customer_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &CustomerFilter) {
    if filter.deleted {
        qb.push(" WHERE deleted_at IS NOT NULL");
    } else {
        qb.push(" WHERE deleted_at IS NULL");
    }
    if let Some(term) = &filter.search {
        let pattern = format!("%{term}%");
        qb.push(" AND (email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR nickname ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR full_name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Repository for customer accounts.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a live customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Get a live customer by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_email(&self, email: &Email) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE email = $1 AND deleted_at IS NULL"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Get login credentials for a live customer by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn credentials_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<Credentials>, RepositoryError> {
        let row = sqlx::query_as::<_, Credentials>(
            "SELECT id, password_hash FROM customers WHERE email = $1 AND deleted_at IS NULL",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Create a new customer account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    pub async fn create(&self, new: NewCustomer) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, Customer>(&format!(
            "INSERT INTO customers (id, email, password_hash, nickname, full_name, phone, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
             RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(new.id)
        .bind(new.email.as_str())
        .bind(new.password_hash)
        .bind(new.nickname)
        .bind(new.full_name)
        .bind(new.phone)
        .bind(new.now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::conflict_on_unique(e, "email already registered"))?;

        Ok(row)
    }

    /// Apply a sparse profile patch and refresh `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer is absent or
    /// soft-deleted.
    pub async fn update(
        &self,
        id: CustomerId,
        changes: &CustomerChanges,
        now: DateTime<Utc>,
    ) -> Result<Customer, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE customers SET updated_at = ");
        qb.push_bind(now);
        if let Patch::Value(nickname) = &changes.nickname {
            qb.push(", nickname = ").push_bind(nickname.clone());
        }
        if let Patch::Value(full_name) = &changes.full_name {
            qb.push(", full_name = ").push_bind(full_name.clone());
        }
        match &changes.phone {
            Patch::Missing => {}
            Patch::Null => {
                qb.push(", phone = NULL");
            }
            Patch::Value(phone) => {
                qb.push(", phone = ").push_bind(phone.clone());
            }
        }
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" AND deleted_at IS NULL RETURNING ")
            .push(CUSTOMER_COLUMNS);

        let row = qb
            .build_query_as::<Customer>()
            .fetch_optional(self.pool)
            .await?;

        row.ok_or(RepositoryError::NotFound)
    }

    /// Admin listing with search and an explicit deleted mode.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn search(
        &self,
        filter: &CustomerFilter,
        sort: CustomerSortKey,
        page: ResolvedPage,
    ) -> Result<(u64, Vec<Customer>), RepositoryError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM customers");
        push_customer_filters(&mut count_query, filter);
        let records: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut page_query =
            QueryBuilder::<Postgres>::new(format!("SELECT {CUSTOMER_COLUMNS} FROM customers"));
        push_customer_filters(&mut page_query, filter);
        page_query.push(" ORDER BY ").push(sort.order_by());
        page_query.push(" LIMIT ").push_bind(page.take());
        page_query.push(" OFFSET ").push_bind(page.offset());
        let customers = page_query
            .build_query_as::<Customer>()
            .fetch_all(self.pool)
            .await?;

        Ok((as_records(records), customers))
    }

    /// Soft-delete a customer account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if already deleted or absent.
    pub async fn soft_delete(
        &self,
        id: CustomerId,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE customers SET deleted_at = $2, updated_at = $2
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

/// Fields for a new seller account.
#[derive(Debug)]
pub struct NewSeller {
    pub id: SellerId,
    pub email: Email,
    pub password_hash: String,
    pub nickname: String,
    pub now: DateTime<Utc>,
}

/// Repository for seller accounts.
pub struct SellerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SellerRepository<'a> {
    /// Create a new seller repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a live seller by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: SellerId) -> Result<Option<Seller>, RepositoryError> {
        let row = sqlx::query_as::<_, Seller>(&format!(
            "SELECT {SELLER_COLUMNS} FROM sellers WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Get a live seller by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_email(&self, email: &Email) -> Result<Option<Seller>, RepositoryError> {
        let row = sqlx::query_as::<_, Seller>(&format!(
            "SELECT {SELLER_COLUMNS} FROM sellers WHERE email = $1 AND deleted_at IS NULL"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Get login credentials for a live seller by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn credentials_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<Credentials>, RepositoryError> {
        let row = sqlx::query_as::<_, Credentials>(
            "SELECT id, password_hash FROM sellers WHERE email = $1 AND deleted_at IS NULL",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Create a new seller account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    pub async fn create(&self, new: NewSeller) -> Result<Seller, RepositoryError> {
        let row = sqlx::query_as::<_, Seller>(&format!(
            "INSERT INTO sellers (id, email, password_hash, nickname, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $5)
             RETURNING {SELLER_COLUMNS}"
        ))
        .bind(new.id)
        .bind(new.email.as_str())
        .bind(new.password_hash)
        .bind(new.nickname)
        .bind(new.now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::conflict_on_unique(e, "email already registered"))?;

        Ok(row)
    }
}

/// Fields for a new admin account (created via the CLI, never the API).
#[derive(Debug)]
pub struct NewAdmin {
    pub id: AdminId,
    pub email: Email,
    pub password_hash: String,
    pub name: String,
    pub now: DateTime<Utc>,
}

/// Repository for admin accounts.
pub struct AdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminRepository<'a> {
    /// Create a new admin repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a live admin by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: AdminId) -> Result<Option<Admin>, RepositoryError> {
        let row = sqlx::query_as::<_, Admin>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Get login credentials for a live admin by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn credentials_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<Credentials>, RepositoryError> {
        let row = sqlx::query_as::<_, Credentials>(
            "SELECT id, password_hash FROM admins WHERE email = $1 AND deleted_at IS NULL",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Create a new admin account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    pub async fn create(&self, new: NewAdmin) -> Result<Admin, RepositoryError> {
        let row = sqlx::query_as::<_, Admin>(&format!(
            "INSERT INTO admins (id, email, password_hash, name, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $5)
             RETURNING {ADMIN_COLUMNS}"
        ))
        .bind(new.id)
        .bind(new.email.as_str())
        .bind(new.password_hash)
        .bind(new.name)
        .bind(new.now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::conflict_on_unique(e, "email already registered"))?;

        Ok(row)
    }
}
