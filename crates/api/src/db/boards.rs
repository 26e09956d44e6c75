//! Board repositories: reviews, inquiries, comments.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use dragonfruit_core::{
    CommentId, CustomerId, InquiryId, Patch, ResolvedPage, ReviewId, Role, SaleId,
};

use super::{RepositoryError, as_records};
use crate::models::board::{Comment, Inquiry, Review};

const REVIEW_COLUMNS: &str =
    "id, customer_id, sale_id, rating, title, body, created_at, updated_at, deleted_at";
const INQUIRY_COLUMNS: &str =
    "id, customer_id, sale_id, title, body, private, created_at, updated_at, deleted_at";
const COMMENT_COLUMNS: &str =
    "id, inquiry_id, author_id, author_role, body, created_at, updated_at, deleted_at";

/// Sparse patch for a review.
#[derive(Debug, Default)]
pub struct ReviewChanges {
    pub rating: Patch<i16>,
    pub title: Patch<String>,
    pub body: Patch<String>,
}

/// Repository for sale reviews.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Listing scoped to one sale, optionally to one rating.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_by_sale(
        &self,
        sale_id: SaleId,
        rating: Option<i16>,
        page: ResolvedPage,
    ) -> Result<(u64, Vec<Review>), RepositoryError> {
        let mut count_query = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM reviews WHERE deleted_at IS NULL AND sale_id = ",
        );
        count_query.push_bind(sale_id);
        if let Some(rating) = rating {
            count_query.push(" AND rating = ").push_bind(rating);
        }
        let records: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut page_query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE deleted_at IS NULL AND sale_id = "
        ));
        page_query.push_bind(sale_id);
        if let Some(rating) = rating {
            page_query.push(" AND rating = ").push_bind(rating);
        }
        page_query.push(" ORDER BY created_at DESC");
        page_query.push(" LIMIT ").push_bind(page.take());
        page_query.push(" OFFSET ").push_bind(page.offset());
        let reviews = page_query
            .build_query_as::<Review>()
            .fetch_all(self.pool)
            .await?;

        Ok((as_records(records), reviews))
    }

    /// Get a live review by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        let row = sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Create a review on a sale.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        id: ReviewId,
        customer_id: CustomerId,
        sale_id: SaleId,
        rating: i16,
        title: &str,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<Review, RepositoryError> {
        let row = sqlx::query_as::<_, Review>(&format!(
            "INSERT INTO reviews (id, customer_id, sale_id, rating, title, body, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
             RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(id)
        .bind(customer_id)
        .bind(sale_id)
        .bind(rating)
        .bind(title)
        .bind(body)
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
        id: ReviewId,
        changes: &ReviewChanges,
        now: DateTime<Utc>,
    ) -> Result<Review, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE reviews SET updated_at = ");
        qb.push_bind(now);
        if let Patch::Value(rating) = changes.rating {
            qb.push(", rating = ").push_bind(rating);
        }
        if let Patch::Value(title) = &changes.title {
            qb.push(", title = ").push_bind(title.clone());
        }
        if let Patch::Value(body) = &changes.body {
            qb.push(", body = ").push_bind(body.clone());
        }
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" AND deleted_at IS NULL RETURNING ")
            .push(REVIEW_COLUMNS);

        let row = qb
            .build_query_as::<Review>()
            .fetch_optional(self.pool)
            .await?;

        row.ok_or(RepositoryError::NotFound)
    }

    /// Soft-delete a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if already deleted or absent.
    pub async fn soft_delete(
        &self,
        id: ReviewId,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE reviews SET deleted_at = $2, updated_at = $2
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

/// Sparse patch for an inquiry.
#[derive(Debug, Default)]
pub struct InquiryChanges {
    pub title: Patch<String>,
    pub body: Patch<String>,
    pub private: Patch<bool>,
}

/// Repository for sale inquiries.
pub struct InquiryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> InquiryRepository<'a> {
    /// Create a new inquiry repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Listing scoped to one sale, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_by_sale(
        &self,
        sale_id: SaleId,
        page: ResolvedPage,
    ) -> Result<(u64, Vec<Inquiry>), RepositoryError> {
        let records: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM inquiries WHERE deleted_at IS NULL AND sale_id = $1",
        )
        .bind(sale_id)
        .fetch_one(self.pool)
        .await?;

        let inquiries = sqlx::query_as::<_, Inquiry>(&format!(
            "SELECT {INQUIRY_COLUMNS} FROM inquiries WHERE deleted_at IS NULL AND sale_id = $1
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(sale_id)
        .bind(page.take())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok((as_records(records), inquiries))
    }

    /// Get a live inquiry by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: InquiryId) -> Result<Option<Inquiry>, RepositoryError> {
        let row = sqlx::query_as::<_, Inquiry>(&format!(
            "SELECT {INQUIRY_COLUMNS} FROM inquiries WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Create an inquiry on a sale.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        id: InquiryId,
        customer_id: CustomerId,
        sale_id: SaleId,
        title: &str,
        body: &str,
        private: bool,
        now: DateTime<Utc>,
    ) -> Result<Inquiry, RepositoryError> {
        let row = sqlx::query_as::<_, Inquiry>(&format!(
            "INSERT INTO inquiries (id, customer_id, sale_id, title, body, private, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
             RETURNING {INQUIRY_COLUMNS}"
        ))
        .bind(id)
        .bind(customer_id)
        .bind(sale_id)
        .bind(title)
        .bind(body)
        .bind(private)
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
        id: InquiryId,
        changes: &InquiryChanges,
        now: DateTime<Utc>,
    ) -> Result<Inquiry, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE inquiries SET updated_at = ");
        qb.push_bind(now);
        if let Patch::Value(title) = &changes.title {
            qb.push(", title = ").push_bind(title.clone());
        }
        if let Patch::Value(body) = &changes.body {
            qb.push(", body = ").push_bind(body.clone());
        }
        if let Patch::Value(private) = changes.private {
            qb.push(", private = ").push_bind(private);
        }
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" AND deleted_at IS NULL RETURNING ")
            .push(INQUIRY_COLUMNS);

        let row = qb
            .build_query_as::<Inquiry>()
            .fetch_optional(self.pool)
            .await?;

        row.ok_or(RepositoryError::NotFound)
    }

    /// Soft-delete an inquiry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if already deleted or absent.
    pub async fn soft_delete(
        &self,
        id: InquiryId,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE inquiries SET deleted_at = $2, updated_at = $2
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

/// Repository for inquiry comments.
pub struct CommentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CommentRepository<'a> {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Listing scoped to one inquiry, oldest first (threads read downward).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_by_inquiry(
        &self,
        inquiry_id: InquiryId,
        page: ResolvedPage,
    ) -> Result<(u64, Vec<Comment>), RepositoryError> {
        let records: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM comments WHERE deleted_at IS NULL AND inquiry_id = $1",
        )
        .bind(inquiry_id)
        .fetch_one(self.pool)
        .await?;

        let comments = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE deleted_at IS NULL AND inquiry_id = $1
             ORDER BY created_at ASC LIMIT $2 OFFSET $3"
        ))
        .bind(inquiry_id)
        .bind(page.take())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok((as_records(records), comments))
    }

    /// Get a live comment by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError> {
        let row = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Create a comment on an inquiry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        id: CommentId,
        inquiry_id: InquiryId,
        author_id: Uuid,
        author_role: Role,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<Comment, RepositoryError> {
        let row = sqlx::query_as::<_, Comment>(&format!(
            "INSERT INTO comments (id, inquiry_id, author_id, author_role, body, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(inquiry_id)
        .bind(author_id)
        .bind(author_role)
        .bind(body)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(row)
    }

    /// Soft-delete a comment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if already deleted or absent.
    pub async fn soft_delete(
        &self,
        id: CommentId,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE comments SET deleted_at = $2, updated_at = $2
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
