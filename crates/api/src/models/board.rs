//! Review / inquiry / comment domain types.

use chrono::{DateTime, Utc};
use dragonfruit_core::{CommentId, CustomerId, InquiryId, ReviewId, Role, SaleId};
use uuid::Uuid;

/// A customer review on a sale.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Review {
    pub id: ReviewId,
    pub customer_id: CustomerId,
    pub sale_id: SaleId,
    /// 1-5 inclusive.
    pub rating: i16,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A customer question on a sale.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Inquiry {
    pub id: InquiryId,
    pub customer_id: CustomerId,
    pub sale_id: SaleId,
    pub title: String,
    pub body: String,
    /// Private inquiries are visible to the author and the sale's seller
    /// only; the list endpoint still returns them with the body masked.
    pub private: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A reply on an inquiry, written by the asking customer or the sale's
/// seller. `author_id` is untyped because it spans both actor tables;
/// `author_role` disambiguates.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Comment {
    pub id: CommentId,
    pub inquiry_id: InquiryId,
    pub author_id: Uuid,
    pub author_role: Role,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}
