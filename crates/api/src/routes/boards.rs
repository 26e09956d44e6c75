//! Board handlers: reviews, inquiries, comments.
//!
//! Reads are public. Reviews and inquiries belong to the writing customer;
//! comments may come from the asking customer or the sale's seller.

use axum::http::StatusCode;
use axum::routing::{patch, post, put};
use axum::{
    Json, Router,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use dragonfruit_core::{
    CommentId, CustomerId, InquiryId, Page, PageRequest, Patch, ReviewId, Role, SaleId, SellerId,
};

use crate::db::boards::{
    CommentRepository, InquiryChanges, InquiryRepository, ReviewChanges, ReviewRepository,
};
use crate::db::sales::SaleRepository;
use crate::error::{ApiError, Result};
use crate::middleware::auth::{CustomerAuth, SellerAuth};
use crate::models::board::{Comment, Inquiry, Review};
use crate::state::AppState;

const BOARD_PAGE_LIMIT: u32 = 10;

/// Routes for this module.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Public reads
        .route("/sales/{sale_id}/reviews", patch(list_reviews))
        .route("/sales/{sale_id}/inquiries", patch(list_inquiries))
        .route(
            "/sales/{sale_id}/inquiries/{inquiry_id}/comments",
            patch(list_comments),
        )
        // Customer
        .route("/customer/sales/{sale_id}/reviews", post(create_review))
        .route(
            "/customer/sales/{sale_id}/reviews/{review_id}",
            put(update_review).delete(delete_review),
        )
        .route("/customer/sales/{sale_id}/inquiries", post(create_inquiry))
        .route(
            "/customer/sales/{sale_id}/inquiries/{inquiry_id}",
            put(update_inquiry).delete(delete_inquiry),
        )
        .route(
            "/customer/sales/{sale_id}/inquiries/{inquiry_id}/comments",
            post(customer_create_comment),
        )
        .route(
            "/customer/sales/{sale_id}/inquiries/{inquiry_id}/comments/{comment_id}",
            axum::routing::delete(customer_delete_comment),
        )
        // Seller
        .route(
            "/seller/sales/{sale_id}/inquiries/{inquiry_id}/comments",
            post(seller_create_comment),
        )
        .route(
            "/seller/sales/{sale_id}/inquiries/{inquiry_id}/comments/{comment_id}",
            axum::routing::delete(seller_delete_comment),
        )
}

// =============================================================================
// DTOs
// =============================================================================

/// Wire shape of a review.
#[derive(Debug, Serialize)]
pub struct ReviewDto {
    pub id: ReviewId,
    pub customer_id: CustomerId,
    pub sale_id: SaleId,
    pub rating: i16,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Review> for ReviewDto {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            customer_id: review.customer_id,
            sale_id: review.sale_id,
            rating: review.rating,
            title: review.title,
            body: review.body,
            created_at: review.created_at,
            updated_at: review.updated_at,
        }
    }
}

/// Wire shape of an inquiry. Private inquiry bodies are masked in listings
/// for everyone except the author and the seller; the write path keeps them
/// verbatim.
#[derive(Debug, Serialize)]
pub struct InquiryDto {
    pub id: InquiryId,
    pub customer_id: CustomerId,
    pub sale_id: SaleId,
    pub title: String,
    pub body: Option<String>,
    pub private: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InquiryDto {
    fn public_view(inquiry: Inquiry) -> Self {
        let body = if inquiry.private {
            None
        } else {
            Some(inquiry.body)
        };
        Self {
            id: inquiry.id,
            customer_id: inquiry.customer_id,
            sale_id: inquiry.sale_id,
            title: inquiry.title,
            body,
            private: inquiry.private,
            created_at: inquiry.created_at,
            updated_at: inquiry.updated_at,
        }
    }

    fn full_view(inquiry: Inquiry) -> Self {
        Self {
            id: inquiry.id,
            customer_id: inquiry.customer_id,
            sale_id: inquiry.sale_id,
            title: inquiry.title,
            body: Some(inquiry.body),
            private: inquiry.private,
            created_at: inquiry.created_at,
            updated_at: inquiry.updated_at,
        }
    }
}

/// Wire shape of a comment.
#[derive(Debug, Serialize)]
pub struct CommentDto {
    pub id: CommentId,
    pub inquiry_id: InquiryId,
    pub author_id: Uuid,
    pub author_role: Role,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Comment> for CommentDto {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            inquiry_id: comment.inquiry_id,
            author_id: comment.author_id,
            author_role: comment.author_role,
            body: comment.body,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

// =============================================================================
// Reviews
// =============================================================================

fn check_rating(rating: i16) -> Result<()> {
    if !(1..=5).contains(&rating) {
        return Err(ApiError::Validation(
            "rating must be between 1 and 5".to_owned(),
        ));
    }
    Ok(())
}

/// Review listing request.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewListRequest {
    #[serde(flatten)]
    pub page: PageRequest,
    pub rating: Option<i16>,
}

/// `PATCH /sales/{sale_id}/reviews`
async fn list_reviews(
    State(state): State<AppState>,
    Path(sale_id): Path<SaleId>,
    Json(body): Json<ReviewListRequest>,
) -> Result<Json<Page<ReviewDto>>> {
    require_sale(&state, sale_id).await?;

    let resolved = body.page.resolve(BOARD_PAGE_LIMIT);
    let (records, reviews) = ReviewRepository::new(state.pool())
        .list_by_sale(sale_id, body.rating, resolved)
        .await?;

    Ok(Json(Page::new(resolved, records, reviews).map(ReviewDto::from)))
}

/// Review create request.
#[derive(Debug, Deserialize)]
pub struct ReviewCreateBody {
    pub rating: i16,
    pub title: String,
    pub body: String,
}

/// `POST /customer/sales/{sale_id}/reviews`
async fn create_review(
    State(state): State<AppState>,
    CustomerAuth(customer_id): CustomerAuth,
    Path(sale_id): Path<SaleId>,
    Json(body): Json<ReviewCreateBody>,
) -> Result<Json<ReviewDto>> {
    check_rating(body.rating)?;
    require_sale(&state, sale_id).await?;

    let review = ReviewRepository::new(state.pool())
        .create(
            ReviewId::new(state.ids().new_id()),
            customer_id,
            sale_id,
            body.rating,
            &body.title,
            &body.body,
            state.clock().now(),
        )
        .await?;

    Ok(Json(review.into()))
}

/// Sparse patch for a review; all fields are non-nullable.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewUpdateBody {
    #[serde(default)]
    pub rating: Patch<i16>,
    #[serde(default)]
    pub title: Patch<String>,
    #[serde(default)]
    pub body: Patch<String>,
}

/// `PUT /customer/sales/{sale_id}/reviews/{review_id}`
async fn update_review(
    State(state): State<AppState>,
    CustomerAuth(customer_id): CustomerAuth,
    Path((sale_id, review_id)): Path<(SaleId, ReviewId)>,
    Json(body): Json<ReviewUpdateBody>,
) -> Result<Json<ReviewDto>> {
    for (field, null) in [
        ("rating", matches!(body.rating, Patch::Null)),
        ("title", matches!(body.title, Patch::Null)),
        ("body", matches!(body.body, Patch::Null)),
    ] {
        if null {
            return Err(ApiError::Validation(format!("{field} cannot be null")));
        }
    }
    if let Patch::Value(rating) = body.rating {
        check_rating(rating)?;
    }

    let repo = ReviewRepository::new(state.pool());
    let review = require_own_review(&repo, review_id, sale_id, customer_id).await?;

    let changes = ReviewChanges {
        rating: body.rating,
        title: body.title,
        body: body.body,
    };
    let review = repo.update(review.id, &changes, state.clock().now()).await?;

    Ok(Json(review.into()))
}

/// `DELETE /customer/sales/{sale_id}/reviews/{review_id}`
async fn delete_review(
    State(state): State<AppState>,
    CustomerAuth(customer_id): CustomerAuth,
    Path((sale_id, review_id)): Path<(SaleId, ReviewId)>,
) -> Result<StatusCode> {
    let repo = ReviewRepository::new(state.pool());
    let review = require_own_review(&repo, review_id, sale_id, customer_id).await?;

    repo.soft_delete(review.id, state.clock().now()).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Inquiries
// =============================================================================

/// Inquiry listing request.
#[derive(Debug, Default, Deserialize)]
pub struct InquiryListRequest {
    #[serde(flatten)]
    pub page: PageRequest,
}

/// `PATCH /sales/{sale_id}/inquiries`
async fn list_inquiries(
    State(state): State<AppState>,
    Path(sale_id): Path<SaleId>,
    Json(body): Json<InquiryListRequest>,
) -> Result<Json<Page<InquiryDto>>> {
    require_sale(&state, sale_id).await?;

    let resolved = body.page.resolve(BOARD_PAGE_LIMIT);
    let (records, inquiries) = InquiryRepository::new(state.pool())
        .list_by_sale(sale_id, resolved)
        .await?;

    Ok(Json(
        Page::new(resolved, records, inquiries).map(InquiryDto::public_view),
    ))
}

/// Inquiry create request.
#[derive(Debug, Deserialize)]
pub struct InquiryCreateBody {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub private: bool,
}

/// `POST /customer/sales/{sale_id}/inquiries`
async fn create_inquiry(
    State(state): State<AppState>,
    CustomerAuth(customer_id): CustomerAuth,
    Path(sale_id): Path<SaleId>,
    Json(body): Json<InquiryCreateBody>,
) -> Result<Json<InquiryDto>> {
    require_sale(&state, sale_id).await?;

    let inquiry = InquiryRepository::new(state.pool())
        .create(
            InquiryId::new(state.ids().new_id()),
            customer_id,
            sale_id,
            &body.title,
            &body.body,
            body.private,
            state.clock().now(),
        )
        .await?;

    Ok(Json(InquiryDto::full_view(inquiry)))
}

/// Sparse patch for an inquiry; all fields are non-nullable.
#[derive(Debug, Default, Deserialize)]
pub struct InquiryUpdateBody {
    #[serde(default)]
    pub title: Patch<String>,
    #[serde(default)]
    pub body: Patch<String>,
    #[serde(default)]
    pub private: Patch<bool>,
}

/// `PUT /customer/sales/{sale_id}/inquiries/{inquiry_id}`
async fn update_inquiry(
    State(state): State<AppState>,
    CustomerAuth(customer_id): CustomerAuth,
    Path((sale_id, inquiry_id)): Path<(SaleId, InquiryId)>,
    Json(body): Json<InquiryUpdateBody>,
) -> Result<Json<InquiryDto>> {
    for (field, null) in [
        ("title", matches!(body.title, Patch::Null)),
        ("body", matches!(body.body, Patch::Null)),
        ("private", matches!(body.private, Patch::Null)),
    ] {
        if null {
            return Err(ApiError::Validation(format!("{field} cannot be null")));
        }
    }

    let repo = InquiryRepository::new(state.pool());
    let inquiry = require_own_inquiry(&repo, inquiry_id, sale_id, customer_id).await?;

    let changes = InquiryChanges {
        title: body.title,
        body: body.body,
        private: body.private,
    };
    let inquiry = repo.update(inquiry.id, &changes, state.clock().now()).await?;

    Ok(Json(InquiryDto::full_view(inquiry)))
}

/// `DELETE /customer/sales/{sale_id}/inquiries/{inquiry_id}`
async fn delete_inquiry(
    State(state): State<AppState>,
    CustomerAuth(customer_id): CustomerAuth,
    Path((sale_id, inquiry_id)): Path<(SaleId, InquiryId)>,
) -> Result<StatusCode> {
    let repo = InquiryRepository::new(state.pool());
    let inquiry = require_own_inquiry(&repo, inquiry_id, sale_id, customer_id).await?;

    repo.soft_delete(inquiry.id, state.clock().now()).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Comments
// =============================================================================

/// Comment listing request.
#[derive(Debug, Default, Deserialize)]
pub struct CommentListRequest {
    #[serde(flatten)]
    pub page: PageRequest,
}

/// `PATCH /sales/{sale_id}/inquiries/{inquiry_id}/comments`
async fn list_comments(
    State(state): State<AppState>,
    Path((sale_id, inquiry_id)): Path<(SaleId, InquiryId)>,
    Json(body): Json<CommentListRequest>,
) -> Result<Json<Page<CommentDto>>> {
    let inquiry_repo = InquiryRepository::new(state.pool());
    require_inquiry_under_sale(&inquiry_repo, inquiry_id, sale_id).await?;

    let resolved = body.page.resolve(BOARD_PAGE_LIMIT);
    let (records, comments) = CommentRepository::new(state.pool())
        .list_by_inquiry(inquiry_id, resolved)
        .await?;

    Ok(Json(
        Page::new(resolved, records, comments).map(CommentDto::from),
    ))
}

/// Comment create request.
#[derive(Debug, Deserialize)]
pub struct CommentCreateBody {
    pub body: String,
}

/// `POST /customer/sales/{sale_id}/inquiries/{inquiry_id}/comments`
///
/// Only the asking customer may comment from the customer side.
async fn customer_create_comment(
    State(state): State<AppState>,
    CustomerAuth(customer_id): CustomerAuth,
    Path((sale_id, inquiry_id)): Path<(SaleId, InquiryId)>,
    Json(body): Json<CommentCreateBody>,
) -> Result<Json<CommentDto>> {
    let inquiry_repo = InquiryRepository::new(state.pool());
    let inquiry = require_inquiry_under_sale(&inquiry_repo, inquiry_id, sale_id).await?;
    if inquiry.customer_id != customer_id {
        return Err(ApiError::Forbidden(
            "inquiry belongs to a different customer".to_owned(),
        ));
    }

    let comment = CommentRepository::new(state.pool())
        .create(
            CommentId::new(state.ids().new_id()),
            inquiry.id,
            customer_id.as_uuid(),
            Role::Customer,
            &body.body,
            state.clock().now(),
        )
        .await?;

    Ok(Json(comment.into()))
}

/// `POST /seller/sales/{sale_id}/inquiries/{inquiry_id}/comments`
///
/// Only the seller who owns the sale may answer.
async fn seller_create_comment(
    State(state): State<AppState>,
    SellerAuth(seller_id): SellerAuth,
    Path((sale_id, inquiry_id)): Path<(SaleId, InquiryId)>,
    Json(body): Json<CommentCreateBody>,
) -> Result<Json<CommentDto>> {
    require_sale_owned_by(&state, sale_id, seller_id).await?;

    let inquiry_repo = InquiryRepository::new(state.pool());
    let inquiry = require_inquiry_under_sale(&inquiry_repo, inquiry_id, sale_id).await?;

    let comment = CommentRepository::new(state.pool())
        .create(
            CommentId::new(state.ids().new_id()),
            inquiry.id,
            seller_id.as_uuid(),
            Role::Seller,
            &body.body,
            state.clock().now(),
        )
        .await?;

    Ok(Json(comment.into()))
}

/// `DELETE /customer/sales/{sale_id}/inquiries/{inquiry_id}/comments/{comment_id}`
async fn customer_delete_comment(
    State(state): State<AppState>,
    CustomerAuth(customer_id): CustomerAuth,
    Path((sale_id, inquiry_id, comment_id)): Path<(SaleId, InquiryId, CommentId)>,
) -> Result<StatusCode> {
    delete_own_comment(
        &state,
        sale_id,
        inquiry_id,
        comment_id,
        customer_id.as_uuid(),
        Role::Customer,
    )
    .await
}

/// `DELETE /seller/sales/{sale_id}/inquiries/{inquiry_id}/comments/{comment_id}`
async fn seller_delete_comment(
    State(state): State<AppState>,
    SellerAuth(seller_id): SellerAuth,
    Path((sale_id, inquiry_id, comment_id)): Path<(SaleId, InquiryId, CommentId)>,
) -> Result<StatusCode> {
    delete_own_comment(
        &state,
        sale_id,
        inquiry_id,
        comment_id,
        seller_id.as_uuid(),
        Role::Seller,
    )
    .await
}

/// Shared delete path: the author (of either role) removes their comment.
async fn delete_own_comment(
    state: &AppState,
    sale_id: SaleId,
    inquiry_id: InquiryId,
    comment_id: CommentId,
    author_id: Uuid,
    author_role: Role,
) -> Result<StatusCode> {
    let inquiry_repo = InquiryRepository::new(state.pool());
    require_inquiry_under_sale(&inquiry_repo, inquiry_id, sale_id).await?;

    let repo = CommentRepository::new(state.pool());
    let comment = repo
        .find_by_id(comment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("comment".to_owned()))?;
    if comment.inquiry_id != inquiry_id {
        return Err(ApiError::NotFound("comment".to_owned()));
    }
    if comment.author_id != author_id || comment.author_role != author_role {
        return Err(ApiError::Forbidden(
            "comment belongs to a different author".to_owned(),
        ));
    }

    repo.soft_delete(comment.id, state.clock().now()).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Helpers
// =============================================================================

/// Fail with `NotFound` unless the sale exists and is live.
async fn require_sale(state: &AppState, sale_id: SaleId) -> Result<()> {
    SaleRepository::new(state.pool())
        .find_by_id(sale_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("sale".to_owned()))?;
    Ok(())
}

/// Fail unless the sale exists and the seller owns it.
async fn require_sale_owned_by(
    state: &AppState,
    sale_id: SaleId,
    seller_id: SellerId,
) -> Result<()> {
    let sale = SaleRepository::new(state.pool())
        .find_by_id(sale_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("sale".to_owned()))?;

    if sale.seller_id != seller_id {
        return Err(ApiError::Forbidden(
            "sale belongs to a different seller".to_owned(),
        ));
    }
    Ok(())
}

/// Load a live review and verify sale linkage plus ownership.
async fn require_own_review(
    repo: &ReviewRepository<'_>,
    review_id: ReviewId,
    sale_id: SaleId,
    customer_id: CustomerId,
) -> Result<Review> {
    let review = repo
        .find_by_id(review_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("review".to_owned()))?;

    if review.sale_id != sale_id {
        return Err(ApiError::NotFound("review".to_owned()));
    }
    if review.customer_id != customer_id {
        return Err(ApiError::Forbidden(
            "review belongs to a different customer".to_owned(),
        ));
    }
    Ok(review)
}

/// Load a live inquiry and verify sale linkage plus ownership.
async fn require_own_inquiry(
    repo: &InquiryRepository<'_>,
    inquiry_id: InquiryId,
    sale_id: SaleId,
    customer_id: CustomerId,
) -> Result<Inquiry> {
    let inquiry = require_inquiry_under_sale(repo, inquiry_id, sale_id).await?;
    if inquiry.customer_id != customer_id {
        return Err(ApiError::Forbidden(
            "inquiry belongs to a different customer".to_owned(),
        ));
    }
    Ok(inquiry)
}

/// Load a live inquiry and verify it hangs off the given sale.
async fn require_inquiry_under_sale(
    repo: &InquiryRepository<'_>,
    inquiry_id: InquiryId,
    sale_id: SaleId,
) -> Result<Inquiry> {
    let inquiry = repo
        .find_by_id(inquiry_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("inquiry".to_owned()))?;

    if inquiry.sale_id != sale_id {
        return Err(ApiError::NotFound("inquiry".to_owned()));
    }
    Ok(inquiry)
}
