//! Coupon handlers. Admins issue and manage coupons; the public listing
//! shows only coupons redeemable right now.

use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{
    Json, Router,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dragonfruit_core::{CouponId, CouponStatus, DiscountType, Money, Page, PageRequest, Patch};

use crate::db::coupons::{
    CouponChanges, CouponFilter, CouponRepository, CouponSortKey, NewCoupon,
};
use crate::error::{ApiError, Result};
use crate::middleware::auth::AdminAuth;
use crate::models::coupon::Coupon;
use crate::state::AppState;

const COUPON_PAGE_LIMIT: u32 = 20;

/// Routes for this module.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Public reads
        .route("/coupons", patch(list_available_coupons))
        .route("/coupons/{coupon_id}", get(get_coupon))
        // Admin
        .route("/admin/coupons", post(create_coupon).patch(admin_list_coupons))
        .route(
            "/admin/coupons/{coupon_id}",
            axum::routing::put(update_coupon).delete(delete_coupon),
        )
}

/// Wire shape of a coupon.
#[derive(Debug, Serialize)]
pub struct CouponDto {
    pub id: CouponId,
    pub code: String,
    pub name: String,
    pub discount_type: DiscountType,
    pub discount_value: Money,
    pub status: CouponStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Coupon> for CouponDto {
    fn from(coupon: Coupon) -> Self {
        Self {
            id: coupon.id,
            code: coupon.code,
            name: coupon.name,
            discount_type: coupon.discount_type,
            discount_value: coupon.discount_value,
            status: coupon.status,
            expires_at: coupon.expires_at,
            created_at: coupon.created_at,
            updated_at: coupon.updated_at,
        }
    }
}

/// Reject percent discounts above 100.
fn check_discount(discount_type: DiscountType, value: Money) -> Result<()> {
    if discount_type == DiscountType::Percent && value.amount() > Decimal::ONE_HUNDRED {
        return Err(ApiError::Validation(
            "percent discount cannot exceed 100".to_owned(),
        ));
    }
    Ok(())
}

/// Public coupon listing request. Only redeemable coupons are returned.
#[derive(Debug, Default, Deserialize)]
pub struct CouponListRequest {
    #[serde(flatten)]
    pub page: PageRequest,
    pub sort: Option<String>,
    pub search: Option<String>,
}

/// `PATCH /coupons`
async fn list_available_coupons(
    State(state): State<AppState>,
    Json(body): Json<CouponListRequest>,
) -> Result<Json<Page<CouponDto>>> {
    let resolved = body.page.resolve(COUPON_PAGE_LIMIT);
    let filter = CouponFilter {
        status: None,
        search: body.search,
        available_at: Some(state.clock().now()),
    };
    let sort = CouponSortKey::from_param(body.sort.as_deref());

    let (records, coupons) = CouponRepository::new(state.pool())
        .search(&filter, sort, resolved)
        .await?;

    Ok(Json(Page::new(resolved, records, coupons).map(CouponDto::from)))
}

/// `GET /coupons/{coupon_id}`
async fn get_coupon(
    State(state): State<AppState>,
    Path(coupon_id): Path<CouponId>,
) -> Result<Json<CouponDto>> {
    let coupon = CouponRepository::new(state.pool())
        .find_by_id(coupon_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("coupon".to_owned()))?;

    Ok(Json(coupon.into()))
}

/// Admin coupon listing request; sees every live coupon regardless of
/// redeemability.
#[derive(Debug, Default, Deserialize)]
pub struct AdminCouponListRequest {
    #[serde(flatten)]
    pub page: PageRequest,
    pub sort: Option<String>,
    pub search: Option<String>,
    pub status: Option<CouponStatus>,
}

/// `PATCH /admin/coupons`
async fn admin_list_coupons(
    State(state): State<AppState>,
    AdminAuth(_admin_id): AdminAuth,
    Json(body): Json<AdminCouponListRequest>,
) -> Result<Json<Page<CouponDto>>> {
    let resolved = body.page.resolve(COUPON_PAGE_LIMIT);
    let filter = CouponFilter {
        status: body.status,
        search: body.search,
        available_at: None,
    };
    let sort = CouponSortKey::from_param(body.sort.as_deref());

    let (records, coupons) = CouponRepository::new(state.pool())
        .search(&filter, sort, resolved)
        .await?;

    Ok(Json(Page::new(resolved, records, coupons).map(CouponDto::from)))
}

/// Coupon create request.
#[derive(Debug, Deserialize)]
pub struct CouponCreateBody {
    pub code: String,
    pub name: String,
    pub discount_type: DiscountType,
    pub discount_value: Money,
    pub expires_at: Option<DateTime<Utc>>,
}

/// `POST /admin/coupons`
async fn create_coupon(
    State(state): State<AppState>,
    AdminAuth(_admin_id): AdminAuth,
    Json(body): Json<CouponCreateBody>,
) -> Result<Json<CouponDto>> {
    check_discount(body.discount_type, body.discount_value)?;

    let coupon = CouponRepository::new(state.pool())
        .create(NewCoupon {
            id: CouponId::new(state.ids().new_id()),
            code: body.code,
            name: body.name,
            discount_type: body.discount_type,
            discount_value: body.discount_value,
            expires_at: body.expires_at,
            now: state.clock().now(),
        })
        .await?;

    Ok(Json(coupon.into()))
}

/// Sparse patch for a coupon. `expires_at: null` removes the expiry;
/// `name`, `discount_value`, and `status` are non-nullable.
#[derive(Debug, Default, Deserialize)]
pub struct CouponUpdateBody {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub discount_value: Patch<Money>,
    #[serde(default)]
    pub status: Patch<CouponStatus>,
    #[serde(default)]
    pub expires_at: Patch<DateTime<Utc>>,
}

/// `PUT /admin/coupons/{coupon_id}`
async fn update_coupon(
    State(state): State<AppState>,
    AdminAuth(_admin_id): AdminAuth,
    Path(coupon_id): Path<CouponId>,
    Json(body): Json<CouponUpdateBody>,
) -> Result<Json<CouponDto>> {
    for (field, null) in [
        ("name", matches!(body.name, Patch::Null)),
        ("discount_value", matches!(body.discount_value, Patch::Null)),
        ("status", matches!(body.status, Patch::Null)),
    ] {
        if null {
            return Err(ApiError::Validation(format!("{field} cannot be null")));
        }
    }

    let repo = CouponRepository::new(state.pool());
    let coupon = repo
        .find_by_id(coupon_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("coupon".to_owned()))?;

    if let Patch::Value(value) = body.discount_value {
        check_discount(coupon.discount_type, value)?;
    }

    let changes = CouponChanges {
        name: body.name,
        discount_value: body.discount_value,
        status: body.status,
        expires_at: body.expires_at,
    };
    let coupon = repo.update(coupon.id, &changes, state.clock().now()).await?;

    Ok(Json(coupon.into()))
}

/// `DELETE /admin/coupons/{coupon_id}`
async fn delete_coupon(
    State(state): State<AppState>,
    AdminAuth(_admin_id): AdminAuth,
    Path(coupon_id): Path<CouponId>,
) -> Result<StatusCode> {
    CouponRepository::new(state.pool())
        .soft_delete(coupon_id, state.clock().now())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
