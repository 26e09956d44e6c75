//! Coupon domain type.

use chrono::{DateTime, Utc};
use dragonfruit_core::{CouponId, CouponStatus, DiscountType, Money};

/// An admin-issued discount coupon.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Coupon {
    pub id: CouponId,
    /// Redemption code, unique among live coupons.
    pub code: String,
    pub name: String,
    pub discount_type: DiscountType,
    /// Amount in currency for `amount` coupons, percentage points for
    /// `percent` coupons.
    pub discount_value: Money,
    pub status: CouponStatus,
    /// Coupons without an expiry stay redeemable until suspended.
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}
