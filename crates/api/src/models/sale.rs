//! Sale listing domain types.

use chrono::{DateTime, Utc};
use dragonfruit_core::{
    CategoryId, ChannelId, Money, OptionGroupId, SaleId, SaleOptionId, SaleStatus, SectionId,
    SellerId,
};

/// A product listing owned by a seller.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Sale {
    pub id: SaleId,
    /// Owner; only this seller may mutate the listing.
    pub seller_id: SellerId,
    pub channel_id: ChannelId,
    pub section_id: SectionId,
    pub category_id: Option<CategoryId>,
    /// Seller-facing SKU-ish code. Not unique; sellers reuse codes across
    /// channels.
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A group of selectable options on a sale (e.g., "Size").
///
/// Option groups are configuration, not commerce records: they hard-delete.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OptionGroup {
    pub id: OptionGroupId,
    pub sale_id: SaleId,
    /// Unique per sale.
    pub code: String,
    pub name: String,
    /// Whether a buyer must pick an option from this group.
    pub required: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One selectable option within a group (e.g., "XL").
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SaleOption {
    pub id: SaleOptionId,
    pub group_id: OptionGroupId,
    pub name: String,
    /// Price delta added on top of the sale price.
    pub extra_price: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
