//! Sale listing handlers: sales, option groups, options.
//!
//! Reads are public; mutations require the owning seller.

use axum::http::StatusCode;
use axum::routing::{get, patch, post, put};
use axum::{
    Json, Router,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dragonfruit_core::{
    CategoryId, ChannelId, Money, OptionGroupId, Page, PageRequest, Patch, SaleId, SaleOptionId,
    SaleStatus, SectionId, SellerId,
};

use crate::db::catalog::{ChannelRepository, SectionRepository};
use crate::db::sales::{
    NewSale, OptionGroupChanges, OptionGroupRepository, SaleChanges, SaleFilter,
    SaleOptionRepository, SaleRepository, SaleSortKey,
};
use crate::error::{ApiError, Result};
use crate::middleware::auth::SellerAuth;
use crate::models::sale::{OptionGroup, Sale, SaleOption};
use crate::state::AppState;

const SALE_PAGE_LIMIT: u32 = 20;

/// Routes for this module.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Public reads
        .route("/sales", patch(list_sales))
        .route("/sales/{sale_id}", get(get_sale))
        .route("/sales/{sale_id}/option-groups", patch(list_option_groups))
        .route(
            "/sales/{sale_id}/option-groups/{group_id}/options",
            patch(list_options),
        )
        // Seller mutations
        .route("/seller/sales", post(create_sale))
        .route(
            "/seller/sales/{sale_id}",
            put(update_sale).delete(delete_sale),
        )
        .route("/seller/sales/{sale_id}/option-groups", post(create_option_group))
        .route(
            "/seller/sales/{sale_id}/option-groups/{group_id}",
            put(update_option_group).delete(delete_option_group),
        )
        .route(
            "/seller/sales/{sale_id}/option-groups/{group_id}/options",
            post(create_option),
        )
        .route(
            "/seller/sales/{sale_id}/option-groups/{group_id}/options/{option_id}",
            axum::routing::delete(delete_option),
        )
}

// =============================================================================
// DTOs
// =============================================================================

/// Wire shape of a sale.
#[derive(Debug, Serialize)]
pub struct SaleDto {
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Sale> for SaleDto {
    fn from(sale: Sale) -> Self {
        Self {
            id: sale.id,
            seller_id: sale.seller_id,
            channel_id: sale.channel_id,
            section_id: sale.section_id,
            category_id: sale.category_id,
            code: sale.code,
            name: sale.name,
            description: sale.description,
            price: sale.price,
            status: sale.status,
            created_at: sale.created_at,
            updated_at: sale.updated_at,
        }
    }
}

/// Wire shape of an option group.
#[derive(Debug, Serialize)]
pub struct OptionGroupDto {
    pub id: OptionGroupId,
    pub sale_id: SaleId,
    pub code: String,
    pub name: String,
    pub required: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OptionGroup> for OptionGroupDto {
    fn from(group: OptionGroup) -> Self {
        Self {
            id: group.id,
            sale_id: group.sale_id,
            code: group.code,
            name: group.name,
            required: group.required,
            created_at: group.created_at,
            updated_at: group.updated_at,
        }
    }
}

/// Wire shape of a sale option.
#[derive(Debug, Serialize)]
pub struct SaleOptionDto {
    pub id: SaleOptionId,
    pub group_id: OptionGroupId,
    pub name: String,
    pub extra_price: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SaleOption> for SaleOptionDto {
    fn from(option: SaleOption) -> Self {
        Self {
            id: option.id,
            group_id: option.group_id,
            name: option.name,
            extra_price: option.extra_price,
            created_at: option.created_at,
            updated_at: option.updated_at,
        }
    }
}

// =============================================================================
// Sales
// =============================================================================

/// Sale listing request.
#[derive(Debug, Default, Deserialize)]
pub struct SaleListRequest {
    #[serde(flatten)]
    pub page: PageRequest,
    pub sort: Option<String>,
    pub search: Option<String>,
    pub seller_id: Option<SellerId>,
    pub channel_id: Option<ChannelId>,
    pub section_id: Option<SectionId>,
    pub category_id: Option<CategoryId>,
    pub status: Option<SaleStatus>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
}

/// `PATCH /sales`
async fn list_sales(
    State(state): State<AppState>,
    Json(body): Json<SaleListRequest>,
) -> Result<Json<Page<SaleDto>>> {
    let resolved = body.page.resolve(SALE_PAGE_LIMIT);
    let filter = SaleFilter {
        seller_id: body.seller_id,
        channel_id: body.channel_id,
        section_id: body.section_id,
        category_id: body.category_id,
        status: body.status,
        search: body.search,
        min_price: body.min_price,
        max_price: body.max_price,
    };
    let sort = SaleSortKey::from_param(body.sort.as_deref());

    let (records, sales) = SaleRepository::new(state.pool())
        .search(&filter, sort, resolved)
        .await?;

    Ok(Json(Page::new(resolved, records, sales).map(SaleDto::from)))
}

/// `GET /sales/{sale_id}`
async fn get_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<SaleId>,
) -> Result<Json<SaleDto>> {
    let sale = SaleRepository::new(state.pool())
        .find_by_id(sale_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("sale".to_owned()))?;

    Ok(Json(sale.into()))
}

/// Sale create request.
#[derive(Debug, Deserialize)]
pub struct SaleCreateBody {
    pub channel_id: ChannelId,
    pub section_id: SectionId,
    pub category_id: Option<CategoryId>,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    /// Listings start as drafts unless the seller opens them immediately.
    pub status: Option<SaleStatus>,
}

/// `POST /seller/sales`
async fn create_sale(
    State(state): State<AppState>,
    SellerAuth(seller_id): SellerAuth,
    Json(body): Json<SaleCreateBody>,
) -> Result<Json<SaleDto>> {
    ChannelRepository::new(state.pool())
        .find_by_id(body.channel_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("channel".to_owned()))?;

    let section = SectionRepository::new(state.pool())
        .find_by_id(body.section_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("section".to_owned()))?;
    if section.channel_id != body.channel_id {
        return Err(ApiError::Validation(
            "section belongs to a different channel".to_owned(),
        ));
    }

    let sale = SaleRepository::new(state.pool())
        .create(NewSale {
            id: SaleId::new(state.ids().new_id()),
            seller_id,
            channel_id: body.channel_id,
            section_id: body.section_id,
            category_id: body.category_id,
            code: body.code,
            name: body.name,
            description: body.description,
            price: body.price,
            status: body.status.unwrap_or(SaleStatus::Draft),
            now: state.clock().now(),
        })
        .await?;

    Ok(Json(sale.into()))
}

/// Sparse patch for a sale.
#[derive(Debug, Default, Deserialize)]
pub struct SaleUpdateBody {
    #[serde(default)]
    pub code: Patch<String>,
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub category_id: Patch<CategoryId>,
    #[serde(default)]
    pub price: Patch<Money>,
    #[serde(default)]
    pub status: Patch<SaleStatus>,
}

/// `PUT /seller/sales/{sale_id}`
async fn update_sale(
    State(state): State<AppState>,
    SellerAuth(seller_id): SellerAuth,
    Path(sale_id): Path<SaleId>,
    Json(body): Json<SaleUpdateBody>,
) -> Result<Json<SaleDto>> {
    for (field, null) in [
        ("code", matches!(body.code, Patch::Null)),
        ("name", matches!(body.name, Patch::Null)),
        ("price", matches!(body.price, Patch::Null)),
        ("status", matches!(body.status, Patch::Null)),
    ] {
        if null {
            return Err(ApiError::Validation(format!("{field} cannot be null")));
        }
    }

    let repo = SaleRepository::new(state.pool());
    let sale = require_owned_sale(&repo, sale_id, seller_id).await?;

    let changes = SaleChanges {
        code: body.code,
        name: body.name,
        description: body.description,
        category_id: body.category_id,
        price: body.price,
        status: body.status,
    };
    let sale = repo.update(sale.id, &changes, state.clock().now()).await?;

    Ok(Json(sale.into()))
}

/// `DELETE /seller/sales/{sale_id}`
async fn delete_sale(
    State(state): State<AppState>,
    SellerAuth(seller_id): SellerAuth,
    Path(sale_id): Path<SaleId>,
) -> Result<StatusCode> {
    let repo = SaleRepository::new(state.pool());
    let sale = require_owned_sale(&repo, sale_id, seller_id).await?;

    repo.soft_delete(sale.id, state.clock().now()).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Option groups
// =============================================================================

/// Option group listing request.
#[derive(Debug, Default, Deserialize)]
pub struct OptionGroupListRequest {
    #[serde(flatten)]
    pub page: PageRequest,
}

/// `PATCH /sales/{sale_id}/option-groups`
async fn list_option_groups(
    State(state): State<AppState>,
    Path(sale_id): Path<SaleId>,
    Json(body): Json<OptionGroupListRequest>,
) -> Result<Json<Page<OptionGroupDto>>> {
    SaleRepository::new(state.pool())
        .find_by_id(sale_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("sale".to_owned()))?;

    let resolved = body.page.resolve(SALE_PAGE_LIMIT);
    let (records, groups) = OptionGroupRepository::new(state.pool())
        .list_by_sale(sale_id, resolved)
        .await?;

    Ok(Json(
        Page::new(resolved, records, groups).map(OptionGroupDto::from),
    ))
}

/// Option group create request. `sale_id`, when present, must match the
/// path parameter.
#[derive(Debug, Deserialize)]
pub struct OptionGroupCreateBody {
    pub sale_id: Option<SaleId>,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub required: bool,
}

/// `POST /seller/sales/{sale_id}/option-groups`
async fn create_option_group(
    State(state): State<AppState>,
    SellerAuth(seller_id): SellerAuth,
    Path(sale_id): Path<SaleId>,
    Json(body): Json<OptionGroupCreateBody>,
) -> Result<Json<OptionGroupDto>> {
    if let Some(body_sale_id) = body.sale_id
        && body_sale_id != sale_id
    {
        return Err(ApiError::Validation(
            "body sale_id does not match the path".to_owned(),
        ));
    }

    let sale_repo = SaleRepository::new(state.pool());
    require_owned_sale(&sale_repo, sale_id, seller_id).await?;

    let group = OptionGroupRepository::new(state.pool())
        .create(
            OptionGroupId::new(state.ids().new_id()),
            sale_id,
            &body.code,
            &body.name,
            body.required,
            state.clock().now(),
        )
        .await?;

    Ok(Json(group.into()))
}

/// Sparse patch for an option group.
#[derive(Debug, Default, Deserialize)]
pub struct OptionGroupUpdateBody {
    #[serde(default)]
    pub code: Patch<String>,
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub required: Patch<bool>,
}

/// `PUT /seller/sales/{sale_id}/option-groups/{group_id}`
async fn update_option_group(
    State(state): State<AppState>,
    SellerAuth(seller_id): SellerAuth,
    Path((sale_id, group_id)): Path<(SaleId, OptionGroupId)>,
    Json(body): Json<OptionGroupUpdateBody>,
) -> Result<Json<OptionGroupDto>> {
    for (field, null) in [
        ("code", matches!(body.code, Patch::Null)),
        ("name", matches!(body.name, Patch::Null)),
        ("required", matches!(body.required, Patch::Null)),
    ] {
        if null {
            return Err(ApiError::Validation(format!("{field} cannot be null")));
        }
    }

    let sale_repo = SaleRepository::new(state.pool());
    require_owned_sale(&sale_repo, sale_id, seller_id).await?;

    let group_repo = OptionGroupRepository::new(state.pool());
    let group = require_group_under_sale(&group_repo, group_id, sale_id).await?;

    let changes = OptionGroupChanges {
        code: body.code,
        name: body.name,
        required: body.required,
    };
    let group = group_repo
        .update(group.id, &changes, state.clock().now())
        .await?;

    Ok(Json(group.into()))
}

/// `DELETE /seller/sales/{sale_id}/option-groups/{group_id}`
async fn delete_option_group(
    State(state): State<AppState>,
    SellerAuth(seller_id): SellerAuth,
    Path((sale_id, group_id)): Path<(SaleId, OptionGroupId)>,
) -> Result<StatusCode> {
    let sale_repo = SaleRepository::new(state.pool());
    require_owned_sale(&sale_repo, sale_id, seller_id).await?;

    let group_repo = OptionGroupRepository::new(state.pool());
    let group = require_group_under_sale(&group_repo, group_id, sale_id).await?;

    group_repo.delete(group.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Options
// =============================================================================

/// Option listing request.
#[derive(Debug, Default, Deserialize)]
pub struct SaleOptionListRequest {
    #[serde(flatten)]
    pub page: PageRequest,
}

/// `PATCH /sales/{sale_id}/option-groups/{group_id}/options`
async fn list_options(
    State(state): State<AppState>,
    Path((sale_id, group_id)): Path<(SaleId, OptionGroupId)>,
    Json(body): Json<SaleOptionListRequest>,
) -> Result<Json<Page<SaleOptionDto>>> {
    let group_repo = OptionGroupRepository::new(state.pool());
    require_group_under_sale(&group_repo, group_id, sale_id).await?;

    let resolved = body.page.resolve(SALE_PAGE_LIMIT);
    let (records, options) = SaleOptionRepository::new(state.pool())
        .list_by_group(group_id, resolved)
        .await?;

    Ok(Json(
        Page::new(resolved, records, options).map(SaleOptionDto::from),
    ))
}

/// Option create request.
#[derive(Debug, Deserialize)]
pub struct SaleOptionCreateBody {
    pub name: String,
    #[serde(default)]
    pub extra_price: Money,
}

/// `POST /seller/sales/{sale_id}/option-groups/{group_id}/options`
async fn create_option(
    State(state): State<AppState>,
    SellerAuth(seller_id): SellerAuth,
    Path((sale_id, group_id)): Path<(SaleId, OptionGroupId)>,
    Json(body): Json<SaleOptionCreateBody>,
) -> Result<Json<SaleOptionDto>> {
    let sale_repo = SaleRepository::new(state.pool());
    require_owned_sale(&sale_repo, sale_id, seller_id).await?;

    let group_repo = OptionGroupRepository::new(state.pool());
    require_group_under_sale(&group_repo, group_id, sale_id).await?;

    let option = SaleOptionRepository::new(state.pool())
        .create(
            SaleOptionId::new(state.ids().new_id()),
            group_id,
            &body.name,
            body.extra_price,
            state.clock().now(),
        )
        .await?;

    Ok(Json(option.into()))
}

/// `DELETE /seller/sales/{sale_id}/option-groups/{group_id}/options/{option_id}`
async fn delete_option(
    State(state): State<AppState>,
    SellerAuth(seller_id): SellerAuth,
    Path((sale_id, group_id, option_id)): Path<(SaleId, OptionGroupId, SaleOptionId)>,
) -> Result<StatusCode> {
    let sale_repo = SaleRepository::new(state.pool());
    require_owned_sale(&sale_repo, sale_id, seller_id).await?;

    let group_repo = OptionGroupRepository::new(state.pool());
    require_group_under_sale(&group_repo, group_id, sale_id).await?;

    let option_repo = SaleOptionRepository::new(state.pool());
    let option = option_repo
        .find_by_id(option_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("option".to_owned()))?;
    if option.group_id != group_id {
        return Err(ApiError::NotFound("option".to_owned()));
    }

    option_repo.delete(option.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Helpers
// =============================================================================

/// Load a live sale and verify the caller owns it.
async fn require_owned_sale(
    repo: &SaleRepository<'_>,
    sale_id: SaleId,
    seller_id: SellerId,
) -> Result<Sale> {
    let sale = repo
        .find_by_id(sale_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("sale".to_owned()))?;

    if sale.seller_id != seller_id {
        return Err(ApiError::Forbidden(
            "sale belongs to a different seller".to_owned(),
        ));
    }
    Ok(sale)
}

/// Load an option group and verify it hangs off the given sale.
async fn require_group_under_sale(
    repo: &OptionGroupRepository<'_>,
    group_id: OptionGroupId,
    sale_id: SaleId,
) -> Result<OptionGroup> {
    let group = repo
        .find_by_id(group_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("option group".to_owned()))?;

    if group.sale_id != sale_id {
        return Err(ApiError::NotFound("option group".to_owned()));
    }
    Ok(group)
}
