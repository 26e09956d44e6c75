//! Catalog taxonomy handlers: channels, sections, categories.
//!
//! Reads are public; mutations are admin-only.

use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{
    Json, Router,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dragonfruit_core::{CategoryId, ChannelId, Page, PageRequest, Patch, SectionId};

use crate::db::catalog::{
    CatalogSortKey, CategoryChanges, CategoryRepository, ChannelFilter, ChannelRepository,
    SectionRepository, TaxonomyChanges,
};
use crate::error::{ApiError, Result};
use crate::middleware::auth::AdminAuth;
use crate::models::catalog::{Category, Channel, Section};
use crate::state::AppState;

const CATALOG_PAGE_LIMIT: u32 = 20;

/// Routes for this module.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Public reads
        .route("/channels", patch(list_channels))
        .route("/channels/{channel_id}", get(get_channel))
        .route("/channels/{channel_id}/sections", patch(list_sections))
        .route("/channels/{channel_id}/categories", patch(list_categories))
        // Admin mutations
        .route("/admin/channels", post(create_channel))
        .route(
            "/admin/channels/{channel_id}",
            axum::routing::put(update_channel).delete(delete_channel),
        )
        .route(
            "/admin/channels/{channel_id}/sections",
            post(create_section),
        )
        .route(
            "/admin/channels/{channel_id}/sections/{section_id}",
            axum::routing::put(update_section).delete(delete_section),
        )
        .route(
            "/admin/channels/{channel_id}/categories",
            post(create_category),
        )
        .route(
            "/admin/channels/{channel_id}/categories/{category_id}",
            axum::routing::put(update_category).delete(delete_category),
        )
}

// =============================================================================
// DTOs
// =============================================================================

/// Wire shape of a channel.
#[derive(Debug, Serialize)]
pub struct ChannelDto {
    pub id: ChannelId,
    pub code: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Channel> for ChannelDto {
    fn from(channel: Channel) -> Self {
        Self {
            id: channel.id,
            code: channel.code,
            name: channel.name,
            created_at: channel.created_at,
            updated_at: channel.updated_at,
        }
    }
}

/// Wire shape of a section.
#[derive(Debug, Serialize)]
pub struct SectionDto {
    pub id: SectionId,
    pub channel_id: ChannelId,
    pub code: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Section> for SectionDto {
    fn from(section: Section) -> Self {
        Self {
            id: section.id,
            channel_id: section.channel_id,
            code: section.code,
            name: section.name,
            created_at: section.created_at,
            updated_at: section.updated_at,
        }
    }
}

/// Wire shape of a category.
#[derive(Debug, Serialize)]
pub struct CategoryDto {
    pub id: CategoryId,
    pub channel_id: ChannelId,
    pub parent_id: Option<CategoryId>,
    pub code: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryDto {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            channel_id: category.channel_id,
            parent_id: category.parent_id,
            code: category.code,
            name: category.name,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

// =============================================================================
// Channels
// =============================================================================

/// Channel listing request.
#[derive(Debug, Default, Deserialize)]
pub struct ChannelListRequest {
    #[serde(flatten)]
    pub page: PageRequest,
    pub sort: Option<String>,
    pub search: Option<String>,
}

/// `PATCH /channels`
async fn list_channels(
    State(state): State<AppState>,
    Json(body): Json<ChannelListRequest>,
) -> Result<Json<Page<ChannelDto>>> {
    let resolved = body.page.resolve(CATALOG_PAGE_LIMIT);
    let filter = ChannelFilter {
        search: body.search,
    };
    let sort = CatalogSortKey::from_param(body.sort.as_deref());

    let (records, channels) = ChannelRepository::new(state.pool())
        .search(&filter, sort, resolved)
        .await?;

    Ok(Json(Page::new(resolved, records, channels).map(ChannelDto::from)))
}

/// `GET /channels/{channel_id}`
async fn get_channel(
    State(state): State<AppState>,
    Path(channel_id): Path<ChannelId>,
) -> Result<Json<ChannelDto>> {
    let channel = ChannelRepository::new(state.pool())
        .find_by_id(channel_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("channel".to_owned()))?;

    Ok(Json(channel.into()))
}

/// Channel create request.
#[derive(Debug, Deserialize)]
pub struct ChannelCreateBody {
    pub code: String,
    pub name: String,
}

/// `POST /admin/channels`
async fn create_channel(
    State(state): State<AppState>,
    AdminAuth(_admin_id): AdminAuth,
    Json(body): Json<ChannelCreateBody>,
) -> Result<Json<ChannelDto>> {
    let channel = ChannelRepository::new(state.pool())
        .create(
            ChannelId::new(state.ids().new_id()),
            &body.code,
            &body.name,
            state.clock().now(),
        )
        .await?;

    Ok(Json(channel.into()))
}

/// Sparse patch for a channel or section; both fields are non-nullable.
#[derive(Debug, Default, Deserialize)]
pub struct TaxonomyUpdateBody {
    #[serde(default)]
    pub code: Patch<String>,
    #[serde(default)]
    pub name: Patch<String>,
}

impl TaxonomyUpdateBody {
    fn into_changes(self) -> Result<TaxonomyChanges> {
        if matches!(self.code, Patch::Null) {
            return Err(ApiError::Validation("code cannot be null".to_owned()));
        }
        if matches!(self.name, Patch::Null) {
            return Err(ApiError::Validation("name cannot be null".to_owned()));
        }
        Ok(TaxonomyChanges {
            code: self.code,
            name: self.name,
        })
    }
}

/// `PUT /admin/channels/{channel_id}`
async fn update_channel(
    State(state): State<AppState>,
    AdminAuth(_admin_id): AdminAuth,
    Path(channel_id): Path<ChannelId>,
    Json(body): Json<TaxonomyUpdateBody>,
) -> Result<Json<ChannelDto>> {
    let changes = body.into_changes()?;
    let channel = ChannelRepository::new(state.pool())
        .update(channel_id, &changes, state.clock().now())
        .await?;

    Ok(Json(channel.into()))
}

/// `DELETE /admin/channels/{channel_id}`
async fn delete_channel(
    State(state): State<AppState>,
    AdminAuth(_admin_id): AdminAuth,
    Path(channel_id): Path<ChannelId>,
) -> Result<StatusCode> {
    ChannelRepository::new(state.pool())
        .soft_delete(channel_id, state.clock().now())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Sections
// =============================================================================

/// Section listing request.
#[derive(Debug, Default, Deserialize)]
pub struct SectionListRequest {
    #[serde(flatten)]
    pub page: PageRequest,
    pub sort: Option<String>,
    pub search: Option<String>,
}

/// `PATCH /channels/{channel_id}/sections`
async fn list_sections(
    State(state): State<AppState>,
    Path(channel_id): Path<ChannelId>,
    Json(body): Json<SectionListRequest>,
) -> Result<Json<Page<SectionDto>>> {
    require_channel(&state, channel_id).await?;

    let resolved = body.page.resolve(CATALOG_PAGE_LIMIT);
    let sort = CatalogSortKey::from_param(body.sort.as_deref());

    let (records, sections) = SectionRepository::new(state.pool())
        .search(channel_id, body.search.as_ref(), sort, resolved)
        .await?;

    Ok(Json(Page::new(resolved, records, sections).map(SectionDto::from)))
}

/// Section create request.
#[derive(Debug, Deserialize)]
pub struct SectionCreateBody {
    pub code: String,
    pub name: String,
}

/// `POST /admin/channels/{channel_id}/sections`
async fn create_section(
    State(state): State<AppState>,
    AdminAuth(_admin_id): AdminAuth,
    Path(channel_id): Path<ChannelId>,
    Json(body): Json<SectionCreateBody>,
) -> Result<Json<SectionDto>> {
    require_channel(&state, channel_id).await?;

    let section = SectionRepository::new(state.pool())
        .create(
            SectionId::new(state.ids().new_id()),
            channel_id,
            &body.code,
            &body.name,
            state.clock().now(),
        )
        .await?;

    Ok(Json(section.into()))
}

/// `PUT /admin/channels/{channel_id}/sections/{section_id}`
async fn update_section(
    State(state): State<AppState>,
    AdminAuth(_admin_id): AdminAuth,
    Path((channel_id, section_id)): Path<(ChannelId, SectionId)>,
    Json(body): Json<TaxonomyUpdateBody>,
) -> Result<Json<SectionDto>> {
    let changes = body.into_changes()?;
    let repo = SectionRepository::new(state.pool());

    let section = repo
        .find_by_id(section_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("section".to_owned()))?;
    if section.channel_id != channel_id {
        return Err(ApiError::NotFound("section".to_owned()));
    }

    let section = repo.update(section_id, &changes, state.clock().now()).await?;
    Ok(Json(section.into()))
}

/// `DELETE /admin/channels/{channel_id}/sections/{section_id}`
async fn delete_section(
    State(state): State<AppState>,
    AdminAuth(_admin_id): AdminAuth,
    Path((channel_id, section_id)): Path<(ChannelId, SectionId)>,
) -> Result<StatusCode> {
    let repo = SectionRepository::new(state.pool());

    let section = repo
        .find_by_id(section_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("section".to_owned()))?;
    if section.channel_id != channel_id {
        return Err(ApiError::NotFound("section".to_owned()));
    }

    repo.soft_delete(section_id, state.clock().now()).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Categories
// =============================================================================

/// Category listing request.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryListRequest {
    #[serde(flatten)]
    pub page: PageRequest,
    pub sort: Option<String>,
    pub search: Option<String>,
    /// When present, list only direct children of this category.
    pub parent_id: Option<CategoryId>,
}

/// `PATCH /channels/{channel_id}/categories`
async fn list_categories(
    State(state): State<AppState>,
    Path(channel_id): Path<ChannelId>,
    Json(body): Json<CategoryListRequest>,
) -> Result<Json<Page<CategoryDto>>> {
    require_channel(&state, channel_id).await?;

    let resolved = body.page.resolve(CATALOG_PAGE_LIMIT);
    let sort = CatalogSortKey::from_param(body.sort.as_deref());

    let (records, categories) = CategoryRepository::new(state.pool())
        .search(channel_id, body.parent_id, body.search.as_ref(), sort, resolved)
        .await?;

    Ok(Json(
        Page::new(resolved, records, categories).map(CategoryDto::from),
    ))
}

/// Category create request.
#[derive(Debug, Deserialize)]
pub struct CategoryCreateBody {
    pub code: String,
    pub name: String,
    pub parent_id: Option<CategoryId>,
}

/// `POST /admin/channels/{channel_id}/categories`
async fn create_category(
    State(state): State<AppState>,
    AdminAuth(_admin_id): AdminAuth,
    Path(channel_id): Path<ChannelId>,
    Json(body): Json<CategoryCreateBody>,
) -> Result<Json<CategoryDto>> {
    require_channel(&state, channel_id).await?;
    let repo = CategoryRepository::new(state.pool());

    if let Some(parent_id) = body.parent_id {
        let parent = repo
            .find_by_id(parent_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("parent category".to_owned()))?;
        if parent.channel_id != channel_id {
            return Err(ApiError::Validation(
                "parent category belongs to a different channel".to_owned(),
            ));
        }
    }

    let category = repo
        .create(
            CategoryId::new(state.ids().new_id()),
            channel_id,
            body.parent_id,
            &body.code,
            &body.name,
            state.clock().now(),
        )
        .await?;

    Ok(Json(category.into()))
}

/// Sparse patch for a category; `parent_id: null` makes it a root.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryUpdateBody {
    #[serde(default)]
    pub code: Patch<String>,
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub parent_id: Patch<CategoryId>,
}

/// `PUT /admin/channels/{channel_id}/categories/{category_id}`
async fn update_category(
    State(state): State<AppState>,
    AdminAuth(_admin_id): AdminAuth,
    Path((channel_id, category_id)): Path<(ChannelId, CategoryId)>,
    Json(body): Json<CategoryUpdateBody>,
) -> Result<Json<CategoryDto>> {
    if matches!(body.code, Patch::Null) {
        return Err(ApiError::Validation("code cannot be null".to_owned()));
    }
    if matches!(body.name, Patch::Null) {
        return Err(ApiError::Validation("name cannot be null".to_owned()));
    }

    let repo = CategoryRepository::new(state.pool());
    let category = repo
        .find_by_id(category_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("category".to_owned()))?;
    if category.channel_id != channel_id {
        return Err(ApiError::NotFound("category".to_owned()));
    }

    if let Patch::Value(parent_id) = body.parent_id {
        let parent = repo
            .find_by_id(parent_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("parent category".to_owned()))?;
        if parent.channel_id != channel_id {
            return Err(ApiError::Validation(
                "parent category belongs to a different channel".to_owned(),
            ));
        }
    }

    let changes = CategoryChanges {
        code: body.code,
        name: body.name,
        parent_id: body.parent_id,
    };
    let category = repo.update(category_id, &changes, state.clock().now()).await?;

    Ok(Json(category.into()))
}

/// `DELETE /admin/channels/{channel_id}/categories/{category_id}`
async fn delete_category(
    State(state): State<AppState>,
    AdminAuth(_admin_id): AdminAuth,
    Path((channel_id, category_id)): Path<(ChannelId, CategoryId)>,
) -> Result<StatusCode> {
    let repo = CategoryRepository::new(state.pool());

    let category = repo
        .find_by_id(category_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("category".to_owned()))?;
    if category.channel_id != channel_id {
        return Err(ApiError::NotFound("category".to_owned()));
    }

    repo.soft_delete(category_id, state.clock().now()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fail with `NotFound` unless the channel exists and is live.
async fn require_channel(state: &AppState, channel_id: ChannelId) -> Result<()> {
    ChannelRepository::new(state.pool())
        .find_by_id(channel_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("channel".to_owned()))?;
    Ok(())
}
