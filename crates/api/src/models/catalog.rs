//! Catalog taxonomy domain types: channels, sections, categories.

use chrono::{DateTime, Utc};
use dragonfruit_core::{CategoryId, ChannelId, SectionId};

/// A sales channel (e.g., web storefront, partner app).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Channel {
    /// Unique channel ID.
    pub id: ChannelId,
    /// Business code, unique among live channels.
    pub code: String,
    /// Display name.
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A top-level storefront division within a channel.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Section {
    pub id: SectionId,
    pub channel_id: ChannelId,
    /// Business code, unique per channel among live sections.
    pub code: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A product category within a channel; categories form a tree via
/// `parent_id`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub channel_id: ChannelId,
    /// Parent category; `None` for roots.
    pub parent_id: Option<CategoryId>,
    pub code: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}
