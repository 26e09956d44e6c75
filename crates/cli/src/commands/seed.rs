//! Seed reference catalog data for a fresh environment.
//!
//! Idempotent by code: a channel or section whose code already exists is
//! left alone.

use dragonfruit_api::db::catalog::{ChannelRepository, SectionRepository};
use dragonfruit_core::{ChannelId, Clock, IdGen, RandomIds, SectionId, SystemClock};

use super::{CommandError, connect};

const DEFAULT_CHANNEL: (&str, &str) = ("web", "Web Storefront");
const DEFAULT_SECTIONS: &[(&str, &str)] = &[
    ("featured", "Featured"),
    ("new", "New Arrivals"),
    ("clearance", "Clearance"),
];

/// Seed the default channel and its sections.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;
    let clock = SystemClock;
    let ids = RandomIds;

    let channels = ChannelRepository::new(&pool);
    let (code, name) = DEFAULT_CHANNEL;

    let existing = channels
        .search(
            &dragonfruit_api::db::catalog::ChannelFilter {
                search: Some(code.to_owned()),
            },
            dragonfruit_api::db::catalog::CatalogSortKey::Code,
            dragonfruit_core::PageRequest::default().resolve(50),
        )
        .await?
        .1
        .into_iter()
        .find(|channel| channel.code == code);

    let channel = match existing {
        Some(channel) => {
            tracing::info!("Channel '{code}' already present, skipping");
            channel
        }
        None => {
            let channel = channels
                .create(ChannelId::new(ids.new_id()), code, name, clock.now())
                .await?;
            tracing::info!("Created channel '{code}'");
            channel
        }
    };

    let sections = SectionRepository::new(&pool);
    let (_, existing_sections) = sections
        .search(
            channel.id,
            None,
            dragonfruit_api::db::catalog::CatalogSortKey::Code,
            dragonfruit_core::PageRequest::default().resolve(50),
        )
        .await?;

    for (section_code, section_name) in DEFAULT_SECTIONS {
        if existing_sections.iter().any(|s| s.code == *section_code) {
            tracing::info!("Section '{section_code}' already present, skipping");
            continue;
        }
        sections
            .create(
                SectionId::new(ids.new_id()),
                channel.id,
                section_code,
                section_name,
                clock.now(),
            )
            .await?;
        tracing::info!("Created section '{section_code}'");
    }

    tracing::info!("Seed complete!");
    Ok(())
}
