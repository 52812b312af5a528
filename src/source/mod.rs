//! Release discovery
//!
//! A release source fetches a metadata document and turns it into
//! [`ReleaseEntry`] values. Two document shapes are supported:
//! - an HTML listing page with one table row per artifact ([`listing`])
//! - a JSON index keyed by channel, then platform ([`index`])

pub mod index;
pub mod listing;

use crate::error::{PipelineError, PipelineResult};
use crate::types::ReleaseEntry;

pub use index::parse_index;
pub use listing::parse_listing_page;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseSource {
    ListingPage {
        /// Scheme and host that relative download links are joined onto.
        origin: String,
        page_path: String,
    },
    IndexJson {
        url: String,
        channel: String,
        platform_key: String,
    },
}

impl ReleaseSource {
    pub fn url(&self) -> String {
        match self {
            ReleaseSource::ListingPage { origin, page_path } => {
                format!("{}{}", origin.trim_end_matches('/'), page_path)
            }
            ReleaseSource::IndexJson { url, .. } => url.clone(),
        }
    }

    pub fn parse(&self, body: &str) -> PipelineResult<Vec<ReleaseEntry>> {
        match self {
            ReleaseSource::ListingPage { origin, .. } => {
                parse_listing_page(body, origin.trim_end_matches('/'))
            }
            ReleaseSource::IndexJson {
                channel,
                platform_key,
                ..
            } => parse_index(body, channel, platform_key),
        }
    }
}

/// Fetch the source document and parse it into release entries.
pub async fn list_releases(
    client: &reqwest::Client,
    source: &ReleaseSource,
) -> PipelineResult<Vec<ReleaseEntry>> {
    let url = source.url();
    tracing::debug!("Fetching release metadata from: {}", url);

    let unreachable = |source| PipelineError::SourceUnreachable {
        url: url.clone(),
        source,
    };

    let response = client
        .get(&url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(unreachable)?;
    let body = response.text().await.map_err(unreachable)?;

    let entries = source.parse(&body)?;
    tracing::debug!("Parsed {} release entries", entries.len());
    Ok(entries)
}
