//! Index-JSON strategy: `{ "<channel>": { "version": ..., "<platform>": { "tarball", "shasum" } } }`.

use crate::error::{PipelineError, PipelineResult};
use crate::types::ReleaseEntry;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
struct ChannelRelease {
    /// Only rolling channels carry an explicit version; tagged ones use their key.
    #[serde(default)]
    version: Option<String>,
    #[serde(flatten)]
    targets: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Artifact {
    tarball: String,
    shasum: String,
}

fn format_error(msg: String) -> PipelineError {
    PipelineError::SourceFormat(msg)
}

/// Resolve `channel` / `platform_key` in the index to a single release entry.
///
/// Every missing or mistyped level of the lookup is a `SourceFormat` error.
pub fn parse_index(
    body: &str,
    channel: &str,
    platform_key: &str,
) -> PipelineResult<Vec<ReleaseEntry>> {
    let mut index: HashMap<String, serde_json::Value> = serde_json::from_str(body)
        .map_err(|e| format_error(format!("index is not a JSON object: {}", e)))?;

    let channel_value = index
        .remove(channel)
        .ok_or_else(|| format_error(format!("channel '{}' missing from index", channel)))?;
    let mut release: ChannelRelease = serde_json::from_value(channel_value)
        .map_err(|e| format_error(format!("channel '{}' is malformed: {}", channel, e)))?;

    let target = release.targets.remove(platform_key).ok_or_else(|| {
        format_error(format!(
            "channel '{}' has no build for {}",
            channel, platform_key
        ))
    })?;
    let artifact: Artifact = serde_json::from_value(target).map_err(|e| {
        format_error(format!(
            "build for {} in channel '{}' is malformed: {}",
            platform_key, channel, e
        ))
    })?;

    Ok(vec![ReleaseEntry {
        name: release.version.unwrap_or_else(|| channel.to_string()),
        checksum: artifact.shasum,
        url: artifact.tarball,
        platform: None,
    }])
}
