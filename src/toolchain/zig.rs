use super::{exe, Toolchain};
use crate::archive::Codec;
use crate::error::{PipelineError, PipelineResult};
use crate::platform::{zig_platform_key, PlatformRule};
use crate::source::ReleaseSource;
use crate::types::{PlatformInfo, ReleaseEntry};
use std::path::{Path, PathBuf};

/// Zig, resolved from one channel of the JSON download index.
#[derive(Debug, Clone)]
pub struct Zig {
    index_url: String,
    channel: String,
}

impl Zig {
    pub fn new(index_url: &str, channel: &str) -> Self {
        Self {
            index_url: index_url.to_string(),
            channel: channel.to_string(),
        }
    }
}

impl Toolchain for Zig {
    fn name(&self) -> &'static str {
        "zig"
    }

    fn source(&self, platform: &PlatformInfo) -> ReleaseSource {
        ReleaseSource::IndexJson {
            url: self.index_url.clone(),
            channel: self.channel.clone(),
            platform_key: zig_platform_key(platform),
        }
    }

    fn platform_rule(&self, platform: &PlatformInfo) -> PlatformRule {
        PlatformRule::Single(zig_platform_key(platform))
    }

    fn default_codec(&self) -> Codec {
        Codec::TarXz
    }

    fn latest_version(&self, entries: &[ReleaseEntry]) -> PipelineResult<String> {
        entries
            .first()
            .map(|e| e.name.clone())
            .ok_or_else(|| PipelineError::SourceFormat(format!("channel '{}' is empty", self.channel)))
    }

    fn entry_version(&self, entry: &ReleaseEntry) -> String {
        entry.name.clone()
    }

    fn binary(&self, install_dir: &Path) -> PathBuf {
        install_dir.join(exe("zig"))
    }

    fn parse_version_output(&self, stdout: &str) -> PipelineResult<String> {
        let version = stdout.trim();
        semver::Version::parse(version).map_err(|e| {
            PipelineError::Probe(format!("unexpected `zig version` output '{}': {}", version, e))
        })?;
        Ok(version.to_string())
    }

    fn path_dir(&self, install_dir: &Path) -> PathBuf {
        install_dir.to_path_buf()
    }
}
