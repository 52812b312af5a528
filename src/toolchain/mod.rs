//! Per-toolchain capability sets.
//!
//! A [`Toolchain`] supplies everything the generic pipeline cannot know on
//! its own: where releases are published, how the current platform is
//! matched, which codec the artifacts use and how to ask an installed copy
//! for its version.

pub mod go;
pub mod zig;

use crate::archive::Codec;
use crate::error::PipelineResult;
use crate::platform::PlatformRule;
use crate::source::ReleaseSource;
use crate::types::{PlatformInfo, ReleaseEntry, Settings};
use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};

pub use go::Go;
pub use zig::Zig;

pub const KNOWN_TOOLS: &[&str] = &["go", "zig"];

pub trait Toolchain: Send + Sync {
    /// Also the name of the active install directory under the base directory.
    fn name(&self) -> &'static str;

    fn source(&self, platform: &PlatformInfo) -> ReleaseSource;

    fn platform_rule(&self, platform: &PlatformInfo) -> PlatformRule;

    fn default_codec(&self) -> Codec;

    fn codec_for(&self, entry: &ReleaseEntry) -> Codec {
        Codec::from_file_name(entry.file_name()).unwrap_or_else(|| self.default_codec())
    }

    /// The version the source currently advertises as latest.
    fn latest_version(&self, entries: &[ReleaseEntry]) -> PipelineResult<String>;

    /// The version a single selected entry will install.
    fn entry_version(&self, entry: &ReleaseEntry) -> String;

    /// Executable inside the install directory that reports the version.
    fn binary(&self, install_dir: &Path) -> PathBuf;

    fn version_args(&self) -> &'static [&'static str] {
        &["version"]
    }

    /// Extra environment for the version command.
    fn version_env(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }

    fn parse_version_output(&self, stdout: &str) -> PipelineResult<String>;

    /// Directory that has to be on `PATH` for the toolchain to be usable.
    fn path_dir(&self, install_dir: &Path) -> PathBuf;
}

pub(crate) fn exe(name: &str) -> String {
    format!("{}{}", name, std::env::consts::EXE_SUFFIX)
}

/// Build the toolchains named in `names`, in order, from `settings`.
pub fn resolve(names: &[String], settings: &Settings) -> Result<Vec<Box<dyn Toolchain>>> {
    names
        .iter()
        .map(|name| -> Result<Box<dyn Toolchain>> {
            match name.to_lowercase().as_str() {
                "go" => Ok(Box::new(Go::new(&settings.go_origin))),
                "zig" => Ok(Box::new(Zig::new(&settings.zig_index_url, &settings.zig_channel))),
                other => Err(anyhow!(
                    "Unknown toolchain '{}'. Known toolchains: {}",
                    other,
                    KNOWN_TOOLS.join(", ")
                )),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_tools_in_order() {
        let names = vec!["zig".to_string(), "Go".to_string()];
        let tools = resolve(&names, &Settings::default()).unwrap();
        let resolved: Vec<_> = tools.iter().map(|t| t.name()).collect();
        assert_eq!(resolved, vec!["zig", "go"]);
    }

    #[test]
    fn unknown_tool_is_a_config_error() {
        let names = vec!["rust".to_string()];
        let err = resolve(&names, &Settings::default()).err().unwrap();
        assert!(err.to_string().contains("Unknown toolchain 'rust'"));
    }
}
